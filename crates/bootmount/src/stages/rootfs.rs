//! Transition onto the real root filesystem.

use bootmount_common::BootPaths;
use serde::{Deserialize, Serialize};

use crate::mount::{MountFlags, MountPlan, MountSpec};

/// How the real root filesystem is reached over the paravirtualized transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootfsOptions {
    /// Transport tag the host exports the root filesystem under.
    pub tag: String,
    /// Filesystem type of the transport.
    pub fstype: String,
    /// Transport mount options, including the caching mode.
    pub transport_options: String,
}

impl Default for RootfsOptions {
    fn default() -> Self {
        Self {
            tag: "rootfs".to_string(),
            fstype: "9p".to_string(),
            transport_options: "trans=virtio,cache=mmap".to_string(),
        }
    }
}

/// Mount the real root on the staging path, then the caller's extra mounts.
///
/// The staged modules directory is bound over the ramdisk's so the running
/// kernel can keep loading modules during the switch. Extra mount targets are
/// interpreted relative to the new root and keep their declared order after
/// the two fixed entries.
#[must_use]
pub fn rootfs_plan(paths: &BootPaths, options: &RootfsOptions, extra: &[MountSpec]) -> MountPlan {
    let mut plan: MountPlan = vec![
        MountSpec::new(&options.tag, &paths.staging_root, &options.fstype)
            .with_flags(MountFlags::NODEV | MountFlags::DIRSYNC)
            .with_data(&options.transport_options),
        MountSpec::bind(paths.staged_modules(), paths.initrd_modules()),
    ]
    .into();

    plan.extend(extra.iter().map(|spec| spec.rebased(&paths.staging_root)));
    plan
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;

    fn paths() -> BootPaths {
        BootPaths::new().with_staging_root("/rootfs")
    }

    #[test]
    fn fixed_entries_come_first() {
        let plan = rootfs_plan(&paths(), &RootfsOptions::default(), &[]);
        let specs = plan.as_slice();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].source, "rootfs");
        assert_eq!(specs[0].target, PathBuf::from("/rootfs"));
        assert_eq!(specs[0].fstype, "9p");
        assert_eq!(specs[0].flags, MountFlags::NODEV | MountFlags::DIRSYNC);
        assert_eq!(specs[0].data, "trans=virtio,cache=mmap");

        assert_eq!(specs[1].source, "/rootfs/lib/modules");
        assert_eq!(specs[1].target, PathBuf::from("/lib/modules"));
        assert_eq!(specs[1].flags, MountFlags::BIND);
    }

    #[test]
    fn extra_mounts_are_rebased_in_order() {
        let extra = [
            MountSpec::new("resolv", "/etc/resolv.conf", "9p").with_data("trans=virtio"),
            MountSpec::new("vol0", "/data", "9p"),
        ];
        let plan = rootfs_plan(&paths(), &RootfsOptions::default(), &extra);
        let targets: Vec<_> = plan.targets().collect();

        assert_eq!(
            targets,
            [
                Path::new("/rootfs"),
                Path::new("/lib/modules"),
                Path::new("/rootfs/etc/resolv.conf"),
                Path::new("/rootfs/data"),
            ]
        );
        assert_eq!(plan.as_slice()[2].data, "trans=virtio");
        assert_eq!(extra[0].target, PathBuf::from("/etc/resolv.conf"));
    }

    #[test]
    fn custom_staging_root() {
        let paths = BootPaths::new().with_staging_root("/newroot");
        let extra = [MountSpec::new("v", "/v", "9p")];
        let plan = rootfs_plan(&paths, &RootfsOptions::default(), &extra);
        assert_eq!(plan.as_slice()[2].target, PathBuf::from("/newroot/v"));
    }
}
