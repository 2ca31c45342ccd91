//! Pseudo-filesystems of the new root.

use bootmount_common::BootPaths;
use serde::{Deserialize, Serialize};

use crate::mount::{MountFlags, MountPlan, MountSpec, REMOUNT};

use super::{DEV_OPTIONS, PTS_OPTIONS};

/// Tunables for the finalized root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalizeOptions {
    /// Size limit of `/dev/shm`, in tmpfs `size=` syntax.
    pub shm_size: String,
}

impl Default for FinalizeOptions {
    fn default() -> Self {
        Self {
            shm_size: "65536k".to_string(),
        }
    }
}

/// Mounts completing the staged root before the workload runs in it.
///
/// `/dev` keeps exec so device nodes behave on the real root. The modules
/// directory is bound onto itself and then remounted read-only, since a bind
/// mount cannot be created read-only in one call.
#[must_use]
pub fn finalize_plan(paths: &BootPaths, options: &FinalizeOptions) -> MountPlan {
    let hardened = MountFlags::NOSUID | MountFlags::NOEXEC | MountFlags::NODEV;
    let modules = paths.staged_modules();

    vec![
        MountSpec::new("proc", paths.staged("/proc"), "proc").with_flags(hardened),
        MountSpec::new("sysfs", paths.staged("/sys"), "sysfs").with_flags(hardened),
        MountSpec::new("dev", paths.staged("/dev"), "devtmpfs")
            .with_flags(MountFlags::NOSUID)
            .with_data(DEV_OPTIONS),
        MountSpec::new("devpts", paths.staged("/dev/pts"), "devpts")
            .with_flags(MountFlags::NOSUID | MountFlags::NOEXEC)
            .with_data(PTS_OPTIONS),
        MountSpec::new("shm", paths.staged("/dev/shm"), "tmpfs")
            .with_flags(hardened)
            .with_data(format!("size={}", options.shm_size)),
        MountSpec::new("mqueue", paths.staged("/dev/mqueue"), "mqueue").with_flags(hardened),
        MountSpec::bind(&modules, &modules),
        MountSpec::bind(&modules, &modules)
            .with_flags(REMOUNT | MountFlags::BIND | MountFlags::RDONLY | hardened),
    ]
    .into()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn plan() -> MountPlan {
        finalize_plan(
            &BootPaths::new().with_staging_root("/rootfs"),
            &FinalizeOptions::default(),
        )
    }

    #[test]
    fn everything_lands_under_staging_root() {
        let targets: Vec<_> = plan().targets().map(PathBuf::from).collect();
        assert_eq!(
            targets,
            [
                "/rootfs/proc",
                "/rootfs/sys",
                "/rootfs/dev",
                "/rootfs/dev/pts",
                "/rootfs/dev/shm",
                "/rootfs/dev/mqueue",
                "/rootfs/lib/modules",
                "/rootfs/lib/modules",
            ]
            .map(PathBuf::from)
        );
    }

    #[test]
    fn dev_keeps_exec() {
        let plan = plan();
        assert_eq!(plan.as_slice()[2].flags, MountFlags::NOSUID);
    }

    #[test]
    fn shm_size_defaults_to_64_mib() {
        assert_eq!(plan().as_slice()[4].data, "size=65536k");

        let custom = finalize_plan(
            &BootPaths::new().with_staging_root("/rootfs"),
            &FinalizeOptions {
                shm_size: "128m".to_string(),
            },
        );
        assert_eq!(custom.as_slice()[4].data, "size=128m");
    }

    #[test]
    fn modules_bound_then_sealed() {
        let plan = plan();
        let specs = plan.as_slice();
        assert_eq!(specs[6].flags, MountFlags::BIND);
        assert!(!specs[6].is_readonly());
        assert!(specs[7].is_readonly());
        assert!(specs[7].flags.contains(REMOUNT | MountFlags::BIND | MountFlags::NOEXEC));
        assert_eq!(specs[7].source, "/rootfs/lib/modules");
    }
}
