//! Initial ramdisk pseudo-filesystems.

use crate::mount::{MountFlags, MountPlan, MountSpec};

use super::{DEV_OPTIONS, PTS_OPTIONS};

/// Mounts needed before any real root filesystem is available.
///
/// Order matters: `/dev/pts` lives on the `/dev` mount.
#[must_use]
pub fn early_plan() -> MountPlan {
    let hardened = MountFlags::NOSUID | MountFlags::NOEXEC | MountFlags::NODEV;

    vec![
        MountSpec::new("proc", "/proc", "proc").with_flags(hardened),
        MountSpec::new("dev", "/dev", "devtmpfs")
            .with_flags(MountFlags::NOSUID | MountFlags::NOEXEC)
            .with_data(DEV_OPTIONS),
        MountSpec::new("sysfs", "/sys", "sysfs").with_flags(hardened),
        MountSpec::new("devpts", "/dev/pts", "devpts")
            .with_flags(MountFlags::NOSUID | MountFlags::NOEXEC)
            .with_data(PTS_OPTIONS),
    ]
    .into()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn dev_precedes_pts() {
        let plan = early_plan();
        let targets: Vec<_> = plan.targets().collect();
        assert_eq!(
            targets,
            [
                Path::new("/proc"),
                Path::new("/dev"),
                Path::new("/sys"),
                Path::new("/dev/pts")
            ]
        );
    }

    #[test]
    fn pseudo_filesystems_are_hardened() {
        let plan = early_plan();
        for spec in &plan {
            assert!(spec.flags.contains(MountFlags::NOSUID | MountFlags::NOEXEC));
            assert!(!spec.is_readonly());
        }
        assert_eq!(plan.as_slice()[1].data, "mode=0755");
        assert_eq!(plan.as_slice()[3].data, "newinstance,gid=5,mode=0620,ptmxmode=000");
    }
}
