//! Cgroup v1 hierarchy mounts.

use bootmount_common::{BootPaths, BootResult};

use crate::cgroup::enabled_controllers;
use crate::mount::{MountFlags, MountPlan, MountSpec};

/// Plan the cgroup hierarchy.
///
/// Returns `Ok(None)` when the kernel has no cgroup support or the guest has
/// no cgroup mount root; cgroups are optional. Otherwise the plan mounts a
/// tmpfs on the root and one `cgroup` filesystem per enabled controller.
///
/// # Errors
///
/// Returns an error if the controller descriptor exists but cannot be read.
pub fn cgroup_plan(paths: &BootPaths) -> BootResult<Option<MountPlan>> {
    if !paths.proc_cgroups.is_file() {
        tracing::debug!(
            path = %paths.proc_cgroups.display(),
            "No cgroup descriptor, skipping cgroups"
        );
        return Ok(None);
    }
    if !paths.cgroup_root.is_dir() {
        tracing::debug!(
            path = %paths.cgroup_root.display(),
            "No cgroup mount root, skipping cgroups"
        );
        return Ok(None);
    }

    let hardened = MountFlags::NOSUID | MountFlags::NOEXEC | MountFlags::NODEV;
    let content = std::fs::read_to_string(&paths.proc_cgroups)?;

    let mut plan: MountPlan = vec![
        MountSpec::new("tmpfs", &paths.cgroup_root, "tmpfs")
            .with_flags(hardened)
            .with_data("mode=0755"),
    ]
    .into();

    plan.extend(enabled_controllers(&content).into_iter().map(|controller| {
        MountSpec::new("cgroup", paths.cgroup_controller(&controller.name), "cgroup")
            .with_flags(hardened)
            .with_data(&controller.name)
            .with_id(controller.name)
    }));

    Ok(Some(plan))
}
