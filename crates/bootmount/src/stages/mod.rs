//! Boot stages.
//!
//! ```text
//! initrd                         staged root (after switch_root)
//! ┌──────────────┐              ┌──────────────────┐
//! │ early        │──> rootfs ──>│ finalize         │──> cgroups ──> harden
//! │ /proc /dev   │   /rootfs +  │ /proc /sys /dev  │
//! │ /sys /dev/pts│   extras     │ shm mqueue mods  │        ...workload...
//! └──────────────┘              └──────────────────┘              │
//!                                                     teardown <──┘
//! ```
//!
//! Each stage is a pure planner returning a [`MountPlan`] plus a
//! [`BootSequence`] method that applies it. The sequence does not enforce
//! ordering; the init process calls the stages in the order above.

mod cgroups;
mod early;
mod finalize;
mod rootfs;

use bootmount_common::{BootPaths, BootResult};

use crate::mount::{KernelMounter, MountPlan, MountSpec, Mounter, apply_plan};
use crate::security::SecurityConfig;
use crate::teardown::{TeardownReport, teardown};

pub use cgroups::cgroup_plan;
pub use early::early_plan;
pub use finalize::{FinalizeOptions, finalize_plan};
pub use rootfs::{RootfsOptions, rootfs_plan};

/// devtmpfs options shared by the early and finalize stages.
pub const DEV_OPTIONS: &str = "mode=0755";

/// devpts options: a private pty instance owned by the tty group.
pub const PTS_OPTIONS: &str = "newinstance,gid=5,mode=0620,ptmxmode=000";

/// Applies the boot stages through a [`Mounter`].
#[derive(Debug)]
pub struct BootSequence<M: Mounter> {
    mounter: M,
    paths: BootPaths,
}

impl BootSequence<KernelMounter> {
    /// Sequence acting on the live mount namespace with the standard paths.
    #[must_use]
    pub fn kernel() -> Self {
        Self::new(KernelMounter, BootPaths::new())
    }
}

impl<M: Mounter> BootSequence<M> {
    /// Create a sequence from a mounter and a paths table.
    pub const fn new(mounter: M, paths: BootPaths) -> Self {
        Self { mounter, paths }
    }

    /// The mounter requests go through.
    pub const fn mounter(&self) -> &M {
        &self.mounter
    }

    /// The paths table.
    pub const fn paths(&self) -> &BootPaths {
        &self.paths
    }

    /// Mount the initrd pseudo-filesystems.
    ///
    /// # Errors
    ///
    /// Returns the first mount error.
    pub fn mount_early(&self) -> BootResult<()> {
        self.run("early", &early_plan())
    }

    /// Mount the real root on the staging path plus the extra mounts.
    ///
    /// # Errors
    ///
    /// Returns the first mount error.
    pub fn mount_rootfs(&self, options: &RootfsOptions, extra: &[MountSpec]) -> BootResult<()> {
        self.run("rootfs", &rootfs_plan(&self.paths, options, extra))
    }

    /// Mount the pseudo-filesystems of the staged root.
    ///
    /// # Errors
    ///
    /// Returns the first mount error.
    pub fn mount_finalize(&self, options: &FinalizeOptions) -> BootResult<()> {
        self.run("finalize", &finalize_plan(&self.paths, options))
    }

    /// Mount one hierarchy per enabled cgroup controller.
    ///
    /// Returns `false` when the guest has no cgroup support.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor cannot be read or a mount fails.
    pub fn mount_cgroups(&self) -> BootResult<bool> {
        match cgroup_plan(&self.paths)? {
            Some(plan) => self.run("cgroups", &plan).map(|()| true),
            None => {
                tracing::info!("Cgroups unavailable, skipping");
                Ok(false)
            }
        }
    }

    /// Apply read-only lockdown and masking.
    ///
    /// # Errors
    ///
    /// Returns the first hardening error.
    pub fn harden(&self, security: &SecurityConfig) -> BootResult<()> {
        security.apply(&self.mounter, &self.paths.null_device)
    }

    /// Detach every real filesystem. Never fails.
    pub fn teardown(&self) -> TeardownReport {
        teardown(&self.mounter, &self.paths.proc_mounts)
    }

    fn run(&self, stage: &str, plan: &MountPlan) -> BootResult<()> {
        tracing::info!(stage, mounts = plan.len(), "Mounting stage");
        apply_plan(&self.mounter, plan)?;
        tracing::info!(stage, "Stage mounted");
        Ok(())
    }
}
