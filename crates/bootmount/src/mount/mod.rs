//! Mount plans and their execution.
//!
//! This module handles:
//! - The [`MountSpec`] / [`MountPlan`] data model
//! - The [`Mounter`] seam between plans and the kernel
//! - Applying plans in order with the read-only remount step

mod executor;
mod spec;
mod syscall;

pub use executor::{apply_plan, apply_spec, parse_mode};
pub use spec::{MountFlags, MountPlan, MountSpec, REMOUNT, flag_names, parse_flag};
pub use syscall::{KernelMounter, MountCall, Mounter, RecordingMounter};

pub use rustix::mount::UnmountFlags;
