//! # Bootmount
//!
//! Guest-side mount orchestration for sandbox micro-VMs. An init process
//! calls the boot stages in order to build the mount namespace the workload
//! runs in, and the teardown sweep before the VM halts.
//!
//! ## Features
//!
//! - **Declarative plans**: every stage is an ordered list of [`mount::MountSpec`]
//! - **Cgroup v1**: one hierarchy per controller the kernel reports as enabled
//! - **Hardening**: recursive read-only lockdown and masking of `/proc` and `/sys` paths
//! - **Teardown**: fixed-point lazy unmount of disk-backed filesystems
//!
//! ## Usage
//!
//! ```no_run
//! use bootmount::security::SecurityConfig;
//! use bootmount::stages::{BootSequence, FinalizeOptions, RootfsOptions};
//!
//! # fn example() -> bootmount_common::BootResult<()> {
//! let boot = BootSequence::kernel();
//!
//! // Initrd pseudo-filesystems, then the real root
//! boot.mount_early()?;
//! boot.mount_rootfs(&RootfsOptions::default(), &[])?;
//!
//! // After switching into the staged root
//! boot.mount_finalize(&FinalizeOptions::default())?;
//! boot.mount_cgroups()?;
//! boot.harden(&SecurityConfig::default())?;
//!
//! // Before shutdown
//! boot.teardown();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

#[cfg(not(target_os = "linux"))]
compile_error!("bootmount only supports Linux guests");

pub mod cgroup;
pub mod cli;
pub mod config;
pub mod mount;
pub mod security;
pub mod stages;
pub mod teardown;

pub use config::BootConfig;
pub use stages::BootSequence;
