//! Cgroup controller discovery.
//!
//! The kernel lists its controllers in `/proc/cgroups`; every enabled one
//! gets its own v1 hierarchy under the cgroup root.

mod controllers;

pub use controllers::{CgroupController, enabled_controllers, parse_controllers};
