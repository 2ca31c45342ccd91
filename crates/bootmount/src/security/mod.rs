//! Path hardening for the workload's filesystem.
//!
//! This module provides two lockdown primitives:
//! - Recursive read-only bind mounts over kernel tunables
//! - Masking of kernel attack-surface paths

mod mask;
mod readonly;

use std::path::{Path, PathBuf};

use bootmount_common::BootResult;
use serde::{Deserialize, Serialize};

use crate::mount::Mounter;

pub use mask::mask_paths;
pub use readonly::readonly_paths;

/// Paths hidden from the workload by default.
pub const DEFAULT_MASKED_PATHS: &[&str] = &[
    "/proc/acpi",
    "/proc/asound",
    "/proc/kcore",
    "/proc/keys",
    "/proc/latency_stats",
    "/proc/timer_list",
    "/proc/timer_stats",
    "/proc/sched_debug",
    "/proc/scsi",
    "/sys/firmware",
];

/// Paths made read-only for the workload by default.
pub const DEFAULT_READONLY_PATHS: &[&str] = &[
    "/proc/bus",
    "/proc/fs",
    "/proc/irq",
    "/proc/sys",
    "/proc/sysrq-trigger",
];

/// Hardening applied before the workload starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Paths hidden behind an empty read-only directory or the null device.
    pub masked_paths: Vec<PathBuf>,
    /// Paths remounted read-only, recursively.
    pub readonly_paths: Vec<PathBuf>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            masked_paths: DEFAULT_MASKED_PATHS.iter().map(PathBuf::from).collect(),
            readonly_paths: DEFAULT_READONLY_PATHS.iter().map(PathBuf::from).collect(),
        }
    }
}

impl SecurityConfig {
    /// Create a configuration that hardens nothing.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            masked_paths: Vec::new(),
            readonly_paths: Vec::new(),
        }
    }

    /// Whether there is nothing to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.masked_paths.is_empty() && self.readonly_paths.is_empty()
    }

    /// Lock down the read-only paths, then mask the masked ones.
    ///
    /// # Errors
    ///
    /// Returns the first failure of either primitive.
    pub fn apply(&self, mounter: &dyn Mounter, null_device: &Path) -> BootResult<()> {
        tracing::info!(
            readonly = self.readonly_paths.len(),
            masked = self.masked_paths.len(),
            "Applying path hardening"
        );
        readonly_paths(mounter, &self.readonly_paths)?;
        mask_paths(mounter, null_device, &self.masked_paths)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::mount::RecordingMounter;

    #[test]
    fn default_lists() {
        let config = SecurityConfig::default();
        assert!(config.masked_paths.contains(&PathBuf::from("/proc/kcore")));
        assert!(config.readonly_paths.contains(&PathBuf::from("/proc/sys")));
        assert!(SecurityConfig::none().is_empty());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: SecurityConfig =
            serde_json::from_str(r#"{"masked_paths":["/proc/kcore"]}"#).unwrap();
        assert_eq!(config.masked_paths, [PathBuf::from("/proc/kcore")]);
        assert_eq!(config.readonly_paths.len(), DEFAULT_READONLY_PATHS.len());
    }

    #[test]
    fn readonly_runs_before_masking() {
        let temp = tempdir().unwrap();
        let masked = temp.path().join("scsi");
        std::fs::create_dir(&masked).unwrap();
        let config = SecurityConfig {
            masked_paths: vec![masked.clone()],
            readonly_paths: vec![PathBuf::from("/proc/sys")],
        };
        let mounter = RecordingMounter::new();

        config.apply(&mounter, Path::new("/dev/null")).unwrap();

        assert_eq!(
            mounter.mount_targets(),
            [PathBuf::from("/proc/sys"), PathBuf::from("/proc/sys"), masked]
        );
    }
}
