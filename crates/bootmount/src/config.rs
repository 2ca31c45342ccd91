//! Boot configuration handed to the guest by the host.

use std::path::Path;

use bootmount_common::{BootError, BootResult};
use serde::{Deserialize, Serialize};

use crate::mount::MountSpec;
use crate::security::SecurityConfig;
use crate::stages::{FinalizeOptions, RootfsOptions};

/// Stage inputs, loaded from a JSON file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    /// Mounts placed under the staged root after the root transition.
    pub extra_mounts: Vec<MountSpec>,
    /// Path hardening for the workload.
    pub security: SecurityConfig,
    /// How the real root filesystem is reached.
    pub rootfs: RootfsOptions,
    /// Tunables of the finalized root.
    pub finalize: FinalizeOptions,
}

impl BootConfig {
    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`BootError::Config`] if the file cannot be read and
    /// [`BootError::Serialization`] if it is not valid configuration JSON.
    pub fn load(path: impl AsRef<Path>) -> BootResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| BootError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let config = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded boot configuration");
        Ok(config)
    }

    /// Load `path` if given, otherwise use the defaults.
    ///
    /// # Errors
    ///
    /// See [`BootConfig::load`].
    pub fn load_or_default(path: Option<&Path>) -> BootResult<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::tempdir;

    use super::*;
    use crate::mount::MountFlags;

    #[test]
    fn empty_object_is_default() {
        let config: BootConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BootConfig::default());
        assert_eq!(config.rootfs.fstype, "9p");
        assert_eq!(config.finalize.shm_size, "65536k");
    }

    #[test]
    fn load_extra_mounts() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("boot.json");
        std::fs::write(
            &path,
            r#"{
                "extra_mounts": [
                    {
                        "source": "/run/resolv.conf",
                        "target": "/etc/resolv.conf",
                        "flags": ["bind", "rdonly"]
                    }
                ],
                "security": {"readonly_paths": []}
            }"#,
        )
        .unwrap();

        let config = BootConfig::load(&path).unwrap();

        assert_eq!(config.extra_mounts.len(), 1);
        assert_eq!(config.extra_mounts[0].target, PathBuf::from("/etc/resolv.conf"));
        assert_eq!(config.extra_mounts[0].flags, MountFlags::BIND | MountFlags::RDONLY);
        assert!(config.security.readonly_paths.is_empty());
        assert!(!config.security.masked_paths.is_empty());
    }

    #[test]
    fn missing_file_is_config_error() {
        let temp = tempdir().unwrap();
        let err = BootConfig::load(temp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, BootError::Config { .. }));
    }

    #[test]
    fn bad_json_is_serialization_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("boot.json");
        std::fs::write(&path, "{\"extra_mounts\": 3}").unwrap();

        let err = BootConfig::load(&path).unwrap_err();

        assert!(matches!(err, BootError::Serialization(_)));
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(BootConfig::load_or_default(None).unwrap(), BootConfig::default());
    }
}
