//! Standard guest paths consumed and produced by the mount stages.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

/// Default staging directory the real root filesystem is mounted on.
pub static STAGING_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("BOOTMOUNT_ROOTFS")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/rootfs"))
});

/// Kernel and guest paths used by the boot stages.
///
/// Every stage reads its inputs through this table so that the planners can
/// be pointed at a scratch directory instead of the live system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootPaths {
    /// Listing of currently mounted filesystems (default: /proc/mounts).
    pub proc_mounts: PathBuf,
    /// Cgroup controller descriptor (default: /proc/cgroups).
    pub proc_cgroups: PathBuf,
    /// Cgroup hierarchy mount root (default: /sys/fs/cgroup).
    pub cgroup_root: PathBuf,
    /// Staging directory for the real root filesystem (default: /rootfs).
    pub staging_root: PathBuf,
    /// Root of the initial ramdisk environment (default: /).
    pub initrd_root: PathBuf,
    /// Kernel modules directory, relative to whichever root is active
    /// (default: /lib/modules).
    pub modules_dir: PathBuf,
    /// Device bind-mounted over masked files (default: /dev/null).
    pub null_device: PathBuf,
}

impl BootPaths {
    /// Create paths with default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom staging root.
    #[must_use]
    pub fn with_staging_root(mut self, staging_root: impl Into<PathBuf>) -> Self {
        self.staging_root = staging_root.into();
        self
    }

    /// Re-root every kernel-facing path under `root`.
    ///
    /// The null device keeps its real location.
    #[must_use]
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            proc_mounts: rebase(root, Path::new("/proc/mounts")),
            proc_cgroups: rebase(root, Path::new("/proc/cgroups")),
            cgroup_root: rebase(root, Path::new("/sys/fs/cgroup")),
            staging_root: rebase(root, Path::new("/rootfs")),
            initrd_root: root.to_path_buf(),
            modules_dir: PathBuf::from("/lib/modules"),
            null_device: PathBuf::from("/dev/null"),
        }
    }

    /// Path inside the staged root filesystem.
    #[must_use]
    pub fn staged(&self, path: impl AsRef<Path>) -> PathBuf {
        rebase(&self.staging_root, path.as_ref())
    }

    /// Kernel modules directory inside the staged root filesystem.
    #[must_use]
    pub fn staged_modules(&self) -> PathBuf {
        self.staged(&self.modules_dir)
    }

    /// Kernel modules directory of the initial ramdisk.
    #[must_use]
    pub fn initrd_modules(&self) -> PathBuf {
        rebase(&self.initrd_root, &self.modules_dir)
    }

    /// Mount point of a single cgroup controller.
    #[must_use]
    pub fn cgroup_controller(&self, name: &str) -> PathBuf {
        self.cgroup_root.join(name)
    }
}

impl Default for BootPaths {
    fn default() -> Self {
        Self {
            proc_mounts: PathBuf::from("/proc/mounts"),
            proc_cgroups: PathBuf::from("/proc/cgroups"),
            cgroup_root: PathBuf::from("/sys/fs/cgroup"),
            staging_root: STAGING_ROOT.clone(),
            initrd_root: PathBuf::from("/"),
            modules_dir: PathBuf::from("/lib/modules"),
            null_device: PathBuf::from("/dev/null"),
        }
    }
}

/// Join `path` under `root`, treating an absolute `path` as relative to it.
#[must_use]
pub fn rebase(root: &Path, path: &Path) -> PathBuf {
    root.join(path.strip_prefix("/").unwrap_or(path))
}
