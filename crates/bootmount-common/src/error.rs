//! Error types for the mount orchestrator.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`BootError`].
pub type BootResult<T> = Result<T, BootError>;

/// Errors raised while building or dismantling the guest mount namespace.
#[derive(Error, Diagnostic, Debug)]
pub enum BootError {
    /// A planned mount target already exists as a regular file.
    #[error("Invalid mount target, path is a file: {}", target.display())]
    #[diagnostic(
        code(bootmount::mount::path_conflict),
        help("Mount targets must be directories or absent; remove the file or fix the plan")
    )]
    PathConflict {
        /// The conflicting target path.
        target: PathBuf,
    },

    /// The mount syscall rejected a planned mount.
    #[error(
        "Mount failed: src:{source_path} dst:{} fs:{fstype} id:{id} data:{data} reason: {errno}",
        target.display()
    )]
    #[diagnostic(code(bootmount::mount::failed))]
    MountFailed {
        /// Mount source (device, pseudo-fs tag or bind source).
        source_path: String,
        /// Mount target.
        target: PathBuf,
        /// Filesystem type, empty for bind and remount requests.
        fstype: String,
        /// Diagnostic identifier of the mount (e.g. the cgroup controller).
        id: String,
        /// Filesystem-specific mount options.
        data: String,
        /// The kernel error.
        #[source]
        errno: std::io::Error,
    },

    /// A follow-up syscall (chmod, remount, bind, unmount) failed.
    #[error("{operation} failed on {}: {errno}", path.display())]
    #[diagnostic(code(bootmount::syscall))]
    Syscall {
        /// Short name of the operation that failed.
        operation: &'static str,
        /// Path the operation was applied to.
        path: PathBuf,
        /// The kernel error.
        #[source]
        errno: std::io::Error,
    },

    /// A mount mode string is not a valid octal number.
    #[error("Parse mode {mode:?} failed: not an octal permission string")]
    #[diagnostic(
        code(bootmount::mount::invalid_mode),
        help("Modes are octal permission strings such as \"0755\" or \"1777\"")
    )]
    InvalidMode {
        /// The rejected mode string.
        mode: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(bootmount::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(bootmount::serialization))]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(bootmount::config))]
    Config {
        /// The error message.
        message: String,
    },
}

impl BootError {
    /// Wrap a failed follow-up syscall.
    pub fn syscall(
        operation: &'static str,
        path: impl Into<PathBuf>,
        errno: impl Into<std::io::Error>,
    ) -> Self {
        Self::Syscall {
            operation,
            path: path.into(),
            errno: errno.into(),
        }
    }
}

impl From<serde_json::Error> for BootError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
