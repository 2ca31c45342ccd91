//! The boundary between mount plans and the kernel.

use std::collections::HashMap;
use std::ffi::CString;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustix::io::{Errno, Result};
use rustix::mount::UnmountFlags;

use super::spec::{MountFlags, REMOUNT};

/// Issues mount and unmount requests.
///
/// Plans, the security layer and the teardown sweep all talk to the kernel
/// through this trait, so the same sequencing logic can be pointed at a
/// recorder instead of the live mount namespace.
pub trait Mounter {
    /// Mount `source` onto `target`. A request carrying [`REMOUNT`] changes the
    /// flags of the existing mount at `target` and ignores `source`/`fstype`.
    fn mount(
        &self,
        source: &str,
        target: &Path,
        fstype: &str,
        flags: MountFlags,
        data: &str,
    ) -> Result<()>;

    /// Unmount `target`.
    fn unmount(&self, target: &Path, flags: UnmountFlags) -> Result<()>;
}

impl<M: Mounter + ?Sized> Mounter for &M {
    fn mount(
        &self,
        source: &str,
        target: &Path,
        fstype: &str,
        flags: MountFlags,
        data: &str,
    ) -> Result<()> {
        (**self).mount(source, target, fstype, flags, data)
    }

    fn unmount(&self, target: &Path, flags: UnmountFlags) -> Result<()> {
        (**self).unmount(target, flags)
    }
}

/// Issues the real syscalls.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelMounter;

impl Mounter for KernelMounter {
    fn mount(
        &self,
        source: &str,
        target: &Path,
        fstype: &str,
        flags: MountFlags,
        data: &str,
    ) -> Result<()> {
        if flags.contains(REMOUNT) {
            rustix::mount::mount_remount(target, flags.difference(REMOUNT), data)
        } else {
            let data = mount_data(data)?;
            rustix::mount::mount(source, target, fstype, flags, data.as_deref())
        }
    }

    fn unmount(&self, target: &Path, flags: UnmountFlags) -> Result<()> {
        rustix::mount::unmount(target, flags)
    }
}

/// Options string for the plain mount entry point; empty means no options.
fn mount_data(data: &str) -> Result<Option<CString>> {
    if data.is_empty() {
        return Ok(None);
    }
    CString::new(data).map(Some).map_err(|_| Errno::INVAL)
}

/// A request seen by [`RecordingMounter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountCall {
    /// A mount or remount request.
    Mount {
        /// Mount source.
        source: String,
        /// Mount target.
        target: PathBuf,
        /// Filesystem type.
        fstype: String,
        /// Requested flags.
        flags: MountFlags,
        /// Filesystem-specific options.
        data: String,
    },
    /// An unmount request.
    Unmount {
        /// Unmount target.
        target: PathBuf,
        /// Requested flags.
        flags: UnmountFlags,
    },
}

impl MountCall {
    /// Target path of the request.
    #[must_use]
    pub fn target(&self) -> &Path {
        match self {
            Self::Mount { target, .. } | Self::Unmount { target, .. } => target,
        }
    }
}

/// Records requests instead of issuing them.
///
/// Failures can be injected per target path, and for every unmount. A failed
/// request is not recorded.
#[derive(Debug, Default)]
pub struct RecordingMounter {
    calls: Mutex<Vec<MountCall>>,
    failures: HashMap<PathBuf, Errno>,
    unmount_failure: Option<Errno>,
}

impl RecordingMounter {
    /// Create a recorder that accepts every request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every request targeting `target` with `errno`.
    #[must_use]
    pub fn with_failure(mut self, target: impl Into<PathBuf>, errno: Errno) -> Self {
        self.failures.insert(target.into(), errno);
        self
    }

    /// Fail every unmount request with `errno`.
    #[must_use]
    pub fn with_unmount_failure(mut self, errno: Errno) -> Self {
        self.unmount_failure = Some(errno);
        self
    }

    /// All recorded requests, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MountCall> {
        self.calls.lock().clone()
    }

    /// Targets of recorded mount requests, in order.
    #[must_use]
    pub fn mount_targets(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, MountCall::Mount { .. }))
            .map(|call| call.target().to_path_buf())
            .collect()
    }

    /// Targets of recorded unmount requests, in order.
    #[must_use]
    pub fn unmount_targets(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, MountCall::Unmount { .. }))
            .map(|call| call.target().to_path_buf())
            .collect()
    }

    fn check(&self, target: &Path) -> Result<()> {
        self.failures.get(target).map_or(Ok(()), |errno| Err(*errno))
    }
}

impl Mounter for RecordingMounter {
    fn mount(
        &self,
        source: &str,
        target: &Path,
        fstype: &str,
        flags: MountFlags,
        data: &str,
    ) -> Result<()> {
        self.check(target)?;
        tracing::trace!(
            source,
            mount_point = %target.display(),
            fstype,
            ?flags,
            data,
            "Recording mount"
        );
        self.calls.lock().push(MountCall::Mount {
            source: source.to_string(),
            target: target.to_path_buf(),
            fstype: fstype.to_string(),
            flags,
            data: data.to_string(),
        });
        Ok(())
    }

    fn unmount(&self, target: &Path, flags: UnmountFlags) -> Result<()> {
        self.check(target)?;
        if let Some(errno) = self.unmount_failure {
            return Err(errno);
        }
        self.calls.lock().push(MountCall::Unmount {
            target: target.to_path_buf(),
            flags,
        });
        Ok(())
    }
}
