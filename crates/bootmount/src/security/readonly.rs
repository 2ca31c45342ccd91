//! Recursive read-only lockdown.

use std::path::PathBuf;

use bootmount_common::{BootError, BootResult};
use rustix::io::Errno;

use crate::mount::{MountFlags, Mounter, REMOUNT};

/// Make each path in `paths` read-only, including mounts below it.
///
/// Each path is bind-mounted onto itself recursively, then the bind is
/// remounted read-only. A path missing at bind time is skipped.
///
/// # Errors
///
/// Returns the first bind or remount failure other than a missing path.
pub fn readonly_paths(mounter: &dyn Mounter, paths: &[PathBuf]) -> BootResult<()> {
    let recursive_bind = MountFlags::BIND | MountFlags::REC;

    for path in paths {
        let source = path.to_string_lossy();

        match mounter.mount(&source, path, "", recursive_bind, "") {
            Ok(()) => {}
            Err(errno) if errno == Errno::NOENT => {
                tracing::debug!(path = %path.display(), "Read-only target absent, skipping");
                continue;
            }
            Err(errno) => return Err(BootError::syscall("bind", path, errno)),
        }

        tracing::debug!(path = %path.display(), "Locking path read-only");
        mounter
            .mount(&source, path, "", recursive_bind | REMOUNT | MountFlags::RDONLY, "")
            .map_err(|errno| BootError::syscall("remount read-only", path, errno))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::{MountCall, RecordingMounter};

    #[test]
    fn bind_then_remount() {
        let mounter = RecordingMounter::new();

        readonly_paths(&mounter, &[PathBuf::from("/proc/sys")]).unwrap();

        let calls = mounter.calls();
        assert_eq!(calls.len(), 2);
        let MountCall::Mount { flags, source, .. } = &calls[1] else {
            panic!("expected a mount call");
        };
        assert_eq!(source, "/proc/sys");
        assert_eq!(
            *flags,
            MountFlags::BIND | MountFlags::REC | REMOUNT | MountFlags::RDONLY
        );
        assert!(matches!(
            &calls[0],
            MountCall::Mount { flags, .. } if *flags == MountFlags::BIND | MountFlags::REC
        ));
    }

    #[test]
    fn missing_path_is_skipped() {
        let mounter = RecordingMounter::new().with_failure("/proc/bus", Errno::NOENT);

        readonly_paths(&mounter, &[PathBuf::from("/proc/bus"), PathBuf::from("/proc/fs")])
            .unwrap();

        assert_eq!(
            mounter.mount_targets(),
            [PathBuf::from("/proc/fs"), PathBuf::from("/proc/fs")]
        );
    }

    #[test]
    fn other_errors_abort() {
        let mounter = RecordingMounter::new().with_failure("/proc/irq", Errno::ACCESS);

        let err = readonly_paths(&mounter, &[PathBuf::from("/proc/irq"), PathBuf::from("/proc/fs")])
            .unwrap_err();

        assert!(matches!(err, BootError::Syscall { operation: "bind", .. }));
        assert!(mounter.calls().is_empty());
    }
}
