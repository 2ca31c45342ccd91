//! Hiding sensitive paths.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bootmount_common::{BootError, BootResult};

use crate::mount::{MountFlags, Mounter};

/// Mask each path in `paths`.
///
/// Directories get a read-only tmpfs over them; anything else gets
/// `null_device` bound over it. Paths that do not exist are skipped.
///
/// # Errors
///
/// Returns an error if a path cannot be inspected or a mount fails.
pub fn mask_paths(mounter: &dyn Mounter, null_device: &Path, paths: &[PathBuf]) -> BootResult<()> {
    for path in paths {
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Mask target absent, skipping");
                continue;
            }
            Err(e) => return Err(BootError::syscall("stat", path, e)),
        };

        if meta.is_dir() {
            tracing::debug!(path = %path.display(), "Masking directory with read-only tmpfs");
            mounter
                .mount("tmpfs", path, "tmpfs", MountFlags::RDONLY, "")
                .map_err(|errno| BootError::syscall("mask directory", path, errno))?;
        } else {
            tracing::debug!(path = %path.display(), "Masking file with null device");
            mounter
                .mount(
                    &null_device.to_string_lossy(),
                    path,
                    "",
                    MountFlags::BIND,
                    "",
                )
                .map_err(|errno| BootError::syscall("mask file", path, errno))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rustix::io::Errno;
    use tempfile::tempdir;

    use super::*;
    use crate::mount::{MountCall, RecordingMounter};

    #[test]
    fn absent_path_is_skipped() {
        let temp = tempdir().unwrap();
        let mounter = RecordingMounter::new();

        mask_paths(&mounter, Path::new("/dev/null"), &[temp.path().join("kcore")]).unwrap();

        assert!(mounter.calls().is_empty());
    }

    #[test]
    fn directory_gets_readonly_tmpfs() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("acpi");
        std::fs::create_dir(&dir).unwrap();
        let mounter = RecordingMounter::new();

        mask_paths(&mounter, Path::new("/dev/null"), &[dir.clone()]).unwrap();

        assert_eq!(
            mounter.calls(),
            [MountCall::Mount {
                source: "tmpfs".to_string(),
                target: dir,
                fstype: "tmpfs".to_string(),
                flags: MountFlags::RDONLY,
                data: String::new(),
            }]
        );
    }

    #[test]
    fn file_gets_null_device() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("timer_list");
        std::fs::write(&file, "secrets").unwrap();
        let mounter = RecordingMounter::new();

        mask_paths(&mounter, Path::new("/dev/null"), &[file.clone()]).unwrap();

        assert_eq!(
            mounter.calls(),
            [MountCall::Mount {
                source: "/dev/null".to_string(),
                target: file,
                fstype: String::new(),
                flags: MountFlags::BIND,
                data: String::new(),
            }]
        );
    }

    #[test]
    fn mount_failure_aborts() {
        let temp = tempdir().unwrap();
        let first = temp.path().join("a");
        let second = temp.path().join("b");
        std::fs::create_dir(&first).unwrap();
        std::fs::create_dir(&second).unwrap();
        let mounter = RecordingMounter::new().with_failure(&first, Errno::PERM);

        let err = mask_paths(&mounter, Path::new("/dev/null"), &[first, second]).unwrap_err();

        assert!(matches!(err, BootError::Syscall { operation: "mask directory", .. }));
        assert!(mounter.calls().is_empty());
    }
}
