//! Applies mount plans.

use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;

use bootmount_common::{BootError, BootResult};
use rustix::fs::Mode;

use super::spec::{MountFlags, MountPlan, MountSpec, REMOUNT};
use super::syscall::Mounter;

/// Permissions of directories created for missing mount targets.
const TARGET_DIR_MODE: u32 = 0o755;

/// Apply every mount in `plan`, in order.
///
/// Stops at the first failure. Mounts applied before the failing entry stay
/// in place; nothing after it is attempted.
///
/// # Errors
///
/// Returns the error of the first mount that could not be applied.
pub fn apply_plan(mounter: &dyn Mounter, plan: &MountPlan) -> BootResult<()> {
    for spec in plan {
        apply_spec(mounter, spec)?;
    }
    Ok(())
}

/// Apply a single mount.
///
/// The read-only bit is never passed to the initial mount: the mount is
/// created writable, `mode` is applied, and a remount then seals it.
///
/// # Errors
///
/// - [`BootError::PathConflict`] if the target is a regular file.
/// - [`BootError::Io`] if the target directory cannot be created.
/// - [`BootError::MountFailed`] if the mount syscall fails.
/// - [`BootError::InvalidMode`] or [`BootError::Syscall`] if the mode
///   cannot be parsed or applied, or the read-only remount fails.
pub fn apply_spec(mounter: &dyn Mounter, spec: &MountSpec) -> BootResult<()> {
    let target = spec.target.as_path();

    match std::fs::metadata(target) {
        Ok(meta) if meta.is_file() => {
            return Err(BootError::PathConflict {
                target: target.to_path_buf(),
            });
        }
        Ok(meta) if meta.is_dir() => {}
        _ => DirBuilder::new()
            .recursive(true)
            .mode(TARGET_DIR_MODE)
            .create(target)?,
    }

    let flags = spec.flags.difference(MountFlags::RDONLY);

    tracing::debug!(
        source = %spec.source,
        mount_point = %target.display(),
        fstype = %spec.fstype,
        ?flags,
        data = %spec.data,
        "Mounting filesystem"
    );

    mounter
        .mount(&spec.source, target, &spec.fstype, flags, &spec.data)
        .map_err(|errno| BootError::MountFailed {
            source_path: spec.source.clone(),
            target: target.to_path_buf(),
            fstype: spec.fstype.clone(),
            id: spec.id.clone(),
            data: spec.data.clone(),
            errno: errno.into(),
        })?;

    if !spec.mode.is_empty() {
        let mode = parse_mode(&spec.mode)?;
        rustix::fs::chmod(target, Mode::from_raw_mode(mode))
            .map_err(|errno| BootError::syscall("chmod", target, errno))?;
    }

    if spec.is_readonly() {
        tracing::debug!(mount_point = %target.display(), "Remounting read-only");
        mounter
            .mount("", target, "", spec.flags | REMOUNT, "")
            .map_err(|errno| BootError::syscall("remount read-only", target, errno))?;
    }

    Ok(())
}

/// Parse an octal permission string such as `"0755"`.
///
/// # Errors
///
/// Returns [`BootError::InvalidMode`] if `mode` is empty, contains anything
/// but octal digits (a sign included), or does not fit in 32 bits.
pub fn parse_mode(mode: &str) -> BootResult<u32> {
    let invalid = || BootError::InvalidMode {
        mode: mode.to_string(),
    };
    if mode.is_empty() || !mode.bytes().all(|b| matches!(b, b'0'..=b'7')) {
        return Err(invalid());
    }
    u32::from_str_radix(mode, 8).map_err(|_| invalid())
}
