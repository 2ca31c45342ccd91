//! Shutdown unmount sweep.
//!
//! Unmounts every disk-backed filesystem so dirty data is flushed before the
//! VM halts. There is no dependency graph: each pass detaches whatever real
//! filesystems are still listed, newest first, and the sweep repeats until a
//! pass finds nothing or the pass budget runs out.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};

use crate::mount::{Mounter, UnmountFlags};

/// Filesystem types that can hold data needing a flush.
pub const REAL_FILESYSTEMS: &[&str] = &["ext2", "ext3", "ext4", "xfs", "btrfs"];

/// Upper bound on sweep passes.
pub const MAX_TEARDOWN_PASSES: usize = 10;

/// Outcome of a sweep, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Passes that found mount points to detach.
    pub passes: usize,
    /// Unmount requests issued.
    pub attempts: usize,
    /// Unmount requests that failed.
    pub failures: usize,
}

/// Detach real filesystems listed in `mounts`, retrying to a fixed point.
///
/// Best effort: individual unmount failures are ignored, and an unreadable
/// listing ends the sweep.
pub fn teardown(mounter: &dyn Mounter, mounts: &Path) -> TeardownReport {
    let mut report = TeardownReport::default();

    for _ in 0..MAX_TEARDOWN_PASSES {
        let Some(points) = scan_mounts(mounts) else {
            break;
        };
        if points.is_empty() {
            break;
        }

        report.passes += 1;
        for point in &points {
            report.attempts += 1;
            if let Err(errno) = mounter.unmount(point, UnmountFlags::DETACH) {
                report.failures += 1;
                tracing::trace!(mount_point = %point.display(), %errno, "Unmount failed");
            }
        }
    }

    tracing::info!(
        passes = report.passes,
        attempts = report.attempts,
        failures = report.failures,
        "Teardown sweep finished"
    );
    report
}

/// Read the mount listing and collect real mount points.
///
/// Returns `None` if the listing cannot be opened. Lines are raw bytes, so
/// mount points that are not valid UTF-8 are still found. A read error part
/// way through keeps whatever was collected before it.
fn scan_mounts(mounts: &Path) -> Option<Vec<PathBuf>> {
    let file = match File::open(mounts) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %mounts.display(), error = %e, "Cannot open mount listing");
            return None;
        }
    };

    let mut points = Vec::new();
    for line in BufReader::new(file).split(b'\n') {
        match line {
            Ok(line) => points.extend(real_mount_point(&line)),
            Err(e) => {
                tracing::warn!(path = %mounts.display(), error = %e, "Mount listing read failed");
                break;
            }
        }
    }
    points.reverse();
    Some(points)
}

/// Real mount points in a mount listing, last listed first.
///
/// The namespace root and lines with fewer than three fields are skipped.
#[must_use]
pub fn real_mount_points(content: impl AsRef<[u8]>) -> Vec<PathBuf> {
    let mut points: Vec<PathBuf> = content
        .as_ref()
        .split(|&b| b == b'\n')
        .filter_map(real_mount_point)
        .collect();
    points.reverse();
    points
}

fn real_mount_point(line: &[u8]) -> Option<PathBuf> {
    let fields: Vec<&[u8]> = line
        .split(u8::is_ascii_whitespace)
        .filter(|field| !field.is_empty())
        .collect();
    if fields.len() < 3 || fields[1] == b"/" {
        return None;
    }
    REAL_FILESYSTEMS
        .iter()
        .any(|fstype| fstype.as_bytes() == fields[2])
        .then(|| unescape_mount_point(fields[1]))
}

/// Decode the kernel's `\ooo` octal escapes (space, tab, newline, backslash).
fn unescape_mount_point(bytes: &[u8]) -> PathBuf {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if let Some(value) = bytes.get(i + 1..i + 4).and_then(octal_byte) {
                out.push(value);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    PathBuf::from(OsString::from_vec(out))
}

fn octal_byte(digits: &[u8]) -> Option<u8> {
    if !digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
        return None;
    }
    let value = digits
        .iter()
        .fold(0u16, |acc, d| acc * 8 + u16::from(d - b'0'));
    u8::try_from(value).ok()
}
