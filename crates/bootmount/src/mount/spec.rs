//! Mount plan data types.

use std::path::{Path, PathBuf};

use bootmount_common::paths::rebase;
use serde::{Deserialize, Serialize};

pub use rustix::mount::MountFlags;

/// The kernel's remount request bit.
///
/// rustix routes remounts through a dedicated entry point, so the bit has no
/// named constant on [`MountFlags`]; plans carry it as a retained bit.
pub const REMOUNT: MountFlags = MountFlags::from_bits_retain(libc::MS_REMOUNT as _);

/// Flag names accepted in serialized plans, in the order they are emitted.
const FLAG_NAMES: &[(&str, MountFlags)] = &[
    ("rdonly", MountFlags::RDONLY),
    ("nosuid", MountFlags::NOSUID),
    ("nodev", MountFlags::NODEV),
    ("noexec", MountFlags::NOEXEC),
    ("sync", MountFlags::SYNCHRONOUS),
    ("remount", REMOUNT),
    ("dirsync", MountFlags::DIRSYNC),
    ("noatime", MountFlags::NOATIME),
    ("nodiratime", MountFlags::NODIRATIME),
    ("bind", MountFlags::BIND),
    ("rec", MountFlags::REC),
    ("relatime", MountFlags::RELATIME),
    ("strictatime", MountFlags::STRICTATIME),
];

/// A single desired mount operation.
///
/// Specs are plain values: the executor only reads them, and helpers such as
/// [`MountSpec::rebased`] return a modified copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountSpec {
    /// Device name, pseudo-filesystem tag or bind source, depending on `fstype`.
    #[serde(default)]
    pub source: String,
    /// Mount point. Created on demand; must not be a regular file.
    pub target: PathBuf,
    /// Filesystem type, empty for bind and remount operations.
    #[serde(default)]
    pub fstype: String,
    /// Mount flags.
    #[serde(default = "MountFlags::empty", with = "flag_serde")]
    pub flags: MountFlags,
    /// Filesystem-specific mount options.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data: String,
    /// Octal permissions applied to `target` after mounting; empty keeps the default.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
    /// Identifier reported in errors only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
}

impl MountSpec {
    /// Create a mount of `fstype` from `source` onto `target` with no flags.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<PathBuf>,
        fstype: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            fstype: fstype.into(),
            flags: MountFlags::empty(),
            data: String::new(),
            mode: String::new(),
            id: String::new(),
        }
    }

    /// Create a bind mount of `source` onto `target`.
    pub fn bind(source: impl AsRef<Path>, target: impl Into<PathBuf>) -> Self {
        Self::new(source.as_ref().to_string_lossy(), target, "").with_flags(MountFlags::BIND)
    }

    /// Replace the mount flags.
    #[must_use]
    pub fn with_flags(mut self, flags: MountFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the filesystem-specific options.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    /// Set the octal mode applied after mounting.
    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Set the diagnostic identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Copy of this spec with its target re-rooted under `root`.
    #[must_use]
    pub fn rebased(&self, root: &Path) -> Self {
        Self {
            target: rebase(root, &self.target),
            ..self.clone()
        }
    }

    /// Whether the mount ends up read-only.
    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.flags.contains(MountFlags::RDONLY)
    }
}

/// Names of the flags set in `flags`, or `None` if some set bit has no name.
#[must_use]
pub fn flag_names(flags: MountFlags) -> Option<Vec<&'static str>> {
    let mut rest = flags;
    let names: Vec<&'static str> = FLAG_NAMES
        .iter()
        .filter(|(_, flag)| flags.contains(*flag))
        .map(|(name, flag)| {
            rest.remove(*flag);
            *name
        })
        .collect();
    rest.is_empty().then_some(names)
}

/// Parse a single lowercase flag name.
#[must_use]
pub fn parse_flag(name: &str) -> Option<MountFlags> {
    FLAG_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, flag)| *flag)
}

mod flag_serde {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{MountFlags, flag_names, parse_flag};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Bits(u64),
        Names(Vec<String>),
    }

    pub fn serialize<S: Serializer>(flags: &MountFlags, serializer: S) -> Result<S::Ok, S::Error> {
        match flag_names(*flags) {
            Some(names) => serializer.collect_seq(names),
            None => Repr::Bits(u64::from(flags.bits())).serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MountFlags, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Bits(bits) => Ok(MountFlags::from_bits_retain(
                bits.try_into().map_err(D::Error::custom)?,
            )),
            Repr::Names(names) => names.iter().try_fold(MountFlags::empty(), |acc, name| {
                parse_flag(name)
                    .map(|flag| acc | flag)
                    .ok_or_else(|| D::Error::custom(format!("unknown mount flag: {name}")))
            }),
        }
    }
}

/// Ordered sequence of mounts; position encodes dependency.
///
/// A plan is applied front to back, so a mount point must come after the
/// mount that provides its parent directory (`/dev` before `/dev/pts`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountPlan(Vec<MountSpec>);

impl MountPlan {
    /// Create an empty plan.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a mount.
    pub fn push(&mut self, spec: MountSpec) {
        self.0.push(spec);
    }

    /// Number of mounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the plan has no mounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the mounts in order.
    pub fn iter(&self) -> std::slice::Iter<'_, MountSpec> {
        self.0.iter()
    }

    /// Mount targets in order.
    pub fn targets(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(|spec| spec.target.as_path())
    }

    /// The mounts as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[MountSpec] {
        &self.0
    }
}

impl From<Vec<MountSpec>> for MountPlan {
    fn from(specs: Vec<MountSpec>) -> Self {
        Self(specs)
    }
}

impl FromIterator<MountSpec> for MountPlan {
    fn from_iter<I: IntoIterator<Item = MountSpec>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<MountSpec> for MountPlan {
    fn extend<I: IntoIterator<Item = MountSpec>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for MountPlan {
    type Item = MountSpec;
    type IntoIter = std::vec::IntoIter<MountSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MountPlan {
    type Item = &'a MountSpec;
    type IntoIter = std::slice::Iter<'a, MountSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
