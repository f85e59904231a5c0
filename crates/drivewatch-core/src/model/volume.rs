/// Volume identifiers and point-in-time snapshots of the mounted set.
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::hash_set;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Opaque OS-defined identifier of a mount point, e.g. `E:\` on Windows or
/// `/media/usb0` on Linux.
///
/// Two ids are the same volume exactly when their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeId(CompactString);

impl VolumeId {
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id interpreted as a filesystem root.
    pub fn as_path(&self) -> &Path {
        Path::new(self.0.as_str())
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VolumeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for VolumeId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// The set of volumes mounted at one instant.
///
/// Unordered and immutable once captured. Iteration order follows the
/// underlying hash set and must not be relied upon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeSnapshot {
    volumes: HashSet<VolumeId>,
}

impl VolumeSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &VolumeId) -> bool {
        self.volumes.contains(id)
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, VolumeId> {
        self.volumes.iter()
    }

    /// Volumes present in `self` but not in `other` (`self − other`).
    pub fn difference<'a>(
        &'a self,
        other: &'a VolumeSnapshot,
    ) -> impl Iterator<Item = &'a VolumeId> {
        self.volumes.difference(&other.volumes)
    }

    /// Comma-separated, sorted list for log lines; `"None"` when empty.
    pub fn describe(&self) -> String {
        if self.volumes.is_empty() {
            return "None".to_owned();
        }
        let mut ids: Vec<&str> = self.volumes.iter().map(VolumeId::as_str).collect();
        ids.sort_unstable();
        ids.join(", ")
    }
}

impl FromIterator<VolumeId> for VolumeSnapshot {
    fn from_iter<I: IntoIterator<Item = VolumeId>>(iter: I) -> Self {
        Self {
            volumes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a VolumeSnapshot {
    type Item = &'a VolumeId;
    type IntoIter = hash_set::Iter<'a, VolumeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.volumes.iter()
    }
}
