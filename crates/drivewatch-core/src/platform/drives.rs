/// Mounted-volume enumeration.
///
/// - Windows: one `X:\` id per bit set in the logical-drive bitmask.
/// - Linux: mount points from `/proc/mounts` that live under one of the
///   removable-media roots.
/// - Other Unix: directories directly below the removable-media roots.
use super::VolumeEnumerator;
use crate::error::EnumerationError;
use crate::model::{VolumeId, VolumeSnapshot};
use std::path::{Path, PathBuf};

/// Location of the kernel mount table on Linux.
pub const PROC_MOUNTS: &str = "/proc/mounts";

/// The host's own enumerator.
#[derive(Debug, Clone)]
pub struct SystemEnumerator {
    /// Removable-media mount roots. Ignored on Windows.
    #[cfg_attr(windows, allow(dead_code))]
    roots: Vec<PathBuf>,
}

impl SystemEnumerator {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl VolumeEnumerator for SystemEnumerator {
    #[cfg(windows)]
    fn enumerate(&self) -> Result<VolumeSnapshot, EnumerationError> {
        enumerate_logical_drives()
    }

    #[cfg(target_os = "linux")]
    fn enumerate(&self) -> Result<VolumeSnapshot, EnumerationError> {
        let table = std::fs::read_to_string(PROC_MOUNTS).map_err(|source| {
            EnumerationError::MountTable {
                path: PathBuf::from(PROC_MOUNTS),
                source,
            }
        })?;
        Ok(parse_mounts(&table, &self.roots))
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    fn enumerate(&self) -> Result<VolumeSnapshot, EnumerationError> {
        list_root_children(&self.roots)
    }
}

// ─── Windows ────────────────────────────────────────────────────────────────

#[cfg(windows)]
fn enumerate_logical_drives() -> Result<VolumeSnapshot, EnumerationError> {
    use windows::Win32::Storage::FileSystem::GetLogicalDrives;

    let mask = unsafe { GetLogicalDrives() };
    if mask == 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error().unwrap_or(0) != 0 {
            return Err(EnumerationError::Os(err));
        }
    }
    Ok(drives_from_bitmask(mask))
}

/// Map a logical-drive bitmask (bit 0 = `A:`) to drive root ids.
pub fn drives_from_bitmask(mask: u32) -> VolumeSnapshot {
    (b'A'..=b'Z')
        .enumerate()
        .filter(|&(bit, _)| mask & (1u32 << bit) != 0)
        .map(|(_, letter)| VolumeId::new(format!("{}:\\", letter as char)))
        .collect()
}

// ─── Linux ──────────────────────────────────────────────────────────────────

/// Extract removable mount points from the text of `/proc/mounts`.
///
/// A mount point counts when it sits strictly below one of `roots`. Lines
/// with fewer than two fields are skipped.
pub fn parse_mounts(table: &str, roots: &[PathBuf]) -> VolumeSnapshot {
    table
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(unescape_mount_field)
        .filter(|mount| is_below_root(Path::new(mount), roots))
        .map(VolumeId::from)
        .collect()
}

fn is_below_root(mount: &Path, roots: &[PathBuf]) -> bool {
    roots
        .iter()
        .any(|root| mount != root.as_path() && mount.starts_with(root))
}

/// Decode the `\ooo` octal escapes the kernel uses for spaces, tabs,
/// newlines and backslashes in mount table fields.
pub fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal_triplet(&bytes[i + 1..i + 4]) {
            let value = bytes[i + 1..i + 4]
                .iter()
                .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
            if let Ok(byte) = u8::try_from(value) {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal_triplet(digits: &[u8]) -> bool {
    digits.len() == 3 && digits.iter().all(|d| (b'0'..=b'7').contains(d))
}

// ─── Other Unix ─────────────────────────────────────────────────────────────

/// Every directory directly below each root. A missing root contributes
/// nothing; any other read failure fails the whole enumeration.
pub fn list_root_children(roots: &[PathBuf]) -> Result<VolumeSnapshot, EnumerationError> {
    let mut ids = Vec::new();
    for root in roots {
        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(EnumerationError::Os(e)),
        };
        for entry in entries.flatten() {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                ids.push(VolumeId::from(entry.path().to_string_lossy().into_owned()));
            }
        }
    }
    Ok(ids.into_iter().collect())
}
