/// Directory listing and file preview.
///
/// Listing failures come back as [`BrowseError`]; previews never fail, they
/// turn read errors into text the session shows inline.
use crate::error::BrowseError;
use std::fs::{File, FileType};
use std::io::Read;
use std::path::Path;

/// Bytes inspected when deciding whether a file is binary.
pub const BINARY_SNIFF_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, devices, sockets and the like.
    Other,
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseEntry {
    pub name: String,
    pub kind: EntryKind,
    /// File length in bytes; 0 for anything that is not a regular file.
    pub size: u64,
}

/// Entries whose type cannot be read are listed as [`EntryKind::Other`].
fn entry_kind(file_type: std::io::Result<FileType>) -> EntryKind {
    match file_type {
        Ok(t) if t.is_dir() => EntryKind::Directory,
        Ok(t) if t.is_file() => EntryKind::File,
        _ => EntryKind::Other,
    }
}

/// List `path`, sorted by name. Only failing to open `path` itself is an
/// error; one unreadable entry never hides its siblings.
pub fn list_dir(path: &Path) -> Result<Vec<BrowseEntry>, BrowseError> {
    let read_dir = std::fs::read_dir(path).map_err(|e| BrowseError::from_io(path, e))?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| BrowseError::from_io(path, e))?;
        let kind = entry_kind(entry.file_type());
        let size = match kind {
            EntryKind::File => entry.metadata().map(|m| m.len()).unwrap_or(0),
            EntryKind::Directory | EntryKind::Other => 0,
        };

        entries.push(BrowseEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind,
            size,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Whether `bytes` contains a NUL within the first [`BINARY_SNIFF_LEN`] bytes.
pub fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}

/// Sniff the head of `path`. A file that cannot be read counts as binary.
pub fn is_binary(path: &Path) -> bool {
    let mut head = Vec::with_capacity(BINARY_SNIFF_LEN);
    match File::open(path).and_then(|f| f.take(BINARY_SNIFF_LEN as u64).read_to_end(&mut head)) {
        Ok(_) => looks_binary(&head),
        Err(_) => true,
    }
}

/// What the session shows for a selected entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Directory { name: String, children: Vec<String> },
    DirectoryError { name: String, error: String },
    /// Full decoded content of a text file.
    Text(String),
    /// Binary files are reported by size only.
    Binary { size: u64 },
    /// The file could not be read.
    Error(String),
}

impl Preview {
    /// The preview as displayed text.
    pub fn render(&self) -> String {
        match self {
            Self::Directory { name, children } => {
                let mut out = format!("[Directory] {name}\n\nContents:\n");
                for child in children {
                    out.push_str("- ");
                    out.push_str(child);
                    out.push('\n');
                }
                out
            }
            Self::DirectoryError { name, error } => {
                format!("[Directory] {name}\n\nContents:\nError listing directory: {error}")
            }
            Self::Text(content) => content.clone(),
            Self::Binary { size } => format!("Binary file, size: {size} bytes"),
            Self::Error(error) => format!("Error reading file: {error}"),
        }
    }
}

/// Build the preview for `path`.
pub fn preview(path: &Path) -> Preview {
    if path.is_dir() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        return match list_dir(path) {
            Ok(entries) => Preview::Directory {
                name,
                children: entries.into_iter().map(|e| e.name).collect(),
            },
            Err(e) => Preview::DirectoryError {
                name,
                error: e.to_string(),
            },
        };
    }

    if is_binary(path) {
        return match File::open(path).and_then(|f| f.metadata()) {
            Ok(meta) => Preview::Binary { size: meta.len() },
            Err(e) => Preview::Error(e.to_string()),
        };
    }

    match std::fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Preview::Text(text),
            Err(e) => Preview::Error(e.to_string()),
        },
        Err(e) => Preview::Error(e.to_string()),
    }
}
