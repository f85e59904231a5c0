/// Browse sessions — a view of one volume's files with on-demand previews.
///
/// The detection engine only needs [`Browser::open`]. How a session is
/// presented is up to the implementation; [`ListingBrowser`] writes the root
/// listing to the log sink.
pub mod preview;

use crate::error::BrowseError;
use crate::logging::{LogLevel, LogSink};
use crate::model::size::format_size;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use preview::{is_binary, list_dir, preview, BrowseEntry, EntryKind, Preview, BINARY_SNIFF_LEN};

/// A browsing context rooted at one volume.
pub struct BrowseSession {
    root: PathBuf,
    sink: Arc<dyn LogSink>,
}

impl BrowseSession {
    pub fn new(root: impl Into<PathBuf>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            root: root.into(),
            sink,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Top-level entries of the volume.
    pub fn entries(&self) -> Result<Vec<BrowseEntry>, BrowseError> {
        list_dir(&self.root)
    }

    /// Preview one top-level entry by name.
    pub fn select(&self, name: &str) -> Preview {
        let path = self.root.join(name);
        let shown = preview(&path);
        self.log(LogLevel::Info, &format!("Accessed: {}", path.display()));
        shown
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        self.sink.log(level, message);
    }
}

/// Opens a view for a newly attached volume. Runs on the session's own
/// thread, so it may block for as long as it likes.
pub trait Browser: Send + Sync {
    fn open(&self, session: BrowseSession) -> Result<(), BrowseError>;
}

/// Logs the root listing of the volume, one line per entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListingBrowser;

/// One listing line: directories are tagged, files carry their size.
pub fn describe_entry(entry: &BrowseEntry) -> String {
    match entry.kind {
        EntryKind::Directory => format!("  [DIR]  {}", entry.name),
        EntryKind::File => format!("  {} ({})", entry.name, format_size(entry.size)),
        EntryKind::Other => format!("  {}", entry.name),
    }
}

impl Browser for ListingBrowser {
    fn open(&self, session: BrowseSession) -> Result<(), BrowseError> {
        let entries = session.entries()?;
        session.log(
            LogLevel::Info,
            &format!(
                "Found {} files/folders on {}",
                entries.len(),
                session.root().display()
            ),
        );
        for entry in &entries {
            session.log(LogLevel::Info, &describe_entry(entry));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::RecordingSink;

    #[test]
    fn test_listing_browser_logs_count_and_entries() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("photos")).unwrap();
        std::fs::write(tmp.path().join("notes.txt"), b"hello").unwrap();

        let sink = Arc::new(RecordingSink::new());
        let session = BrowseSession::new(tmp.path(), sink.clone());
        ListingBrowser.open(session).unwrap();

        let info = sink.messages(LogLevel::Info);
        assert_eq!(
            info[0],
            format!("Found 2 files/folders on {}", tmp.path().display())
        );
        assert_eq!(info[1], "  notes.txt (5 B)");
        assert_eq!(info[2], "  [DIR]  photos");
    }

    #[test]
    fn test_listing_browser_reports_missing_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        let gone = tmp.path().join("unplugged");
        let session = BrowseSession::new(&gone, Arc::new(RecordingSink::new()));
        assert!(matches!(
            ListingBrowser.open(session),
            Err(BrowseError::NotFound { .. })
        ));
    }

    #[test]
    fn test_select_logs_access() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"abc").unwrap();

        let sink = Arc::new(RecordingSink::new());
        let session = BrowseSession::new(tmp.path(), sink.clone());
        assert_eq!(session.select("a.txt"), Preview::Text("abc".into()));
        assert_eq!(
            sink.messages(LogLevel::Info),
            vec![format!("Accessed: {}", tmp.path().join("a.txt").display())]
        );
    }
}
