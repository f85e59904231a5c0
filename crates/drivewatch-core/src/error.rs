/// Error taxonomy for the detection engine.
///
/// Every error except [`FatalStartupError`] is recoverable: it is swallowed
/// where it occurs and turned into a log entry. Only startup failures reach
/// the process exit code.
use std::path::PathBuf;
use thiserror::Error;

/// The OS could not report the set of mounted volumes for this tick.
#[derive(Debug, Error)]
pub enum EnumerationError {
    /// A platform API call failed.
    #[error("volume enumeration failed: {0}")]
    Os(#[source] std::io::Error),
    /// The mount table could not be read.
    #[error("failed to read mount table {path}: {source}")]
    MountTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Disk-usage query failed. Only degrades the information attached to a
/// `Connected` event.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The platform query returned an error.
    #[error("disk usage query failed for {volume}: {source}")]
    Os {
        volume: String,
        #[source]
        source: std::io::Error,
    },
    /// The query did not return within the configured bound.
    #[error("disk usage query for {volume} timed out after {timeout_ms} ms")]
    TimedOut { volume: String, timeout_ms: u64 },
    /// Too many earlier probes are still stuck in the OS.
    #[error("disk usage query for {volume} skipped: {inflight} probes still running")]
    Saturated { volume: String, inflight: usize },
    /// The probe worker could not be started or died before answering.
    #[error("disk usage probe worker for {volume} failed: {reason}")]
    Worker { volume: String, reason: String },
}

/// A listing or read inside a browse session failed.
#[derive(Debug, Error)]
pub enum BrowseError {
    #[error("permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },
    #[error("path no longer exists: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BrowseError {
    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Configuration could not be loaded or is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A capability the watcher cannot run without is missing at launch.
#[derive(Debug, Error)]
pub enum FatalStartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("drive enumeration is unavailable on this host: {0}")]
    Enumerator(#[from] EnumerationError),
    #[error("failed to start {what} thread: {source}")]
    Spawn {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },
}
