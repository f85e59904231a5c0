/// Severity-tagged message sink.
///
/// Core components report user-facing messages through [`LogSink`] and never
/// format timestamps or colours themselves. The binary routes everything
/// into `tracing`; [`PlainSink`] writes timestamped plain text and
/// [`RecordingSink`] keeps messages in memory.
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;

/// Message classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    /// A drive arrived.
    Connect,
    /// A drive went away.
    Disconnect,
}

impl LogLevel {
    /// Upper-case tag used in plain-text output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Connect => "CONNECT",
            Self::Disconnect => "DISCONNECT",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Destination for severity-tagged messages. Must be callable from any
/// thread: the poll loop and every session thread share one sink.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Forwards messages into `tracing`. Connect/disconnect become `info`
/// events carrying a `kind` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
            LogLevel::Connect => tracing::info!(kind = "connect", "{message}"),
            LogLevel::Disconnect => tracing::info!(kind = "disconnect", "{message}"),
        }
    }
}

/// Writes `[YYYY-mm-dd HH:MM:SS] [LEVEL] message` lines to a writer.
pub struct PlainSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> PlainSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

/// One formatted plain-text log line, without the trailing newline.
pub fn format_line(
    timestamp: chrono::DateTime<chrono::Local>,
    level: LogLevel,
    message: &str,
) -> String {
    format!(
        "[{}] [{}] {}",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        level.label(),
        message
    )
}

impl<W: Write + Send> LogSink for PlainSink<W> {
    fn log(&self, level: LogLevel, message: &str) {
        let line = format_line(chrono::Local::now(), level, message);
        let mut out = self.out.lock();
        // A broken stdout must not take the watcher down with it.
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// Keeps every message in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything logged so far.
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().clone()
    }

    /// Messages logged at `level`.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl LogSink for RecordingSink {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries.lock().push((level, message.to_owned()));
    }
}
