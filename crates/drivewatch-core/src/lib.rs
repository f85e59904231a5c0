/// DriveWatch Core — removable-drive detection engine.
///
/// This crate contains all business logic with zero UI dependencies. The
/// browse view, removal notice and log output sit behind traits so any
/// frontend can supply its own.
///
/// # Modules
///
/// - [`model`] — Volume ids, snapshots, drive events, size formatting.
/// - [`platform`] — Mounted-volume enumeration and disk-usage queries.
/// - [`monitor`] — The drive-state tracker and its poll thread.
/// - [`dispatch`] — Fans events out to probes, browse sessions and notices.
/// - [`browse`] — Directory listing and file previews for a volume.
/// - [`logging`] — Severity-tagged log sinks.
/// - [`config`] — Runtime settings.
/// - [`error`] — Error types.
pub mod browse;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod platform;
