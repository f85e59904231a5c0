/// Data model for the drive watcher.
///
/// Volume identifiers, snapshots of what is mounted, and the events the
/// tracker emits when a snapshot changes.
pub mod event;
pub mod size;
pub mod volume;

pub use event::{DriveEvent, SizeInfo};
pub use volume::{VolumeId, VolumeSnapshot};
