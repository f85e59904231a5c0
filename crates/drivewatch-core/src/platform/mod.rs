/// Platform-specific functionality — mounted-volume enumeration and
/// disk-usage queries.
///
/// Both sit behind traits so the tracker's diff logic never depends on how
/// the host reports its volumes.
pub mod drives;
pub mod usage;

use crate::error::{EnumerationError, ProbeError};
use crate::model::{SizeInfo, VolumeId, VolumeSnapshot};

pub use drives::SystemEnumerator;
pub use usage::SystemProber;

/// Reports the set of volumes mounted right now.
///
/// Implementations are stateless. The result is best-effort: the OS does not
/// promise a consistent view while mounts are changing underneath it.
pub trait VolumeEnumerator: Send {
    fn enumerate(&self) -> Result<VolumeSnapshot, EnumerationError>;
}

/// Reports total/free capacity of one volume.
pub trait UsageProber: Send + Sync {
    fn probe(&self, id: &VolumeId) -> Result<SizeInfo, ProbeError>;
}
