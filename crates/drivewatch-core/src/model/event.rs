/// Events emitted when the mounted set changes.
use super::size::format_size;
use super::volume::VolumeId;
use serde::{Deserialize, Serialize};

/// Capacity of a volume as reported by the disk-usage prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeInfo {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

impl SizeInfo {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.free_bytes)
    }

    /// `"Size: 14.91 GB, Free: 3.20 GB"`.
    pub fn describe(&self) -> String {
        format!(
            "Size: {}, Free: {}",
            format_size(self.total_bytes),
            format_size(self.free_bytes)
        )
    }
}

/// A volume arrived or went away between two ticks.
///
/// Created by the tracker, never mutated afterwards. The dispatcher builds a
/// new `Connected` value once the size probe has answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DriveEvent {
    Connected {
        id: VolumeId,
        size_info: Option<SizeInfo>,
    },
    Disconnected {
        id: VolumeId,
    },
}

impl DriveEvent {
    pub fn connected(id: VolumeId) -> Self {
        Self::Connected {
            id,
            size_info: None,
        }
    }

    pub fn disconnected(id: VolumeId) -> Self {
        Self::Disconnected { id }
    }

    pub fn id(&self) -> &VolumeId {
        match self {
            Self::Connected { id, .. } | Self::Disconnected { id } => id,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// A copy of this `Connected` event carrying `size_info`.
    /// `Disconnected` events are returned unchanged.
    pub fn with_size(&self, size_info: Option<SizeInfo>) -> Self {
        match self {
            Self::Connected { id, .. } => Self::Connected {
                id: id.clone(),
                size_info,
            },
            Self::Disconnected { .. } => self.clone(),
        }
    }
}
