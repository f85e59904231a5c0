/// Disk-usage queries: total and free bytes of a mounted volume.
use super::UsageProber;
use crate::error::ProbeError;
use crate::model::{SizeInfo, VolumeId};

/// Queries the host directly. Calls may block for as long as the device
/// takes to answer; wrap in a `BoundedProber` before using it on a freshly
/// attached volume.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProber;

impl UsageProber for SystemProber {
    fn probe(&self, id: &VolumeId) -> Result<SizeInfo, ProbeError> {
        query_disk_usage(id).map_err(|source| ProbeError::Os {
            volume: id.to_string(),
            source,
        })
    }
}

#[cfg(windows)]
fn query_disk_usage(id: &VolumeId) -> std::io::Result<SizeInfo> {
    use windows::Win32::Storage::FileSystem::GetDiskFreeSpaceExW;

    let root_wide: Vec<u16> = id
        .as_str()
        .encode_utf16()
        .chain(std::iter::once(0))
        .collect();
    let root_pcwstr = windows::core::PCWSTR(root_wide.as_ptr());

    let mut free_caller: u64 = 0;
    let mut total: u64 = 0;
    let mut free_total: u64 = 0;
    let result = unsafe {
        GetDiskFreeSpaceExW(
            root_pcwstr,
            Some(&mut free_caller as *mut u64),
            Some(&mut total as *mut u64),
            Some(&mut free_total as *mut u64),
        )
    };
    result.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    Ok(SizeInfo {
        total_bytes: total,
        free_bytes: free_caller,
    })
}

#[cfg(unix)]
fn query_disk_usage(id: &VolumeId) -> std::io::Result<SizeInfo> {
    use std::ffi::CString;

    let path_c = CString::new(id.as_str().as_bytes())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    // SAFETY: `stat` is plain old data, fully written by a successful call;
    // `path_c` is a valid NUL-terminated string for the duration of the call.
    let stat = unsafe {
        let mut stat: libc::statvfs = std::mem::zeroed();
        if libc::statvfs(path_c.as_ptr(), &mut stat) != 0 {
            return Err(std::io::Error::last_os_error());
        }
        stat
    };

    #[allow(clippy::unnecessary_cast)] // statvfs field widths vary by platform
    let block_size = stat.f_frsize as u64;
    #[allow(clippy::unnecessary_cast)]
    let total_bytes = (stat.f_blocks as u64).saturating_mul(block_size);
    #[allow(clippy::unnecessary_cast)]
    let free_bytes = (stat.f_bavail as u64).saturating_mul(block_size);

    Ok(SizeInfo {
        total_bytes,
        free_bytes,
    })
}
