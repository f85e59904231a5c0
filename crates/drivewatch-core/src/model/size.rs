/// Size formatting utilities — human-readable byte counts.
///
/// All internal sizes are `u64` bytes. Floating point is only used
/// at the display-formatting boundary.

/// Format a byte count into a human-readable string with appropriate unit.
///
/// Uses binary units (KiB = 1024) but labels them with the short forms
/// (KB, MB, GB, TB) people expect to see next to a drive.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    const TB: f64 = GB * 1024.0;

    let b = bytes as f64;
    match b {
        b if b < KB => format!("{bytes} B"),
        b if b < MB => format!("{:.1} KB", b / KB),
        b if b < GB => format!("{:.1} MB", b / MB),
        b if b < TB => format!("{:.2} GB", b / GB),
        b => format!("{:.2} TB", b / TB),
    }
}
