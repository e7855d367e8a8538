// ============================================================================
// vidshrink-core/src/utils.rs
// ============================================================================
//
// UTILITIES: Formatting and Parsing Helpers
//
// KEY COMPONENTS:
// - format_gigabytes: decimal (10^9) gigabytes for the summary report
// - format_bytes: binary units for per-file log lines
// - format_duration / parse_ffmpeg_time: encoder timestamps
// - retained_percent: size retained after compression

/// Bytes in one decimal gigabyte.
pub const BYTES_PER_GB: f64 = 1_000_000_000.0;

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Converts bytes to decimal gigabytes.
#[must_use]
pub fn bytes_to_gigabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

/// Formats bytes as decimal gigabytes with two decimals (e.g., "1.50 GB").
#[must_use]
pub fn format_gigabytes(bytes: u64) -> String {
    format!("{:.2} GB", bytes_to_gigabytes(bytes))
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Parses FFmpeg time string (HH:MM:SS.MS) to seconds. Returns None if invalid.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let parts: Vec<&str> = time.trim().split(':').collect();
    if parts.len() == 3 {
        let hours = parts[0].parse::<f64>().ok()?;
        let minutes = parts[1].parse::<f64>().ok()?;
        let seconds = parts[2].parse::<f64>().ok()?;
        let total = hours * 3600.0 + minutes * 60.0 + seconds;
        (total >= 0.0).then_some(total)
    } else {
        None
    }
}

/// Percentage of the original size still occupied after compression.
/// Returns None when there is no original size to compare against.
#[must_use]
pub fn retained_percent(before: u64, after: u64) -> Option<f64> {
    if before == 0 {
        None
    } else {
        Some(after as f64 / before as f64 * 100.0)
    }
}
