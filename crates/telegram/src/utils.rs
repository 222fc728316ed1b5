//! Utility functions for formatting

/// Format file size in human-readable format
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let sign = if bytes < 0 { "-" } else { "" };
    let bytes = bytes.unsigned_abs() as f64;
    let unit_index = (bytes.ln() / 1024_f64.ln()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes / 1024_f64.powi(unit_index as i32);

    format!("{}{:.2} {}", sign, size, UNITS[unit_index])
}

/// Format file size (u64) in human-readable format
pub fn format_size(bytes: u64) -> String {
    format_bytes(bytes.min(i64::MAX as u64) as i64)
}

/// Format an uptime in seconds as `{h}h {m}m {s}s`
///
/// Hours are not wrapped into days.
pub fn format_uptime(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{}h {}m {}s", hours, minutes, secs)
}
