//! Shared helpers: human-readable formatting and atomic file staging.

pub mod progress;

use std::path::{Path, PathBuf};

const BYTES_PER_UNIT: f64 = 1000.0;

/// Format an integer with thousands separators.
pub fn humanize_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a byte count using decimal (1000-based) units, the convention
/// of the profilers that emit these traces.
pub fn humanize_bytes(byte_count: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if byte_count < 1000 {
        return format!("{} bytes", humanize_count(byte_count));
    }
    let mut value = byte_count as f64 / BYTES_PER_UNIT;
    for unit in UNITS {
        if value < BYTES_PER_UNIT || unit == "PB" {
            return format!("{value:.2} {unit}");
        }
        value /= BYTES_PER_UNIT;
    }
    unreachable!()
}

/// Format a duration in seconds, switching to minutes past two minutes.
pub fn humanize_duration(secs: f64) -> String {
    if secs > 120.0 {
        format!("{:.2} mins", secs / 60.0)
    } else {
        format!("{secs:.2} secs")
    }
}

/// Sibling path used to stage a file before an atomic rename into place.
/// Nothing is ever visible under the final name until the write succeeded.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
