//! Human-readable renderers for status fields.
//!
//! Downstream consumers parse these strings, so the exact shapes are part of
//! the wire contract: `3.50GB`, `1200.00Mhz`, `12.5%`, `48.3°C`.

/// Binary magnitude units, smallest first.
const BYTE_UNITS: [&str; 6] = ["", "K", "M", "G", "T", "P"];

/// Scaling factor between adjacent units.
const BYTE_FACTOR: f64 = 1024.0;

/// Render a byte count with the default `B` suffix (e.g. `1.50KB`).
pub fn format_bytes(bytes: u64) -> String {
    format_bytes_with_suffix(bytes, "B")
}

/// Render a byte count with an explicit unit suffix.
///
/// The value is divided by 1024 until it drops below 1024 or the largest
/// unit (`P`) is reached, then printed with two decimals.
pub fn format_bytes_with_suffix(bytes: u64, suffix: &str) -> String {
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = BYTE_UNITS[0];
    for next in &BYTE_UNITS[1..] {
        if value < BYTE_FACTOR {
            break;
        }
        value /= BYTE_FACTOR;
        unit = next;
    }
    format!("{value:.2}{unit}{suffix}")
}

/// Render a frequency in MHz (e.g. `1500.00Mhz`).
pub fn format_frequency(mhz: f64) -> String {
    format!("{mhz:.2}Mhz")
}

/// Render a percentage as a string (e.g. `42.5%`).
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Percentage of `part` in `total`, `0.0` when `total` is zero.
pub fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = part as f64 / total as f64;
    ratio * 100.0
}

/// Render a temperature in degrees Celsius (e.g. `48.3°C`).
pub fn format_temperature(celsius: f32) -> String {
    format!("{celsius:.1}°C")
}

/// Render an uptime in seconds as `<d>d <h>h <m>m <s>s`, omitting leading zero units.
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
