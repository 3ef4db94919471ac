//! Human-readable rate formatting.

/// Bytes in a kibibyte.
pub const KIB: f64 = 1024.0;
/// Bytes in a mebibyte.
pub const MIB: f64 = 1024.0 * 1024.0;
/// Bytes in a gibibyte.
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Round `value` to `digits` decimal places, ties away from zero.
///
/// `format!("{:.1}")` alone rounds ties to even on exact binary halves.
pub fn round_half_up(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

/// Format a rate in bytes per second.
///
/// Three tiers, chosen by threshold rather than magnitude: above 0.1 GiB/s
/// renders `GB/s`, above 0.1 MiB/s renders `MB/s`, anything else `kb/s`.
/// One decimal digit, 1024-based. Negative or non-finite input renders as
/// zero.
pub fn format_speed(bytes_per_sec: f64) -> String {
    let s = if bytes_per_sec.is_finite() && bytes_per_sec > 0.0 {
        bytes_per_sec
    } else {
        0.0
    };

    if s > 0.1 * GIB {
        format!("{:.1} GB/s", round_half_up(s / GIB, 1))
    } else if s > 0.1 * MIB {
        format!("{:.1} MB/s", round_half_up(s / MIB, 1))
    } else {
        format!("{:.1} kb/s", round_half_up(s / KIB, 1))
    }
}
