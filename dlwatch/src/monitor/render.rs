//! Status line layouts.
//!
//! Pure formatting: everything here takes already-computed values and returns
//! a line, which keeps the field order testable without a clock.

use crate::resource::{FileDescriptor, LifecycleState, PartState, Resource};
use crate::speed::{format_speed, round_half_up};

/// Placeholder for a file that has not captured an error.
const NO_ERROR: &str = "none";

/// Format a completion ratio with two decimals, ties rounded up.
pub fn format_fraction(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.2}", round_half_up(value, 2))
}

/// First line of a summary: the state and the quality, when known.
pub fn summary_header(resource: &Resource) -> String {
    match resource.quality_info() {
        Some(info) => format!("{} {}", resource.state, info.quality()),
        None => "downloading unknown quality".to_string(),
    }
}

/// `file:<i> - <target> (<average>)`
pub fn summary_line(index: usize, file: &FileDescriptor, average: f64) -> String {
    format!(
        "file:{} - {} ({})",
        index,
        file.target.display(),
        format_speed(average)
    )
}

/// `<STATE> <delay>` header shared by ERROR and RETRYING.
pub fn failure_header(resource: &Resource) -> String {
    format!("{} {}", resource.state, resource.delay.as_secs())
}

/// `file:<i> - <error> delay:<secs>`
pub fn error_line(index: usize, file: &FileDescriptor) -> String {
    format!(
        "file:{} - {} delay:{}",
        index,
        file.error.as_deref().unwrap_or(NO_ERROR),
        file.delay.as_secs()
    )
}

/// `file:<i> - <FILE STATE> <error> delay:<secs>`
pub fn retrying_line(index: usize, file: &FileDescriptor) -> String {
    format!(
        "file:{} - {} {} delay:{}",
        index,
        file.state,
        file.error.as_deref().unwrap_or(NO_ERROR),
        file.delay.as_secs()
    )
}

/// `part#<n>(<fraction>) ` for every part currently downloading.
///
/// Empty for single-stream files. Each entry carries a trailing space so the
/// fragment slots straight into [`downloading_line`].
pub fn part_fragment(file: &FileDescriptor) -> String {
    let Some(parts) = file.parts.as_ref() else {
        return String::new();
    };

    parts
        .iter()
        .filter(|p| p.state == PartState::Downloading)
        .map(|p| format!("part#{}({}) ", p.number, format_fraction(p.fraction())))
        .collect()
}

/// `file:<i> - <STATE> <fraction> <parts>(<current> / <average>)`
pub fn downloading_line(
    index: usize,
    state: LifecycleState,
    file: &FileDescriptor,
    current: f64,
    average: f64,
) -> String {
    format!(
        "file:{} - {} {} {}({} / {})",
        index,
        state,
        format_fraction(file.fraction()),
        part_fragment(file),
        format_speed(current),
        format_speed(average)
    )
}
