//! Shared utility functions.

const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Formats a number of seconds as a human readable duration.
///
/// Uses the largest applicable units (hours, minutes, seconds), skips units
/// that are zero, and always shows seconds when the whole duration is zero.
///
/// ```
/// use relay_common::format_duration;
///
/// assert_eq!(format_duration(0), "0 seconds");
/// assert_eq!(format_duration(90), "1 minute, 30 seconds");
/// assert_eq!(format_duration(3600), "1 hour");
/// ```
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let secs = seconds % SECONDS_PER_MINUTE;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(pluralize(hours, "hour", "hours"));
    }
    if minutes > 0 {
        parts.push(pluralize(minutes, "minute", "minutes"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(pluralize(secs, "second", "seconds"));
    }
    parts.join(", ")
}

/// Formats a count with the singular or plural unit name.
pub fn pluralize(count: u64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}
