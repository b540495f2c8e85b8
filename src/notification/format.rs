//! Human readable duration and volume formatting for notification messages.
//!
//! Both functions are pure and total. Durations pick the coarsest two-unit
//! representation; volumes use binary prefixes (powers of 1024) with
//! truncating division, capped at TB.

use chrono::{DateTime, Utc};

/// Format the elapsed time between two instants.
///
/// An end before start yields a non-positive duration rendered as-is, e.g.
/// "0 sec" or "-30 sec". Division truncates toward zero.
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let duration = end - start;
    if duration.num_minutes() == 0 {
        format!("{} sec", duration.num_seconds())
    } else if duration.num_hours() == 0 {
        format!(
            "{} min {} sec",
            duration.num_minutes(),
            duration.num_seconds() % 60
        )
    } else if duration.num_days() == 0 {
        format!(
            "{} hours {} min",
            duration.num_hours(),
            duration.num_minutes() % 60
        )
    } else {
        format!(
            "{} days {} hours",
            duration.num_days(),
            duration.num_hours() % 24
        )
    }
}

/// Format a byte count with binary prefixes.
///
/// Each step divides by 1024 with integer truncation. Anything at or above
/// 1024^4 keeps dividing but stays in TB.
pub fn format_volume(bytes: u64) -> String {
    let mut value = bytes;
    for unit in ["B", "kB", "MB", "GB"] {
        if value < 1024 {
            return format!("{} {}", value, unit);
        }
        value /= 1024;
    }
    format!("{} TB", value)
}
