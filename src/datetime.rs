//! Date/time formatting for listings.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Display pattern for modification times, e.g. `Jan 02, 2006 15:04:05`.
pub const DISPLAY_FORMAT: &str = "%b %d, %Y %H:%M:%S";

/// Format a timestamp for display in UTC.
///
/// The output is locale independent, uses a 24-hour clock and carries no
/// timezone suffix.
pub fn format_time(dt: &DateTime<Utc>) -> String {
    dt.format(DISPLAY_FORMAT).to_string()
}

/// Format a timestamp for display in the given timezone.
///
/// # Arguments
///
/// * `dt` - DateTime in UTC
/// * `timezone` - Timezone name (e.g., "Asia/Tokyo", "UTC")
///
/// Falls back to UTC when the timezone name is unknown.
pub fn format_time_in(dt: &DateTime<Utc>, timezone: &str) -> String {
    match timezone.parse::<Tz>() {
        Ok(tz) => dt.with_timezone(&tz).format(DISPLAY_FORMAT).to_string(),
        Err(_) => format_time(dt),
    }
}
