//! Time formatting helpers shared by the log, the archive views and the CLI.

use chrono::{DateTime, Local, Utc};

/// Format used for the `ts` column of the event log.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats seconds as `HH:MM:SS`.
///
/// Negative values are treated as zero. The value is rounded to the nearest
/// whole second; hours are not wrapped at 24.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn hms(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Truncates seconds to a non-negative whole number.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn whole_secs(secs: f64) -> u64 {
    secs.max(0.0).trunc() as u64
}

/// Formats an instant for the event log, in local time.
pub fn log_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format(LOG_TIMESTAMP_FORMAT)
        .to_string()
}

/// Name given to sessions started without one.
pub fn default_session_name(at: DateTime<Utc>) -> String {
    format!(
        "Session {}",
        at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    )
}

/// Signed number of seconds from `earlier` to `later`.
#[allow(clippy::cast_precision_loss)]
pub fn secs_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    delta.num_nanoseconds().map_or_else(
        || delta.num_milliseconds() as f64 / 1_000.0,
        |ns| ns as f64 / 1_000_000_000.0,
    )
}
