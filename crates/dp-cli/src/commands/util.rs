//! Shared utilities for CLI commands.

use std::fs::{self, File};
use std::sync::LazyLock;

use anyhow::Context;
use chrono::{Days, NaiveDate};
use dp_store::DataPaths;
use fs2::FileExt;
use regex::Regex;

/// Pre-compiled regex for relative day parsing.
static RELATIVE_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bound for relative day parsing (~1000 years).
const MAX_RELATIVE_DAYS: u64 = 1000 * 365;

/// Parse a calendar day relative to `today`.
///
/// Supports:
/// - Keywords: "today", "yesterday"
/// - Calendar dates: "2026-01-15"
/// - Relative: "3 days ago", "1 week ago"
pub fn parse_day(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    match s {
        "today" => return Ok(today),
        "yesterday" => return back(today, 1),
        _ => {}
    }

    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(day);
    }

    let Some(caps) = RELATIVE_DAY_RE.captures(s) else {
        anyhow::bail!(
            "Invalid day: {s}. Use YYYY-MM-DD, 'today', 'yesterday' or relative (e.g., '3 days ago')"
        );
    };

    let n: u64 = caps[1]
        .parse()
        .context("failed to parse number in relative day")?;
    let days = if &caps[2] == "week" {
        n.saturating_mul(7)
    } else {
        n
    };
    if days > MAX_RELATIVE_DAYS {
        anyhow::bail!("Relative day value too large: {n} {}", &caps[2]);
    }
    back(today, days)
}

fn back(today: NaiveDate, days: u64) -> anyhow::Result<NaiveDate> {
    today
        .checked_sub_days(Days::new(days))
        .with_context(|| format!("{days} days before {today} is out of range"))
}

/// Creates the data directory and takes its single-writer lock.
///
/// Every command that changes the log or the archive holds this for its
/// whole run. The lock is released when the returned file is dropped.
pub fn lock_data_dir(paths: &DataPaths) -> anyhow::Result<File> {
    fs::create_dir_all(paths.dir())
        .with_context(|| format!("failed to create {}", paths.dir().display()))?;
    let lock_file = File::create(paths.lock_file()).context("failed to create lock file")?;
    lock_file
        .try_lock_exclusive()
        .context("another dp process is using this data directory")?;
    Ok(lock_file)
}

/// Short human duration, e.g. `2h 05m` or `7m`.
pub fn format_duration(secs: f64) -> String {
    let total_minutes = dp_core::format::whole_secs(secs) / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}

/// Generates a 10-character progress bar.
/// Non-zero values below 5% of max still get a single block.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn progress_bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value / max;
    let filled = if ratio < 0.05 && value > 0.0 {
        1
    } else {
        (ratio * 10.0).round().clamp(0.0, 10.0) as usize
    };

    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// IANA name of the local time zone, or "UTC" when it cannot be determined.
pub fn local_timezone_name() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "could not determine local time zone");
        "UTC".to_string()
    })
}
