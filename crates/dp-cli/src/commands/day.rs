//! Day command: how one day's tracked time is spread across its hours.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;

use dp_core::aggregate::sum_bins;
use dp_core::{SessionRecord, TimeBin, bins_for_day};
use dp_store::SessionArchive;

use super::util::{format_duration, local_timezone_name, parse_day, progress_bar};
use crate::Config;

const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub timezone: String,
    pub step_minutes: u32,
    pub bins: Vec<TimeBin>,
    pub total_sec: f64,
}

pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    date: &str,
    step_minutes: u32,
    json: bool,
) -> Result<()> {
    if step_minutes == 0 || MINUTES_PER_DAY % step_minutes != 0 {
        anyhow::bail!("step must evenly divide a day, got {step_minutes} minutes");
    }
    let day = parse_day(date, Local::now().date_naive())?;

    let archive = SessionArchive::load(config.paths().archive_file());
    let report = build_report(
        archive.sessions(),
        day,
        step_minutes,
        &Local,
        local_timezone_name(),
    );

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_report(&report))?;
    }
    Ok(())
}

pub fn build_report<Tz: TimeZone>(
    sessions: &[SessionRecord],
    day: NaiveDate,
    step_minutes: u32,
    tz: &Tz,
    timezone: String,
) -> DayReport {
    let bins = bins_for_day(sessions, day, step_minutes, tz);
    DayReport {
        date: day,
        timezone,
        step_minutes,
        total_sec: sum_bins(&bins),
        bins,
    }
}

/// Renders the non-empty bins with a bar scaled to the bin width.
pub fn format_report(report: &DayReport) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{} ({})",
        report.date.format("%a %Y-%m-%d"),
        report.timezone
    );

    let busy: Vec<&TimeBin> = report.bins.iter().filter(|b| b.seconds > 0.0).collect();
    if busy.is_empty() {
        let _ = writeln!(output, "No activity this day.");
        return output;
    }

    let width = f64::from(report.step_minutes) * 60.0;
    let _ = writeln!(output);
    for bin in busy {
        let _ = writeln!(
            output,
            "{:>5}  {}  {}",
            bin.label,
            progress_bar(bin.seconds, width),
            format_duration(bin.seconds)
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Total: {}", format_duration(report.total_sec));
    output
}
