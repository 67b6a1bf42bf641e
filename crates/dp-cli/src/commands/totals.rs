//! Totals command: active time per calendar day.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;

use dp_core::aggregate::{average_daily, sum_daily};
use dp_core::{DailyStat, SessionRecord, Span, daily_totals};
use dp_store::SessionArchive;

use super::util::{format_duration, local_timezone_name, progress_bar};
use crate::Config;

/// Daily totals with their summary figures.
#[derive(Debug, Serialize)]
pub struct TotalsReport {
    pub span: String,
    pub timezone: String,
    pub days: Vec<DailyStat>,
    pub total_sec: f64,
    pub average_sec: f64,
}

pub fn run<W: Write>(writer: &mut W, config: &Config, span: Span, json: bool) -> Result<()> {
    let archive = SessionArchive::load(config.paths().archive_file());
    let today = Local::now().date_naive();
    let report = build_report(
        archive.sessions(),
        span,
        today,
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
    span: Span,
    today: NaiveDate,
    tz: &Tz,
    timezone: String,
) -> TotalsReport {
    let days = daily_totals(sessions, span, today, tz);
    TotalsReport {
        span: span.to_string(),
        timezone,
        total_sec: sum_daily(&days),
        average_sec: average_daily(&days),
        days,
    }
}

pub fn format_report(report: &TotalsReport) -> String {
    if report.days.is_empty() {
        return "No sessions recorded.\n".to_string();
    }

    let max = report
        .days
        .iter()
        .map(|d| d.total_sec)
        .fold(0.0_f64, f64::max);

    let mut output = String::new();
    let _ = writeln!(output, "Daily totals ({}, {})", report.span, report.timezone);
    let _ = writeln!(output);
    for day in &report.days {
        let _ = writeln!(
            output,
            "{}  {}  {}",
            day.date.format("%a %Y-%m-%d"),
            progress_bar(day.total_sec, max),
            format_duration(day.total_sec)
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Total: {}", format_duration(report.total_sec));
    let _ = writeln!(output, "Avg/day: {}", format_duration(report.average_sec));
    output
}
