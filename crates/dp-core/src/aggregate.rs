//! Session archive aggregation.
//!
//! Two views over finished sessions:
//!
//! - [`daily_totals`]: total active time per calendar day. Each session is
//!   counted on the day it started, even if it ran past midnight.
//! - [`bins_for_day`]: active time in fixed-width slots of one day. Only a
//!   session's bounds and total are known, so its total is spread uniformly
//!   over its wall-clock span and each slot receives its share of the overlap.
//!
//! Both are approximations of the timer's true sub-intervals and are kept that
//! way on purpose. All calendar arithmetic happens in the supplied time zone.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::Serialize;

use crate::format::secs_between;
use crate::record::SessionRecord;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Longest span accepted when parsing, about a century.
pub const MAX_SPAN_DAYS: u32 = 36_525;

/// How far back daily totals reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    /// The last `n` days, today included.
    Days(u32),
    /// From the day of the earliest session.
    All,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(n) => write!(f, "last {n} days"),
            Self::All => write!(f, "all"),
        }
    }
}

impl FromStr for Span {
    type Err = InvalidSpan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match s.parse::<u32>() {
            Ok(n) if (1..=MAX_SPAN_DAYS).contains(&n) => Ok(Self::Days(n)),
            _ => Err(InvalidSpan(s.to_string())),
        }
    }
}

/// Error for span strings that are neither `all` nor a positive day count.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid span: {0} (expected 1 to 36525 days or 'all')")]
pub struct InvalidSpan(String);

/// Active time for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub total_sec: f64,
}

/// Active time for one slot of a day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBin {
    pub start: DateTime<Utc>,
    pub seconds: f64,
    /// `HH` for hourly bins, `HH:MM` otherwise.
    pub label: String,
}

/// First instant of `day` in `tz`.
///
/// Ambiguous midnights resolve to the earlier instant. A midnight skipped by
/// a DST transition falls back to 01:00.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .map_or_else(|| midnight.and_utc(), |dt| dt.with_timezone(&Utc))
}

/// Calendar day containing `at` in `tz`.
pub fn day_of<Tz: TimeZone>(tz: &Tz, at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Sums session totals per start day, one entry per day up to `today`.
///
/// Days without sessions are present with zero. Returns nothing when there
/// are no sessions at all or when the span reaches past the calendar range.
pub fn daily_totals<Tz: TimeZone>(
    sessions: &[SessionRecord],
    span: Span,
    today: NaiveDate,
    tz: &Tz,
) -> Vec<DailyStat> {
    if sessions.is_empty() {
        return Vec::new();
    }

    let start_day = match span {
        Span::Days(n) => today.checked_sub_days(Days::new(u64::from(n.max(1)) - 1)),
        Span::All => sessions.iter().map(|s| day_of(tz, s.started_at)).min(),
    };
    let Some(start_day) = start_day else {
        return Vec::new();
    };
    if start_day > today {
        return Vec::new();
    }

    let mut by_day: HashMap<NaiveDate, f64> = HashMap::new();
    for session in sessions {
        *by_day.entry(day_of(tz, session.started_at)).or_default() += session.total_sec;
    }

    start_day
        .iter_days()
        .take_while(|date| *date <= today)
        .map(|date| DailyStat {
            date,
            total_sec: by_day.get(&date).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Spreads session time over `step_minutes`-wide slots of `day`.
///
/// Returns `1440 / step_minutes` bins starting at local midnight, or nothing
/// when the step does not evenly divide a day.
pub fn bins_for_day<Tz: TimeZone>(
    sessions: &[SessionRecord],
    day: NaiveDate,
    step_minutes: u32,
    tz: &Tz,
) -> Vec<TimeBin> {
    if step_minutes == 0 || MINUTES_PER_DAY % step_minutes != 0 {
        return Vec::new();
    }
    let Some(next_day) = day.succ_opt() else {
        return Vec::new();
    };

    let day_start = start_of_day(tz, day);
    let day_end = start_of_day(tz, next_day);
    let step = Duration::minutes(i64::from(step_minutes));
    let bin_count = MINUTES_PER_DAY / step_minutes;

    let mut bins: Vec<TimeBin> = (0..bin_count)
        .map(|i| {
            let start = day_start + step * i32::try_from(i).unwrap_or(i32::MAX);
            let local = start.with_timezone(tz);
            let label = if step_minutes == 60 {
                format!("{:02}", local.hour())
            } else {
                format!("{:02}:{:02}", local.hour(), local.minute())
            };
            TimeBin {
                start,
                seconds: 0.0,
                label,
            }
        })
        .collect();

    for session in sessions {
        let span_start = session.started_at.max(day_start);
        let span_end = session.ended_at.min(day_end);
        let overlap = secs_between(span_end, span_start);
        if overlap <= 0.0 || session.total_sec <= 0.0 {
            continue;
        }

        let wall = session.span_secs();
        let rate = session.total_sec / if wall > 0.0 { wall } else { overlap };

        for bin in &mut bins {
            let bin_end = bin.start + step;
            let shared = secs_between(bin_end.min(span_end), bin.start.max(span_start));
            if shared > 0.0 {
                bin.seconds += rate * shared;
            }
        }
    }

    bins
}

/// Sum of a daily series.
pub fn sum_daily(stats: &[DailyStat]) -> f64 {
    stats.iter().map(|s| s.total_sec).sum()
}

/// Mean per day of a daily series; zero for an empty series.
#[allow(clippy::cast_precision_loss)]
pub fn average_daily(stats: &[DailyStat]) -> f64 {
    sum_daily(stats) / stats.len().max(1) as f64
}

/// Sum of a bin series.
pub fn sum_bins(bins: &[TimeBin]) -> f64 {
    bins.iter().map(|b| b.seconds).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn session(start: DateTime<Utc>, end: DateTime<Utc>, total_sec: f64) -> SessionRecord {
        SessionRecord::new("s", start, end, total_sec)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn span_parses() {
        assert_eq!("7".parse::<Span>().unwrap(), Span::Days(7));
        assert_eq!("ALL".parse::<Span>().unwrap(), Span::All);
        assert!("0".parse::<Span>().is_err());
        assert!("week".parse::<Span>().is_err());
        assert_eq!("36525".parse::<Span>().unwrap(), Span::Days(MAX_SPAN_DAYS));
        assert!("36526".parse::<Span>().is_err());
        assert!("4294967295".parse::<Span>().is_err());
    }

    #[test]
    fn span_past_calendar_range_is_empty() {
        let sessions = vec![session(utc(2024, 1, 8, 9, 0), utc(2024, 1, 8, 10, 0), 1800.0)];
        let stats = daily_totals(&sessions, Span::Days(u32::MAX), date(2024, 1, 10), &Utc);
        assert!(stats.is_empty());
    }

    #[test]
    fn empty_archive_has_no_totals() {
        assert!(daily_totals(&[], Span::Days(7), date(2024, 1, 10), &Utc).is_empty());
    }

    #[test]
    fn seven_day_span_is_always_seven_entries() {
        let sessions = vec![session(utc(2024, 1, 8, 9, 0), utc(2024, 1, 8, 10, 0), 1800.0)];
        let stats = daily_totals(&sessions, Span::Days(7), date(2024, 1, 10), &Utc);

        assert_eq!(stats.len(), 7);
        assert_eq!(stats[0].date, date(2024, 1, 4));
        assert_eq!(stats[6].date, date(2024, 1, 10));
        assert!(approx(stats[4].total_sec, 1800.0));
        assert!(approx(sum_daily(&stats), 1800.0));
    }

    #[test]
    fn sessions_are_bucketed_by_start_day() {
        let sessions = vec![
            session(utc(2024, 1, 9, 23, 0), utc(2024, 1, 10, 2, 0), 3600.0),
            session(utc(2024, 1, 10, 9, 0), utc(2024, 1, 10, 10, 0), 600.0),
            session(utc(2024, 1, 10, 11, 0), utc(2024, 1, 10, 12, 0), 900.0),
        ];
        let stats = daily_totals(&sessions, Span::Days(2), date(2024, 1, 10), &Utc);

        assert_eq!(stats.len(), 2);
        assert!(approx(stats[0].total_sec, 3600.0));
        assert!(approx(stats[1].total_sec, 1500.0));
    }

    #[test]
    fn all_span_starts_at_earliest_session() {
        let sessions = vec![
            session(utc(2024, 1, 10, 9, 0), utc(2024, 1, 10, 10, 0), 60.0),
            session(utc(2024, 1, 1, 9, 0), utc(2024, 1, 1, 10, 0), 120.0),
        ];
        let stats = daily_totals(&sessions, Span::All, date(2024, 1, 10), &Utc);

        assert_eq!(stats.len(), 10);
        assert_eq!(stats[0].date, date(2024, 1, 1));
        assert!(approx(stats[0].total_sec, 120.0));
        assert!(approx(average_daily(&stats), 18.0));
    }

    #[test]
    fn all_span_with_future_sessions_is_empty() {
        let sessions = vec![session(utc(2024, 2, 1, 9, 0), utc(2024, 2, 1, 10, 0), 60.0)];
        assert!(daily_totals(&sessions, Span::All, date(2024, 1, 10), &Utc).is_empty());
    }

    #[test]
    fn days_follow_the_given_zone() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let sessions = vec![session(utc(2024, 1, 9, 22, 0), utc(2024, 1, 9, 23, 0), 60.0)];
        let stats = daily_totals(&sessions, Span::Days(2), date(2024, 1, 10), &tz);

        assert!(approx(stats[0].total_sec, 0.0));
        assert!(approx(stats[1].total_sec, 60.0));
    }

    #[test]
    fn bins_cover_the_day_with_labels() {
        let hourly = bins_for_day(&[], date(2024, 1, 10), 60, &Utc);
        assert_eq!(hourly.len(), 24);
        assert_eq!(hourly[0].label, "00");
        assert_eq!(hourly[23].label, "23");
        assert_eq!(hourly[0].start, utc(2024, 1, 10, 0, 0));

        let quarter = bins_for_day(&[], date(2024, 1, 10), 15, &Utc);
        assert_eq!(quarter.len(), 96);
        assert_eq!(quarter[1].label, "00:15");
        assert_eq!(quarter[95].label, "23:45");
    }

    #[test]
    fn bad_steps_yield_nothing() {
        assert!(bins_for_day(&[], date(2024, 1, 10), 0, &Utc).is_empty());
        assert!(bins_for_day(&[], date(2024, 1, 10), 7, &Utc).is_empty());
    }

    #[test]
    fn bins_conserve_a_session_inside_the_day() {
        let sessions = vec![session(utc(2024, 1, 10, 9, 10), utc(2024, 1, 10, 11, 40), 5400.0)];
        let bins = bins_for_day(&sessions, date(2024, 1, 10), 15, &Utc);

        assert!(approx(sum_bins(&bins), 5400.0));
        // 9:00-9:15 holds 5 of the 150 minutes.
        assert!(approx(bins[36].seconds, 5400.0 * 5.0 / 150.0));
        assert!(approx(bins[37].seconds, 5400.0 * 15.0 / 150.0));
        assert!(approx(bins[35].seconds, 0.0));
    }

    #[test]
    fn bins_only_count_the_part_inside_the_day() {
        let sessions = vec![session(utc(2024, 1, 9, 23, 0), utc(2024, 1, 10, 1, 0), 3600.0)];
        let bins = bins_for_day(&sessions, date(2024, 1, 10), 60, &Utc);

        assert!(approx(sum_bins(&bins), 1800.0));
        assert!(approx(bins[0].seconds, 1800.0));
    }

    #[test]
    fn zero_length_and_zero_total_sessions_are_skipped() {
        let at = utc(2024, 1, 10, 9, 0);
        let sessions = vec![session(at, at, 30.0), session(at, utc(2024, 1, 10, 10, 0), 0.0)];
        let bins = bins_for_day(&sessions, date(2024, 1, 10), 60, &Utc);
        assert!(approx(sum_bins(&bins), 0.0));
    }

    #[test]
    fn start_of_day_uses_zone_midnight() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(start_of_day(&tz, date(2024, 1, 10)), utc(2024, 1, 10, 5, 0));
    }
}
