//! Core domain logic for the presence tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Timing: turning a noisy presence signal into counted session time
//! - Records: finished sessions as stored in the archive
//! - Aggregation: daily totals and intra-day time bins

pub mod aggregate;
pub mod event_kind;
pub mod format;
pub mod record;
pub mod timer;

pub use aggregate::{DailyStat, Span, TimeBin, bins_for_day, daily_totals};
pub use event_kind::{EventKind, UnknownEventKind};
pub use record::SessionRecord;
pub use timer::{EventSink, LogEntry, PresenceTimer, SessionSink, TimerConfig, TrackerSnapshot};
