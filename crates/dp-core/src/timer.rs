//! Presence-driven session timer.
//!
//! Turns a noisy boolean presence signal into counted active time. A session
//! runs from [`PresenceTimer::start`] to [`PresenceTimer::stop`] and is made
//! of sub-intervals: an interval opens once presence has been continuously
//! true for `start_grace_secs`, and closes once presence has been false for
//! `stop_grace_secs`. A closed interval ends at the last present sample, so
//! the grace gap itself is never counted.
//!
//! # Collaborators
//!
//! The timer owns an [`EventSink`] (the event log) handed to it at
//! construction. The session archive is borrowed per call through
//! [`SessionSink`], so the timer never owns it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event_kind::EventKind;
use crate::format::{default_session_name, secs_between};
use crate::record::SessionRecord;

/// Heartbeats are never emitted more often than this.
pub const MIN_HEARTBEAT_SECS: f64 = 5.0;

/// Configuration for the presence timer.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerConfig {
    /// Continuous presence required before an interval opens.
    /// Default: 0 (open on the first present sample).
    pub start_grace_secs: f64,

    /// Continuous absence required before an open interval closes.
    /// Default: 2.5.
    pub stop_grace_secs: f64,

    /// Minimum spacing of heartbeat events, floored at [`MIN_HEARTBEAT_SECS`].
    /// Default: 60.
    pub heartbeat_interval_secs: f64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            start_grace_secs: 0.0,
            stop_grace_secs: 2.5,
            heartbeat_interval_secs: 60.0,
        }
    }
}

/// One row destined for the event log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// When the event was emitted.
    pub at: DateTime<Utc>,
    pub kind: EventKind,
    pub session: String,
    /// Session total at the time of the event.
    pub total_sec: f64,
    /// Length of the interval just closed; zero for non-`CHUNK` events.
    pub duration_sec: f64,
}

/// Receives log entries from the timer.
///
/// Implementations must not fail loudly: an entry that cannot be stored is
/// dropped.
pub trait EventSink {
    /// Appends one entry.
    fn append(&mut self, entry: &LogEntry);

    /// Flushes and releases any underlying resources. A later `append` must
    /// reopen them.
    fn close(&mut self);
}

/// Receives completed sessions from the timer.
pub trait SessionSink {
    fn add(&mut self, record: SessionRecord);
}

/// In-memory sink, handy for embedding and tests.
impl EventSink for Vec<LogEntry> {
    fn append(&mut self, entry: &LogEntry) {
        self.push(entry.clone());
    }

    fn close(&mut self) {}
}

/// In-memory sink keeping records most-recent-first.
impl SessionSink for Vec<SessionRecord> {
    fn add(&mut self, record: SessionRecord) {
        self.insert(0, record);
    }
}

/// Read-only view of the live tracker state, for polling displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerSnapshot {
    pub active: bool,
    pub session_name: String,
    pub face_present: bool,
    /// Seconds in the currently open interval, zero when none is open.
    pub current_sec: f64,
    /// Seconds in the closed intervals of this session.
    pub total_sec: f64,
}

impl TrackerSnapshot {
    /// Closed plus open time.
    pub fn live_total_sec(&self) -> f64 {
        self.total_sec + self.current_sec
    }
}

/// The session timer state machine.
#[derive(Debug)]
pub struct PresenceTimer<L> {
    config: TimerConfig,
    sink: L,

    active: bool,
    session_name: String,
    face_present: bool,
    current_sec: f64,
    total_sec: f64,

    /// When `start` was called for the running session.
    absolute_start: Option<DateTime<Utc>>,
    /// Start of the open interval, if any.
    interval_start: Option<DateTime<Utc>>,
    /// Start of the current run of present samples.
    present_since: Option<DateTime<Utc>>,
    /// Last instant presence was seen.
    last_present_at: Option<DateTime<Utc>>,
    last_heartbeat: Option<DateTime<Utc>>,
}

impl<L: EventSink> PresenceTimer<L> {
    /// Creates an idle timer writing to `sink`.
    pub fn new(config: TimerConfig, sink: L) -> Self {
        Self {
            config,
            sink,
            active: false,
            session_name: String::new(),
            face_present: false,
            current_sec: 0.0,
            total_sec: 0.0,
            absolute_start: None,
            interval_start: None,
            present_since: None,
            last_present_at: None,
            last_heartbeat: None,
        }
    }

    pub const fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub const fn sink(&self) -> &L {
        &self.sink
    }

    pub const fn sink_mut(&mut self) -> &mut L {
        &mut self.sink
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Renames the session. Takes effect for subsequent log rows and for the
    /// record built on stop.
    pub fn set_session_name(&mut self, name: impl Into<String>) {
        self.session_name = name.into();
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            active: self.active,
            session_name: self.session_name.clone(),
            face_present: self.face_present,
            current_sec: self.current_sec,
            total_sec: self.total_sec,
        }
    }

    /// Starts a session. No-op while one is already running.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.active {
            return;
        }
        if self.session_name.trim().is_empty() {
            self.session_name = default_session_name(now);
        }

        self.active = true;
        self.absolute_start = Some(now);
        self.interval_start = None;
        self.present_since = None;
        self.last_present_at = None;
        self.total_sec = 0.0;
        self.current_sec = 0.0;

        tracing::info!(session = %self.session_name, "session started");
        self.emit(EventKind::Start, now, 0.0, 0.0);
    }

    /// Feeds one presence sample.
    ///
    /// Called on every periodic tick and on every raw change of the signal.
    /// Samples while idle only update the presence bookkeeping.
    pub fn sample(&mut self, present: bool, now: DateTime<Utc>) {
        self.face_present = present;

        if present {
            self.present_since.get_or_insert(now);
            self.last_present_at = Some(now);
        } else {
            self.present_since = None;
        }

        if !self.active {
            self.current_sec = 0.0;
            return;
        }

        if self.interval_start.is_none() && present {
            if let Some(since) = self.present_since {
                if secs_between(now, since) >= self.config.start_grace_secs {
                    tracing::debug!(session = %self.session_name, "interval opened");
                    self.interval_start = Some(now);
                }
            }
        }

        if !present && self.interval_start.is_some() {
            if let Some(last) = self.last_present_at {
                if secs_between(now, last) >= self.config.stop_grace_secs {
                    self.close_interval(last, now);
                }
            }
        }

        self.current_sec = self
            .interval_start
            .map_or(0.0, |start| secs_between(now, start).max(0.0));
    }

    /// Stops the running session and hands its record to `archive`.
    ///
    /// `is_final` marks a stop caused by process exit: the terminal row is
    /// `STOP_APP` and the sink is closed afterwards. No-op while idle.
    pub fn stop<A: SessionSink + ?Sized>(
        &mut self,
        archive: &mut A,
        is_final: bool,
        now: DateTime<Utc>,
    ) {
        if !self.active {
            return;
        }

        if self.interval_start.is_some() {
            // An absent tail still inside the grace window is not counted.
            let end = if self.face_present {
                now
            } else {
                self.last_present_at.unwrap_or(now)
            };
            self.close_interval(end, now);
        }

        self.active = false;

        if let Some(started_at) = self.absolute_start.take() {
            let record =
                SessionRecord::new(self.session_name.clone(), started_at, now, self.total_sec);
            tracing::info!(
                session = %record.name,
                id = %record.id,
                total_sec = record.total_sec,
                "session stopped"
            );
            archive.add(record);
        }

        let kind = if is_final {
            EventKind::StopApp
        } else {
            EventKind::Stop
        };
        self.emit(kind, now, self.total_sec, 0.0);

        if is_final {
            self.sink.close();
        }
    }

    /// Must run on every process-exit path.
    pub fn on_terminate<A: SessionSink + ?Sized>(&mut self, archive: &mut A, now: DateTime<Utc>) {
        if self.active {
            self.stop(archive, true, now);
        } else {
            self.sink.close();
        }
    }

    /// Emits a `HEARTBEAT` row if enough time passed since the last one.
    ///
    /// Runs whether or not a session is active. Returns whether a row was
    /// emitted.
    pub fn heartbeat(&mut self, now: DateTime<Utc>) -> bool {
        let interval = self.config.heartbeat_interval_secs.max(MIN_HEARTBEAT_SECS);
        if let Some(last) = self.last_heartbeat {
            if secs_between(now, last) < interval {
                return false;
            }
        }

        let total = self.total_sec + self.current_sec;
        self.emit(EventKind::Heartbeat, now, total, 0.0);
        self.last_heartbeat = Some(now);
        true
    }

    /// Clears the name and counters shown to the user. Used after a wipe.
    pub fn reset_display(&mut self) {
        self.session_name.clear();
        self.current_sec = 0.0;
        self.total_sec = 0.0;
    }

    fn close_interval(&mut self, end: DateTime<Utc>, now: DateTime<Utc>) {
        let Some(start) = self.interval_start.take() else {
            return;
        };
        let duration = secs_between(end, start).max(0.0);
        self.total_sec += duration;
        self.current_sec = 0.0;

        tracing::debug!(
            session = %self.session_name,
            duration_sec = duration,
            total_sec = self.total_sec,
            "interval closed"
        );

        self.emit(EventKind::Chunk, now, self.total_sec, duration);
    }

    fn emit(&mut self, kind: EventKind, now: DateTime<Utc>, total_sec: f64, duration_sec: f64) {
        self.sink.append(&LogEntry {
            at: now,
            kind,
            session: self.session_name.clone(),
            total_sec,
            duration_sec,
        });
    }
}
