//! Watch command: runs the presence timer against samples read from stdin.
//!
//! A reader thread turns stdin lines into [`Input`]s and a Ctrl-C handler
//! injects [`Input::Shutdown`]. The main thread owns the timer and wakes at
//! least once per tick so grace periods elapse even when no input arrives.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use dp_core::format::hms;
use dp_core::{PresenceTimer, TrackerSnapshot};
use dp_store::{EventLog, SessionArchive, wipe_all_data};

use super::util::lock_data_dir;
use super::wipe::format_outcome;
use crate::Config;

/// One message for the timer thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Presence(bool),
    Start,
    Stop,
    Rename(String),
    Wipe,
    Shutdown,
}

/// Parses one stdin line. Blank and unrecognized lines give `None`.
pub fn parse_line(line: &str) -> Option<Input> {
    let line = line.trim();
    if let Some(name) = line.strip_prefix("name ") {
        let name = name.trim();
        return (!name.is_empty()).then(|| Input::Rename(name.to_string()));
    }

    match line.to_ascii_lowercase().as_str() {
        "1" | "true" | "present" | "yes" => Some(Input::Presence(true)),
        "0" | "false" | "absent" | "no" => Some(Input::Presence(false)),
        "start" => Some(Input::Start),
        "stop" => Some(Input::Stop),
        "wipe" => Some(Input::Wipe),
        "quit" | "exit" => Some(Input::Shutdown),
        _ => None,
    }
}

pub fn run(config: &Config, name: Option<String>, autostart: bool) -> Result<()> {
    let paths = config.paths();
    let lock_file = lock_data_dir(&paths)?;

    let mut timer = PresenceTimer::new(config.timer_config(), EventLog::new(paths.log_file()));
    let mut archive = SessionArchive::load(paths.archive_file());
    if let Some(name) = name {
        timer.set_session_name(name);
    }

    let (sender, receiver) = mpsc::channel();

    let stdin_sender = sender.clone();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_line(&line) {
                Some(input) => {
                    if stdin_sender.send(input).is_err() {
                        return;
                    }
                }
                None if line.trim().is_empty() => {}
                None => tracing::warn!(line = %line, "ignoring unrecognized input"),
            }
        }
        tracing::debug!("stdin closed");
        let _ = stdin_sender.send(Input::Shutdown);
    });

    ctrlc::set_handler(move || {
        tracing::info!("interrupt received, shutting down");
        if let Err(e) = sender.send(Input::Shutdown) {
            tracing::error!(error = %e, "failed to send shutdown");
        }
    })
    .context("failed to install Ctrl-C handler")?;

    drive(
        io::stdout(),
        &receiver,
        &mut timer,
        &mut archive,
        config.tick(),
        autostart,
        Utc::now,
    );

    drop(lock_file);
    Ok(())
}

/// Runs the timer loop until shutdown, then terminates the timer.
///
/// Every wake-up, whether from input or from the tick, samples the last known
/// presence and gives the heartbeat a chance. A status line is written
/// whenever its text changes. `clock` is read once per wake-up.
pub fn drive<W, C>(
    writer: W,
    inputs: &Receiver<Input>,
    timer: &mut PresenceTimer<EventLog>,
    archive: &mut SessionArchive,
    tick: Duration,
    autostart: bool,
    mut clock: C,
) where
    W: Write,
    C: FnMut() -> DateTime<Utc>,
{
    let mut display = StatusDisplay::new(writer);

    if autostart {
        timer.start(clock());
    }

    let mut present = false;

    let shutdown_at = loop {
        let received = inputs.recv_timeout(tick);
        let now = clock();

        match received {
            Ok(Input::Presence(value)) => {
                present = value;
                timer.sample(present, now);
            }
            Ok(Input::Start) => {
                timer.start(now);
                timer.sample(present, now);
            }
            Ok(Input::Stop) => timer.stop(archive, false, now),
            Ok(Input::Rename(name)) => timer.set_session_name(name),
            Ok(Input::Wipe) => {
                let outcome = wipe_all_data(timer, archive, now);
                display.message(&format_outcome(&outcome));
            }
            Err(RecvTimeoutError::Timeout) => timer.sample(present, now),
            Ok(Input::Shutdown) | Err(RecvTimeoutError::Disconnected) => break now,
        }

        timer.heartbeat(now);
        display.update(&timer.snapshot());
    };

    timer.on_terminate(archive, shutdown_at);
    display.update(&timer.snapshot());
}

/// Writes status lines until the first write error, then goes quiet.
///
/// A closed stdout must not keep the timer from terminating.
struct StatusDisplay<W> {
    writer: W,
    last_line: String,
    broken: bool,
}

impl<W: Write> StatusDisplay<W> {
    const fn new(writer: W) -> Self {
        Self {
            writer,
            last_line: String::new(),
            broken: false,
        }
    }

    fn update(&mut self, snapshot: &TrackerSnapshot) {
        let line = status_line(snapshot);
        if line != self.last_line {
            self.message(&format!("{line}\n"));
            self.last_line = line;
        }
    }

    fn message(&mut self, text: &str) {
        if self.broken {
            return;
        }
        let written = self
            .writer
            .write_all(text.as_bytes())
            .and_then(|()| self.writer.flush());
        if let Err(e) = written {
            tracing::warn!(error = %e, "status output closed");
            self.broken = true;
        }
    }
}

fn status_line(snapshot: &TrackerSnapshot) -> String {
    let state = if snapshot.active { "running" } else { "stopped" };
    let face = if snapshot.face_present {
        "present"
    } else {
        "away"
    };
    let name = if snapshot.session_name.is_empty() {
        "-"
    } else {
        snapshot.session_name.as_str()
    };
    format!(
        "[{state}] {name} | {face} | current {} | total {}",
        hms(snapshot.current_sec),
        hms(snapshot.live_total_sec()),
    )
}
