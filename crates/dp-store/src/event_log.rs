//! Append-only CSV event log.
//!
//! Every timer event becomes one row:
//!
//! ```text
//! ts,event,session,total_sec,total_hms,duration_sec,duration_hms
//! 2024-01-02 09:00:00,START,"My Session",0,00:00:00,0,00:00:00
//! ```
//!
//! The session column is always quoted with inner quotes doubled, so names
//! containing commas or newlines stay a single field.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use dp_core::format::{LOG_TIMESTAMP_FORMAT, hms, log_timestamp, whole_secs};
use dp_core::{EventKind, EventSink, LogEntry};

use crate::StoreError;

/// Header row written once at the top of a new log.
pub const LOG_HEADER: &str = "ts,event,session,total_sec,total_hms,duration_sec,duration_hms";

const COLUMN_COUNT: usize = 7;

/// Lazily opened writer for the event log.
///
/// The file is opened on the first append and stays open until [`close`]
/// (or drop). Appending after `close` opens it again.
///
/// [`close`]: EventSink::close
#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    file: Option<File>,
}

impl EventLog {
    /// Creates a log writing to `path`. Nothing is touched on disk yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn open(&self) -> Result<File, StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::io("create directory", parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io("open", &self.path, e))?;

        let len = file
            .metadata()
            .map_err(|e| StoreError::io("inspect", &self.path, e))?
            .len();
        if len == 0 {
            writeln!(file, "{LOG_HEADER}").map_err(|e| StoreError::io("write", &self.path, e))?;
            tracing::debug!(path = %self.path.display(), "created event log");
        }

        Ok(file)
    }

    fn try_append(&mut self, entry: &LogEntry) -> Result<(), StoreError> {
        let mut file = match self.file.take() {
            Some(file) => file,
            None => self.open()?,
        };

        let line = format_line(entry);
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| StoreError::io("write", &self.path, e))?;

        self.file = Some(file);
        Ok(())
    }
}

impl EventSink for EventLog {
    fn append(&mut self, entry: &LogEntry) {
        if let Err(err) = self.try_append(entry) {
            tracing::warn!(error = %err, kind = %entry.kind, "dropping event log entry");
        }
    }

    fn close(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(err) = file.sync_all() {
                tracing::warn!(
                    error = %err,
                    path = %self.path.display(),
                    "failed to sync event log"
                );
            }
        }
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        self.close();
    }
}

/// Renders one log row, newline included.
pub fn format_line(entry: &LogEntry) -> String {
    format!(
        "{},{},{},{},{},{},{}\n",
        log_timestamp(entry.at),
        entry.kind,
        quote(&entry.session),
        whole_secs(entry.total_sec),
        hms(entry.total_sec),
        whole_secs(entry.duration_sec),
        hms(entry.duration_sec),
    )
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// A row read back from the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedEvent {
    /// Local wall-clock time of the row.
    pub ts: NaiveDateTime,
    pub kind: EventKind,
    pub session: String,
    pub total_sec: u64,
    pub total_hms: String,
    pub duration_sec: u64,
    pub duration_hms: String,
}

/// Reads every row of the log at `path`.
///
/// A missing file is an empty log. The header row is skipped, and so are
/// malformed rows such as a line cut short by a crash mid-write.
pub fn read_log(path: &Path) -> Result<Vec<LoggedEvent>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io("read", path, e)),
    };

    let events = split_records(&content)
        .into_iter()
        .enumerate()
        .filter(|(index, fields)| !(*index == 0 && fields.join(",") == LOG_HEADER))
        .filter_map(|(index, fields)| match parse_record(index + 1, &fields) {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "skipping log record");
                None
            }
        })
        .collect();
    Ok(events)
}

fn parse_record(record: usize, fields: &[String]) -> Result<LoggedEvent, StoreError> {
    let malformed = |message: String| StoreError::MalformedLog { record, message };

    if fields.len() != COLUMN_COUNT {
        return Err(malformed(format!(
            "expected {COLUMN_COUNT} fields, got {}",
            fields.len()
        )));
    }

    let ts = NaiveDateTime::parse_from_str(&fields[0], LOG_TIMESTAMP_FORMAT)
        .map_err(|e| malformed(format!("bad timestamp {:?}: {e}", fields[0])))?;
    let kind: EventKind = fields[1].parse().map_err(|e| malformed(format!("{e}")))?;
    let secs = |field: &str| {
        field
            .parse::<u64>()
            .map_err(|e| malformed(format!("bad seconds {field:?}: {e}")))
    };

    Ok(LoggedEvent {
        ts,
        kind,
        session: fields[2].clone(),
        total_sec: secs(&fields[3])?,
        total_hms: fields[4].clone(),
        duration_sec: secs(&fields[5])?,
        duration_hms: fields[6].clone(),
    })
}

/// Splits CSV text into records, honoring quoted fields that contain
/// commas, doubled quotes or line breaks.
fn split_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }
    records
}
