//! Sessions commands: list, delete one, delete all.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use uuid::Uuid;

use dp_core::SessionRecord;
use dp_core::format::hms;
use dp_store::SessionArchive;

use super::util::lock_data_dir;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<()> {
    let archive = SessionArchive::load(config.paths().archive_file());

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(archive.sessions())?)?;
    } else {
        write!(writer, "{}", format_sessions(archive.sessions(), local_time))?;
    }
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, config: &Config, id: Uuid) -> Result<()> {
    let paths = config.paths();
    let _lock = lock_data_dir(&paths)?;
    let mut archive = SessionArchive::load(paths.archive_file());
    if !archive.delete(id) {
        anyhow::bail!("no session with id {id}");
    }
    writeln!(writer, "Deleted session {id}")?;
    Ok(())
}

pub fn clear<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let paths = config.paths();
    let _lock = lock_data_dir(&paths)?;
    let mut archive = SessionArchive::load(paths.archive_file());
    let removed = archive.len();
    archive.clear();
    writeln!(writer, "Deleted {removed} session(s)")?;
    Ok(())
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Renders one line per session. `show_time` formats the start instant.
pub fn format_sessions(
    sessions: &[SessionRecord],
    show_time: impl Fn(DateTime<Utc>) -> String,
) -> String {
    use std::fmt::Write;

    if sessions.is_empty() {
        return "No sessions recorded.\n".to_string();
    }

    let mut output = String::new();
    for session in sessions {
        let _ = writeln!(
            output,
            "{}  {}  {}  {}",
            session.id,
            show_time(session.started_at),
            hms(session.total_sec),
            session.name
        );
    }
    output
}
