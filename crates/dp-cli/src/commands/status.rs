//! Status command for showing where data lives and what it holds.

use std::io::Write;

use anyhow::Result;

use dp_core::format::hms;
use dp_store::{SessionArchive, read_log};

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let paths = config.paths();
    let archive = SessionArchive::load(paths.archive_file());

    writeln!(writer, "Desk presence timer status")?;
    writeln!(writer, "Data directory: {}", paths.dir().display())?;

    let log_file = paths.log_file();
    match read_log(&log_file) {
        Ok(events) if events.is_empty() => writeln!(writer, "Event log: empty")?,
        Ok(events) => {
            writeln!(writer, "Event log: {} rows", events.len())?;
            if let Some(last) = events.last() {
                writeln!(writer, "Last event: {} at {}", last.kind, last.ts)?;
            }
        }
        Err(e) => writeln!(writer, "Event log: unreadable ({e})")?,
    }

    if archive.is_empty() {
        writeln!(writer, "No sessions recorded.")?;
        return Ok(());
    }

    let tracked: f64 = archive.sessions().iter().map(|s| s.total_sec).sum();
    writeln!(writer, "Sessions: {}", archive.len())?;
    writeln!(writer, "Tracked: {}", hms(tracked))?;
    if let Some(latest) = archive.sessions().first() {
        writeln!(
            writer,
            "Latest: {} ({})",
            latest.name,
            hms(latest.total_sec)
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone, Utc};
    use dp_core::SessionRecord;
    use insta::assert_snapshot;

    #[test]
    fn status_command_summarizes_archive_and_log() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().join("dp"),
            ..Config::default()
        };
        let paths = config.paths();

        std::fs::create_dir_all(paths.dir()).unwrap();
        std::fs::write(
            paths.log_file(),
            "ts,event,session,total_sec,total_hms,duration_sec,duration_hms\n\
             2025-01-15 09:00:00,START,\"Focus\",0,00:00:00,0,00:00:00\n\
             2025-01-15 09:30:00,STOP,\"Focus\",1500,00:25:00,0,00:00:00\n",
        )
        .unwrap();

        let start = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();
        let mut archive = SessionArchive::load(paths.archive_file());
        archive.add(SessionRecord::new(
            "Warmup",
            start - Duration::hours(2),
            start - Duration::hours(1),
            600.0,
        ));
        archive.add(SessionRecord::new(
            "Focus",
            start,
            start + Duration::minutes(30),
            1500.0,
        ));

        let mut output = Vec::new();
        run(&mut output, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&paths.dir().display().to_string(), "[TEMP]/dp");
        assert_snapshot!(output, @r"
        Desk presence timer status
        Data directory: [TEMP]/dp
        Event log: 2 rows
        Last event: STOP at 2025-01-15 09:30:00
        Sessions: 2
        Tracked: 00:35:00
        Latest: Focus (00:25:00)
        ");
    }

    #[test]
    fn status_command_with_no_data() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            ..Config::default()
        };

        let mut output = Vec::new();
        run(&mut output, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&temp.path().display().to_string(), "[TEMP]");
        assert_snapshot!(output, @r"
        Desk presence timer status
        Data directory: [TEMP]
        Event log: empty
        No sessions recorded.
        ");
    }
}
