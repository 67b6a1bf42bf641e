//! Log command: tail of the CSV event log.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};

use dp_core::format::LOG_TIMESTAMP_FORMAT;
use dp_store::{LoggedEvent, read_log};

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, limit: usize, json: bool) -> Result<()> {
    let path = config.paths().log_file();
    let events = read_log(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let tail = &events[events.len().saturating_sub(limit)..];

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(tail)?)?;
    } else {
        write!(writer, "{}", format_events(tail))?;
    }
    Ok(())
}

pub fn format_events(events: &[LoggedEvent]) -> String {
    if events.is_empty() {
        return "No events logged.\n".to_string();
    }

    let mut output = String::new();
    for event in events {
        let _ = write!(
            output,
            "{}  {:<9} {}  {}",
            event.ts.format(LOG_TIMESTAMP_FORMAT),
            event.kind.as_str(),
            event.total_hms,
            event.session
        );
        if event.duration_sec > 0 {
            let _ = write!(output, "  (+{})", event.duration_hms);
        }
        let _ = writeln!(output);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use insta::assert_snapshot;

    fn write_log(config: &Config) {
        let path = config.paths().log_file();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            path,
            "ts,event,session,total_sec,total_hms,duration_sec,duration_hms\n\
             2025-01-15 09:00:00,START,Focus,0,00:00:00,0,00:00:00\n\
             2025-01-15 09:00:01,HEARTBEAT,Focus,0,00:00:00,0,00:00:00\n\
             2025-01-15 09:10:05,CHUNK,Focus,604,00:10:04,604,00:10:04\n\
             2025-01-15 09:12:00,STOP,Focus,604,00:10:04,0,00:00:00\n",
        )
        .unwrap();
    }

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            data_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn log_tail_text() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        write_log(&config);

        let mut output = Vec::new();
        run(&mut output, &config, 3, false).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        2025-01-15 09:00:01  HEARTBEAT 00:00:00  Focus
        2025-01-15 09:10:05  CHUNK     00:10:04  Focus  (+00:10:04)
        2025-01-15 09:12:00  STOP      00:10:04  Focus
        ");
    }

    #[test]
    fn log_tail_json_limits_rows() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        write_log(&config);

        let mut output = Vec::new();
        run(&mut output, &config, 1, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["kind"], "STOP");
        assert_eq!(value[0]["total_sec"], 604);
    }

    #[test]
    fn truncated_last_row_is_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        write_log(&config);
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(config.paths().log_file())
            .unwrap();
        std::io::Write::write_all(&mut file, b"2025-01-15 09:13:00,HEART").unwrap();

        let mut output = Vec::new();
        run(&mut output, &config, 1, false).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"2025-01-15 09:12:00  STOP      00:10:04  Focus");
    }

    #[test]
    fn missing_log_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());

        let mut output = Vec::new();
        run(&mut output, &config, 20, false).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "No events logged.\n");
    }
}
