//! Wipe command: deletes all sessions and the event log.

use std::io::Write;

use anyhow::Result;
use chrono::Utc;

use dp_core::PresenceTimer;
use dp_store::{EventLog, SessionArchive, WipeOutcome, wipe_all_data};

use super::util::lock_data_dir;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, confirmed: bool) -> Result<()> {
    if !confirmed {
        anyhow::bail!("refusing to delete all data without --yes");
    }

    // Fails while a watcher holds the lock; send it a `wipe` line instead.
    let paths = config.paths();
    let lock = lock_data_dir(&paths)?;

    let mut timer = PresenceTimer::new(config.timer_config(), EventLog::new(paths.log_file()));
    let mut archive = SessionArchive::load(paths.archive_file());
    let outcome = wipe_all_data(&mut timer, &mut archive, Utc::now());
    drop(lock);

    write!(writer, "{}", format_outcome(&outcome))?;
    Ok(())
}

pub fn format_outcome(outcome: &WipeOutcome) -> String {
    let log = if outcome.log_removed {
        "deleted"
    } else {
        "not present"
    };
    format!(
        "Deleted {} session(s)\nEvent log: {log}\n",
        outcome.sessions_removed
    )
}
