//! Bulk removal of all tracked data.

use std::fs;
use std::io;

use chrono::{DateTime, Utc};
use serde::Serialize;

use dp_core::{EventSink, PresenceTimer};

use crate::{EventLog, SessionArchive};

/// What a wipe removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WipeOutcome {
    pub sessions_removed: usize,
    pub log_removed: bool,
    pub dir_removed: bool,
}

/// Stops any running session, empties the archive and deletes the log.
///
/// The log's directory is removed too when nothing else is left in it.
/// Every filesystem step is best effort.
pub fn wipe_all_data(
    timer: &mut PresenceTimer<EventLog>,
    archive: &mut SessionArchive,
    now: DateTime<Utc>,
) -> WipeOutcome {
    if timer.is_active() {
        timer.stop(archive, false, now);
    }

    let sessions_removed = archive.len();
    archive.clear();

    let log = timer.sink_mut();
    log.close();
    let log_path = log.path().to_path_buf();

    let log_removed = match fs::remove_file(&log_path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!(error = %e, path = %log_path.display(), "failed to delete event log");
            false
        }
    };

    let dir_removed = log_path.parent().is_some_and(|dir| {
        let empty = fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_none());
        empty && fs::remove_dir(dir).is_ok()
    });

    timer.reset_display();

    tracing::info!(sessions_removed, log_removed, dir_removed, "wiped tracker data");
    WipeOutcome {
        sessions_removed,
        log_removed,
        dir_removed,
    }
}
