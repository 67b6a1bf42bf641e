//! File storage for the presence tracker.
//!
//! Two files live side by side in the data directory:
//!
//! - `sessions.csv`: the append-only [`EventLog`], one row per timer event.
//! - `sessions.json`: the [`SessionArchive`], rewritten atomically on every
//!   change.
//!
//! # Failure policy
//!
//! Tracking must keep working when the disk does not. Public operations on
//! both stores never return errors: failures are reported through `tracing`
//! and the operation degrades to a no-op (or an empty archive on load). The
//! fallible internals return [`StoreError`].
//!
//! # Concurrency
//!
//! Both stores assume a single writer. Callers running several processes
//! against one data directory must serialize them externally.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod archive;
pub mod event_log;
pub mod wipe;

pub use archive::SessionArchive;
pub use event_log::{EventLog, LOG_HEADER, LoggedEvent, read_log};
pub use wipe::{WipeOutcome, wipe_all_data};

/// File name of the event log.
pub const LOG_FILE_NAME: &str = "sessions.csv";
/// File name of the session archive.
pub const ARCHIVE_FILE_NAME: &str = "sessions.json";
/// File name of the single-writer lock.
pub const LOCK_FILE_NAME: &str = ".lock";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("failed to {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The archive could not be encoded or decoded.
    #[error("invalid archive json: {0}")]
    Json(#[from] serde_json::Error),
    /// The temporary archive file could not replace the real one.
    #[error("failed to replace {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
    /// A log row could not be parsed.
    #[error("malformed log record {record}: {message}")]
    MalformedLog { record: usize, message: String },
}

impl StoreError {
    pub(crate) fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Locations of the tracker files inside one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    dir: PathBuf,
}

impl DataPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn log_file(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }

    pub fn archive_file(&self) -> PathBuf {
        self.dir.join(ARCHIVE_FILE_NAME)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.dir.join(LOCK_FILE_NAME)
    }
}
