//! JSON archive of finished sessions.
//!
//! The whole collection is rewritten on every change. Each rewrite goes
//! through a temporary file in the same directory that is synced and then
//! renamed over the archive, so readers see either the old or the new
//! collection, never a partial one. Cost is linear in the number of records,
//! which is fine for personal-scale data.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use uuid::Uuid;

use dp_core::{SessionRecord, SessionSink};

use crate::StoreError;

/// Ordered collection of finished sessions, most recent first.
#[derive(Debug)]
pub struct SessionArchive {
    path: PathBuf,
    sessions: Vec<SessionRecord>,
}

impl SessionArchive {
    /// Loads the archive at `path`.
    ///
    /// A missing or unreadable file gives an empty archive; the next change
    /// will overwrite it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let sessions = match read_sessions(&path) {
            Ok(sessions) => sessions,
            Err(err) => {
                tracing::warn!(error = %err, "starting with an empty session archive");
                Vec::new()
            }
        };
        tracing::debug!(path = %path.display(), count = sessions.len(), "loaded session archive");
        Self { path, sessions }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records, most recent first.
    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&SessionRecord> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Inserts `record` at the front and persists.
    pub fn add(&mut self, record: SessionRecord) {
        self.sessions.insert(0, record);
        self.persist();
    }

    /// Removes the record with `id`. Returns whether one was found.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let Some(index) = self.sessions.iter().position(|s| s.id == id) else {
            return false;
        };
        self.sessions.remove(index);
        self.persist();
        true
    }

    /// Removes the records at the given positions. Out-of-range and repeated
    /// offsets are ignored.
    pub fn delete_at(&mut self, offsets: &[usize]) {
        let mut offsets: Vec<usize> = offsets
            .iter()
            .copied()
            .filter(|&i| i < self.sessions.len())
            .collect();
        offsets.sort_unstable_by(|a, b| b.cmp(a));
        offsets.dedup();

        for index in &offsets {
            self.sessions.remove(*index);
        }
        self.persist();
    }

    /// Removes every record and persists the empty archive.
    pub fn clear(&mut self) {
        self.sessions.clear();
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.try_persist() {
            tracing::warn!(error = %err, "failed to persist session archive");
        }
    }

    fn try_persist(&self) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| StoreError::io("create directory", dir, e))?;

        let json = serde_json::to_vec_pretty(&self.sessions)?;

        let mut temp =
            NamedTempFile::new_in(dir).map_err(|e| StoreError::io("create temp file in", dir, e))?;
        temp.write_all(&json)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| StoreError::io("write", temp.path(), e))?;
        temp.persist(&self.path).map_err(|e| StoreError::Persist {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(())
    }
}

impl SessionSink for SessionArchive {
    fn add(&mut self, record: SessionRecord) {
        Self::add(self, record);
    }
}

fn read_sessions(path: &Path) -> Result<Vec<SessionRecord>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(StoreError::io("read", path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
    }

    fn record(name: &str, offset_secs: i64) -> SessionRecord {
        let start = t0() + Duration::seconds(offset_secs) + Duration::nanoseconds(987_654_321);
        SessionRecord::new(name, start, start + Duration::seconds(300), 123.456_789)
    }

    #[test]
    fn missing_file_loads_empty() {
        let temp = tempfile::tempdir().unwrap();
        let archive = SessionArchive::load(temp.path().join("sessions.json"));
        assert!(archive.is_empty());
        assert!(!archive.path().exists());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("sessions.json");
        fs::write(&path, "{ not json").unwrap();

        let archive = SessionArchive::load(&path);
        assert!(archive.is_empty());
    }

    #[test]
    fn add_then_load_roundtrips_exactly() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("data").join("sessions.json");

        let rec = record("Focus", 0);
        let mut archive = SessionArchive::load(&path);
        archive.add(rec.clone());

        let reloaded = SessionArchive::load(&path);
        assert_eq!(reloaded.sessions(), &[rec.clone()]);
        assert_eq!(reloaded.sessions()[0].started_at, rec.started_at);
        assert_eq!(reloaded.get(rec.id), Some(&rec));
    }

    #[test]
    fn add_keeps_most_recent_first() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("sessions.json");

        let mut archive = SessionArchive::load(&path);
        let first = record("first", 0);
        let second = record("second", 600);
        archive.add(first.clone());
        archive.add(second.clone());

        let reloaded = SessionArchive::load(&path);
        assert_eq!(reloaded.sessions(), &[second, first]);
    }

    #[test]
    fn delete_by_id_persists() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("sessions.json");

        let mut archive = SessionArchive::load(&path);
        let keep = record("keep", 0);
        let drop_me = record("drop", 600);
        archive.add(keep.clone());
        archive.add(drop_me.clone());

        assert!(archive.delete(drop_me.id));
        assert!(!archive.delete(drop_me.id));
        assert_eq!(SessionArchive::load(&path).sessions(), &[keep]);
    }

    #[test]
    fn delete_at_ignores_bad_offsets() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("sessions.json");

        let mut archive = SessionArchive::load(&path);
        let records: Vec<_> = (0..4).map(|i| record(&format!("r{i}"), i * 600)).collect();
        for rec in &records {
            archive.add(rec.clone());
        }
        // Order is now r3, r2, r1, r0.
        archive.delete_at(&[0, 2, 2, 9]);

        let names: Vec<_> = SessionArchive::load(&path)
            .sessions()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        assert_eq!(names, vec!["r2", "r0"]);
    }

    #[test]
    fn clear_persists_empty_collection() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("sessions.json");

        let mut archive = SessionArchive::load(&path);
        archive.add(record("x", 0));
        archive.clear();

        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "[]");
        assert!(SessionArchive::load(&path).is_empty());
    }

    #[test]
    fn persist_leaves_no_temp_files() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("sessions.json");

        let mut archive = SessionArchive::load(&path);
        archive.add(record("a", 0));
        archive.add(record("b", 600));

        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn unwritable_location_keeps_memory_state() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let mut archive = SessionArchive::load(blocker.join("sessions.json"));
        archive.add(record("a", 0));
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn works_as_timer_sink() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("sessions.json");

        let mut archive = SessionArchive::load(&path);
        SessionSink::add(&mut archive, record("via sink", 0));
        assert_eq!(SessionArchive::load(&path).len(), 1);
    }
}
