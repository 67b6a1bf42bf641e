//! Completed session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A finished tracking session.
///
/// `total_sec` is the sum of the counted sub-intervals, so it is usually
/// smaller than `ended_at - started_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Unique identifier (UUID v4).
    pub id: Uuid,
    /// Display name; may be empty.
    pub name: String,
    /// When the session was started.
    #[serde(with = "precise_time")]
    pub started_at: DateTime<Utc>,
    /// When the session was stopped. Never before `started_at`.
    #[serde(with = "precise_time")]
    pub ended_at: DateTime<Utc>,
    /// Active seconds counted during the session.
    pub total_sec: f64,
}

impl SessionRecord {
    /// Creates a record with a fresh id.
    ///
    /// `ended_at` is clamped to `started_at` and `total_sec` to zero so the
    /// record invariants hold even under clock skew.
    pub fn new(
        name: impl Into<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        total_sec: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            started_at,
            ended_at: ended_at.max(started_at),
            total_sec: total_sec.max(0.0),
        }
    }

    /// Wall-clock span of the session in seconds, gaps included.
    pub fn span_secs(&self) -> f64 {
        crate::format::secs_between(self.ended_at, self.started_at)
    }
}

/// RFC 3339 timestamps that always carry nanosecond fractions, so decoding
/// gives back the exact instant.
mod precise_time {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
