//! Event kind enum as the single source of truth for log event strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of rows written to the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A session was started.
    Start,
    /// A sub-interval was closed and added to the session total.
    Chunk,
    /// A session was stopped by the user.
    Stop,
    /// A session was stopped because the process is exiting.
    StopApp,
    /// Periodic liveness marker.
    Heartbeat,
}

impl EventKind {
    /// String representation used in the log file.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Chunk => "CHUNK",
            Self::Stop => "STOP",
            Self::StopApp => "STOP_APP",
            Self::Heartbeat => "HEARTBEAT",
        }
    }

    /// Whether this event ends a session.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Stop | Self::StopApp)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "START" => Ok(Self::Start),
            "CHUNK" => Ok(Self::Chunk),
            "STOP" => Ok(Self::Stop),
            "STOP_APP" => Ok(Self::StopApp),
            "HEARTBEAT" => Ok(Self::Heartbeat),
            _ => Err(UnknownEventKind(s.to_string())),
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown event kind strings.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown event kind: {0}")]
pub struct UnknownEventKind(String);
