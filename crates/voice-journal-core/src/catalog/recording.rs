use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque unique identifier of a journal recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordingId(Uuid);

impl RecordingId {
    /// Mint a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A completed recording. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    /// Unique identity.
    pub id: RecordingId,
    /// Storage handle returned by the device when recording started.
    pub path: String,
    /// When the recording was committed.
    pub created_at: DateTime<Utc>,
}

impl Recording {
    /// New recording for `path`, stamped now.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            id: RecordingId::new(),
            path: path.into(),
            created_at: Utc::now(),
        }
    }
}
