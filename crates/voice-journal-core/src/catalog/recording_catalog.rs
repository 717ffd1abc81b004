//! Append-only log of completed recordings.

use crate::{CoreResult, JournalError, Recording, RecordingId};

use std::{panic::Location, sync::Arc};

use arc_swap::ArcSwap;
use error_location::ErrorLocation;
use tracing::debug;

/// In-memory catalog, insertion order = creation order.
///
/// Readers load an [`Arc`] snapshot of the committed entries without
/// locking; an append publishes a new list and never mutates a snapshot
/// that is already handed out.
#[derive(Debug)]
pub struct RecordingCatalog {
    entries: ArcSwap<Vec<Recording>>,
}

impl Default for RecordingCatalog {
    fn default() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
        }
    }
}

impl RecordingCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recording at the end.
    pub fn append(&self, recording: Recording) {
        debug!(recording_id = %recording.id, path = %recording.path, "Recording cataloged");
        self.entries.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(recording.clone());
            next
        });
    }

    /// Snapshot of every committed recording, oldest first.
    pub fn list(&self) -> Arc<Vec<Recording>> {
        self.entries.load_full()
    }

    /// Look up a recording by identity.
    #[track_caller]
    pub fn find(&self, id: RecordingId) -> CoreResult<Recording> {
        self.entries
            .load()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(JournalError::NotFound {
                id,
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Recording at `index` in creation order.
    pub fn get(&self, index: usize) -> Option<Recording> {
        self.entries.load().get(index).cloned()
    }

    /// Number of recordings.
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }
}
