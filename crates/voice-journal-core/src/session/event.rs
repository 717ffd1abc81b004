use crate::{PlaybackProgress, RecordProgress, Recording, RecordingId, SessionId, SessionSnapshot};

use tokio::sync::mpsc;

/// Device callback payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceEventKind {
    /// Record-progress tick.
    RecordProgress(RecordProgress),
    /// Playback-progress tick.
    PlaybackProgress(PlaybackProgress),
    /// Playback ran to completion.
    PlaybackFinished,
}

/// A device callback tagged with the session whose handler produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceEvent {
    /// Session the originating handler was attached for.
    pub session_id: SessionId,
    /// What happened.
    pub kind: DeviceEventKind,
}

/// Queue of device events waiting to be applied through
/// [`SessionManager::handle_event`](crate::SessionManager::handle_event).
#[derive(Debug)]
pub struct DeviceEvents {
    rx: mpsc::UnboundedReceiver<DeviceEvent>,
}

impl DeviceEvents {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<DeviceEvent>) -> Self {
        Self { rx }
    }

    /// Next queued event. `None` once the manager is gone.
    pub async fn recv(&mut self) -> Option<DeviceEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<DeviceEvent> {
        self.rx.try_recv().ok()
    }
}

/// Broadcast to observers after each committed change.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// The session mode changed.
    StateChanged(SessionSnapshot),
    /// The current recording made progress.
    RecordProgress(RecordProgress),
    /// The current playback made progress.
    PlaybackProgress {
        /// Recording being played.
        recording_id: RecordingId,
        /// Position tick.
        progress: PlaybackProgress,
    },
    /// The current playback ran to completion.
    PlaybackFinished {
        /// Recording that finished.
        recording_id: RecordingId,
    },
    /// A recording was appended to the catalog.
    RecordingSaved(Recording),
}
