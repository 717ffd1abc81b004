use crate::RecordingId;

use std::{fmt, time::Instant};

use uuid::Uuid;

/// Identity of one recording or playback session.
///
/// Every device handler attached for a session tags its events with this id,
/// which is how events from a superseded session are told apart.
pub type SessionId = Uuid;

/// What the audio device is currently bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No active device use.
    #[default]
    Idle,
    /// The device is capturing.
    Recording {
        /// Session identity.
        session_id: SessionId,
        /// When capture started.
        started_at: Instant,
    },
    /// The device is outputting exactly one recording.
    Playing {
        /// Session identity.
        session_id: SessionId,
        /// Recording being played.
        recording_id: RecordingId,
        /// When playback started.
        started_at: Instant,
    },
}

impl SessionState {
    /// Fieldless mode of this state.
    pub fn mode(&self) -> SessionMode {
        match self {
            SessionState::Idle => SessionMode::Idle,
            SessionState::Recording { .. } => SessionMode::Recording,
            SessionState::Playing { .. } => SessionMode::Playing,
        }
    }

    /// Identity of the active session, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            SessionState::Idle => None,
            SessionState::Recording { session_id, .. }
            | SessionState::Playing { session_id, .. } => Some(*session_id),
        }
    }

    /// Recording being played, if any.
    pub fn playing_recording_id(&self) -> Option<RecordingId> {
        match self {
            SessionState::Playing { recording_id, .. } => Some(*recording_id),
            _ => None,
        }
    }

    /// Read-only view for presentation.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode(),
            recording_id_if_playing: self.playing_recording_id(),
        }
    }
}

/// Current mode of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionMode {
    /// Nothing bound.
    #[default]
    Idle,
    /// Capturing.
    Recording,
    /// Outputting.
    Playing,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Idle => write!(f, "Idle"),
            SessionMode::Recording => write!(f, "Recording"),
            SessionMode::Playing => write!(f, "Playing"),
        }
    }
}

/// What the presentation layer may observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    /// Current mode.
    pub mode: SessionMode,
    /// Recording being played when `mode` is `Playing`.
    pub recording_id_if_playing: Option<RecordingId>,
}
