use crate::{RecordingId, TodoId};

use std::fmt;

use error_location::ErrorLocation;
use thiserror::Error;

/// Device call that failed, carried by [`JournalError::DeviceFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceOperation {
    /// `start_recorder`.
    StartRecorder,
    /// `stop_recorder`.
    StopRecorder,
    /// `start_player`.
    StartPlayer,
    /// `stop_player`.
    StopPlayer,
}

impl fmt::Display for DeviceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceOperation::StartRecorder => write!(f, "start recorder"),
            DeviceOperation::StopRecorder => write!(f, "stop recorder"),
            DeviceOperation::StartPlayer => write!(f, "start player"),
            DeviceOperation::StopPlayer => write!(f, "stop player"),
        }
    }
}

/// Failure reported by an [`AudioDevice`](crate::AudioDevice) implementation.
///
/// Kept separate from [`JournalError`] so a device can only ever report a
/// device failure; the session manager decides how it surfaces.
#[derive(Error, Debug)]
#[error("{reason} {location}")]
pub struct DeviceError {
    /// Description of what went wrong inside the device.
    pub reason: String,
    /// Source location where error occurred.
    pub location: ErrorLocation,
}

impl DeviceError {
    /// Build a device error located at the caller.
    #[track_caller]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            location: ErrorLocation::from(std::panic::Location::caller()),
        }
    }
}

/// Fieldless classification of [`JournalError`] used for user notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Microphone access was refused.
    PermissionDenied,
    /// The audio device failed a start/stop call.
    DeviceFailure,
    /// The device is bound to a recording.
    BusyRecording,
    /// The device is bound to a playback.
    BusyPlaying,
    /// Another device operation is still in flight.
    SessionBusy,
    /// Unknown recording identifier.
    NotFound,
    /// Blank checklist item title.
    EmptyTodoTitle,
    /// Unknown checklist item identifier.
    TodoNotFound,
}

/// Journal core errors with source location tracking.
#[derive(Error, Debug)]
pub enum JournalError {
    /// Microphone access was not granted.
    #[error("Microphone permission denied {location}")]
    PermissionDenied {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A device start/stop call failed; the session is back to idle.
    #[error("Audio device failed to {operation}: {source} {location}")]
    DeviceFailure {
        /// Device call that failed.
        operation: DeviceOperation,
        /// Underlying device error.
        #[source]
        source: DeviceError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Operation refused because a recording is in progress.
    #[error("Audio device is busy recording {location}")]
    BusyRecording {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Operation refused because a playback is in progress.
    #[error("Audio device is busy playing {location}")]
    BusyPlaying {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Operation refused because another device operation is still pending.
    #[error("Audio session is busy with another operation {location}")]
    SessionBusy {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No recording with the given identifier exists in the catalog.
    #[error("Recording not found: {id} {location}")]
    NotFound {
        /// Identifier that was looked up.
        id: RecordingId,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Checklist item title was empty after trimming.
    #[error("Todo title must not be empty {location}")]
    EmptyTodoTitle {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No checklist item with the given identifier exists.
    #[error("Todo not found: {id} {location}")]
    TodoNotFound {
        /// Identifier that was looked up.
        id: TodoId,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl JournalError {
    /// Classify this error for presentation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            JournalError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            JournalError::DeviceFailure { .. } => ErrorKind::DeviceFailure,
            JournalError::BusyRecording { .. } => ErrorKind::BusyRecording,
            JournalError::BusyPlaying { .. } => ErrorKind::BusyPlaying,
            JournalError::SessionBusy { .. } => ErrorKind::SessionBusy,
            JournalError::NotFound { .. } => ErrorKind::NotFound,
            JournalError::EmptyTodoTitle { .. } => ErrorKind::EmptyTodoTitle,
            JournalError::TodoNotFound { .. } => ErrorKind::TodoNotFound,
        }
    }
}

/// Result type alias using [`JournalError`].
pub type Result<T> = std::result::Result<T, JournalError>;

/// Result type alias for [`AudioDevice`](crate::AudioDevice) calls.
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;
