//! User-facing text for errors. Every [`ErrorKind`] gets its own message.

use crate::AppError;

use voice_journal_core::ErrorKind;

/// Notification shown at the prompt for a core error kind.
pub(crate) fn notification_for(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::PermissionDenied => {
            "Microphone access was denied. Allow it in your system settings and try again."
        }
        ErrorKind::DeviceFailure => "The audio device failed. Check your input/output and retry.",
        ErrorKind::BusyRecording => "A recording is in progress. Type `stop` first.",
        ErrorKind::BusyPlaying => "A journal entry is playing. Type `halt` first.",
        ErrorKind::SessionBusy => "Still working on the previous request. Try again in a moment.",
        ErrorKind::NotFound => "That journal entry does not exist. Type `list` to see entries.",
        ErrorKind::EmptyTodoTitle => "A checklist item needs a title.",
        ErrorKind::TodoNotFound => "That checklist item does not exist. Type `todo list`.",
    }
}

/// Text printed for any error surfaced by a command.
pub(crate) fn describe(error: &AppError) -> String {
    match error {
        AppError::Core { source, .. } => notification_for(source.kind()).to_string(),
        AppError::InvalidCommand { reason, .. } => {
            format!("Didn't understand that: {}. Type `help` for commands.", reason)
        }
        AppError::ConfigError { reason, .. } => format!("Configuration problem: {}", reason),
        AppError::IoError { source, .. } => format!("I/O problem: {}", source),
    }
}
