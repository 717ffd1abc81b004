//! Voice Journal Core Library
//!
//! Owns the single audio input/output resource of the voice journal: the
//! session manager that serializes recording and playback, the catalog of
//! finished recordings, and the checklist store that sits beside them.
//!
//! # Example
//!
//! ```no_run
//! use voice_journal_core::{
//!     AlwaysGranted, CoreResult, CpalDevice, CpalDeviceSettings, RecordingCatalog,
//!     SessionManager,
//! };
//!
//! use std::{sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let device = Arc::new(CpalDevice::new(CpalDeviceSettings::new("recordings")));
//!     let catalog = Arc::new(RecordingCatalog::new());
//!     let (manager, _events) = SessionManager::new(
//!         device,
//!         Arc::new(AlwaysGranted),
//!         Arc::clone(&catalog),
//!         Duration::from_millis(200),
//!     );
//!
//!     manager.begin_recording().await?;
//!     tokio::time::sleep(Duration::from_secs(3)).await;
//!     if let Some(recording) = manager.end_recording().await? {
//!         manager.begin_playback(recording.id).await?;
//!     }
//!     Ok(())
//! }
//! ```

mod audio;
mod catalog;
mod error;
mod session;
mod todo;

pub use {
    audio::{
        AlwaysGranted, AudioDevice, CpalDevice, CpalDeviceSettings, CpalPermissionGate,
        PermissionGate, PlaybackFinishedHandler, PlaybackProgress, PlaybackProgressHandler,
        RecordProgress, RecordProgressHandler,
    },
    catalog::{Recording, RecordingCatalog, RecordingId},
    error::{
        DeviceError, DeviceOperation, DeviceResult, ErrorKind, JournalError,
        Result as CoreResult,
    },
    session::{
        DeviceEvent, DeviceEventKind, DeviceEvents, Listener, SessionId, SessionManager,
        SessionMode, SessionSnapshot, SessionState, SessionUpdate,
    },
    todo::{Todo, TodoFilter, TodoId, TodoStore},
};
