//! Audio session state machine.
//!
//! The [`SessionManager`] is the only mutator of the audio device. It keeps
//! the device bound to at most one of recording or playback, brackets every
//! device call with listener attach/detach, and drops device events that
//! belong to a session it has already left.

mod event;
mod listeners;
mod manager;
mod state;

pub use {
    event::{DeviceEvent, DeviceEventKind, DeviceEvents, SessionUpdate},
    listeners::Listener,
    manager::SessionManager,
    state::{SessionId, SessionMode, SessionSnapshot, SessionState},
};
