use crate::{
    AudioDevice, CoreResult, DeviceError, DeviceEvent, DeviceEventKind, DeviceEvents,
    DeviceOperation, JournalError, Listener, PermissionGate, PlaybackFinishedHandler,
    PlaybackProgressHandler, RecordProgressHandler, Recording, RecordingCatalog, RecordingId,
    SessionId, SessionMode, SessionSnapshot, SessionState, SessionUpdate,
    session::listeners::ListenerSet,
};

use std::{
    panic::Location,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use error_location::ErrorLocation;
use tokio::{
    runtime::Handle,
    sync::{Mutex as AsyncMutex, broadcast, mpsc},
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

#[track_caller]
fn device_failure(operation: DeviceOperation, source: DeviceError) -> JournalError {
    JournalError::DeviceFailure {
        operation,
        source,
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Mutable session data. Only touched through [`SessionManager::with_core`],
/// which never lets the guard live across an await.
#[derive(Debug, Default)]
struct SessionCore {
    state: SessionState,
    pending_path: Option<String>,
    listeners: ListenerSet,
}

/// Rolls an unsettled `begin_*` back to idle when its future is dropped
/// while a device call is still pending.
struct PendingStart<'a> {
    manager: &'a SessionManager,
    announced: SessionMode,
    armed: bool,
}

impl<'a> PendingStart<'a> {
    fn arm(manager: &'a SessionManager, announced: SessionMode) -> Self {
        Self {
            manager,
            announced,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        self.manager.reset_to_idle();
        if self.announced != SessionMode::Idle {
            self.manager
                .publish(SessionUpdate::StateChanged(SessionSnapshot::default()));
        }
        warn!(announced = %self.announced, "Start cancelled before it settled, session reset to idle");
    }
}

/// Sole owner and gatekeeper of the audio device.
///
/// # Serialization
///
/// Device operations never overlap. `begin_*` calls fail fast with
/// [`JournalError::SessionBusy`] while another operation is in flight;
/// `end_*`, [`handle_event`](Self::handle_event) and
/// [`shutdown`](Self::shutdown) queue behind it, so a stop issued during a
/// pending start runs only after the start has settled. A `begin_*` future
/// dropped before its device call settles leaves the session idle with no
/// listeners attached.
///
/// # Events
///
/// Device handlers are thin senders into the [`DeviceEvents`] queue returned
/// by [`new`](Self::new). Whoever runs the event loop feeds each event back
/// through `handle_event`, which applies it atomically and discards it when
/// its session id no longer matches the current session.
pub struct SessionManager {
    device: Arc<dyn AudioDevice>,
    permission: Arc<dyn PermissionGate>,
    catalog: Arc<RecordingCatalog>,
    metering_interval: Duration,
    gate: AsyncMutex<()>,
    core: Mutex<SessionCore>,
    event_tx: mpsc::UnboundedSender<DeviceEvent>,
    updates: broadcast::Sender<SessionUpdate>,
}

impl SessionManager {
    /// Create an idle manager and the queue its device events arrive on.
    pub fn new(
        device: Arc<dyn AudioDevice>,
        permission: Arc<dyn PermissionGate>,
        catalog: Arc<RecordingCatalog>,
        metering_interval: Duration,
    ) -> (Self, DeviceEvents) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        info!(
            metering_interval_ms = metering_interval.as_millis(),
            "SessionManager initialized"
        );

        let manager = Self {
            device,
            permission,
            catalog,
            metering_interval,
            gate: AsyncMutex::new(()),
            core: Mutex::new(SessionCore::default()),
            event_tx,
            updates,
        };

        (manager, DeviceEvents::new(event_rx))
    }

    /// Observe committed changes.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.with_core(|core| core.state)
    }

    /// Current read-only snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().snapshot()
    }

    /// Current mode.
    pub fn mode(&self) -> SessionMode {
        self.state().mode()
    }

    /// Recording being played, if any.
    pub fn current_recording_id(&self) -> Option<RecordingId> {
        self.state().playing_recording_id()
    }

    /// Subscriptions currently attached to the device.
    pub fn attached_listeners(&self) -> Vec<Listener> {
        self.with_core(|core| core.listeners.attached())
    }

    /// Whether a device operation is in flight.
    pub fn is_busy(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    /// Catalog this manager appends to.
    pub fn catalog(&self) -> &RecordingCatalog {
        &self.catalog
    }

    /// Idle → Recording.
    ///
    /// Prompts for microphone access, attaches the record-progress listener
    /// and starts the recorder. The path the device returns is held until
    /// [`end_recording`](Self::end_recording).
    ///
    /// # Errors
    ///
    /// `SessionBusy`, `BusyRecording` or `BusyPlaying` without touching the
    /// device; `PermissionDenied` when access is refused; `DeviceFailure`
    /// when the recorder fails to start, in which case the session is idle
    /// with no listeners attached.
    #[instrument(skip(self))]
    pub async fn begin_recording(&self) -> CoreResult<SessionId> {
        let _op = self.gate.try_lock().map_err(|_| JournalError::SessionBusy {
            location: ErrorLocation::from(Location::caller()),
        })?;

        match self.state() {
            SessionState::Idle => {}
            SessionState::Recording { .. } => {
                return Err(JournalError::BusyRecording {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            SessionState::Playing { .. } => {
                return Err(JournalError::BusyPlaying {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        if !self.permission.request_microphone_access().await {
            warn!("Microphone access denied");
            return Err(JournalError::PermissionDenied {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let session_id = Uuid::new_v4();
        self.device.set_metering_interval(self.metering_interval);

        let handler = self.record_progress_handler(session_id);
        let pending = PendingStart::arm(self, SessionMode::Idle);
        self.with_core(|core| {
            core.listeners
                .attach_record_progress(self.device.as_ref(), handler)
        });

        let started = self.device.start_recorder().await;
        pending.disarm();

        match started {
            Ok(path) => {
                let snapshot = self.with_core(|core| {
                    core.pending_path = Some(path).filter(|p| !p.is_empty());
                    core.state = SessionState::Recording {
                        session_id,
                        started_at: Instant::now(),
                    };
                    core.state.snapshot()
                });
                self.publish(SessionUpdate::StateChanged(snapshot));

                info!(session_id = %session_id, "Recording started");
                Ok(session_id)
            }
            Err(source) => {
                self.reset_to_idle();
                error!(session_id = %session_id, error = %source, "Failed to start recorder");
                Err(device_failure(DeviceOperation::StartRecorder, source))
            }
        }
    }

    /// Recording → Idle.
    ///
    /// Stops the recorder, detaches the record listener and, when the device
    /// handed out a path at start, appends the new recording to the catalog.
    /// Returns `Ok(None)` when nothing was cataloged, including when no
    /// recording is in progress.
    ///
    /// # Errors
    ///
    /// `DeviceFailure` when the recorder fails to stop. The session is idle
    /// and nothing is cataloged.
    #[instrument(skip(self))]
    pub async fn end_recording(&self) -> CoreResult<Option<Recording>> {
        let _op = self.gate.lock().await;

        let active = self.with_core(|core| match core.state {
            SessionState::Recording { session_id, .. } => {
                Some((session_id, core.pending_path.clone()))
            }
            _ => None,
        });
        let Some((session_id, pending_path)) = active else {
            debug!("No recording in progress");
            return Ok(None);
        };

        let stopped = self.device.stop_recorder().await;

        let snapshot = self.with_core(|core| {
            core.listeners
                .detach(self.device.as_ref(), Listener::RecordProgress);
            core.pending_path = None;
            core.state = SessionState::Idle;
            core.state.snapshot()
        });
        self.publish(SessionUpdate::StateChanged(snapshot));

        if let Err(source) = stopped {
            error!(session_id = %session_id, error = %source, "Failed to stop recorder");
            return Err(device_failure(DeviceOperation::StopRecorder, source));
        }

        let Some(path) = pending_path else {
            warn!(session_id = %session_id, "Recording produced no clip, nothing cataloged");
            return Ok(None);
        };

        let recording = Recording::new(path);
        self.catalog.append(recording.clone());
        self.publish(SessionUpdate::RecordingSaved(recording.clone()));

        info!(
            session_id = %session_id,
            recording_id = %recording.id,
            path = %recording.path,
            "Recording saved"
        );

        Ok(Some(recording))
    }

    /// Idle or Playing → Playing(`recording_id`).
    ///
    /// A playback already running is stopped and its listeners detached
    /// before the new one starts; the two device calls never overlap.
    ///
    /// # Errors
    ///
    /// `SessionBusy`, `BusyRecording` or `NotFound` without touching the
    /// device; `DeviceFailure` when stopping the old playback or starting
    /// the new one fails, in which case the session is idle with no
    /// listeners attached.
    #[instrument(skip(self))]
    pub async fn begin_playback(&self, recording_id: RecordingId) -> CoreResult<SessionId> {
        let _op = self.gate.try_lock().map_err(|_| JournalError::SessionBusy {
            location: ErrorLocation::from(Location::caller()),
        })?;

        let current = self.state();
        if let SessionState::Recording { .. } = current {
            return Err(JournalError::BusyRecording {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let recording = self.catalog.find(recording_id)?;
        let pending = PendingStart::arm(self, current.mode());

        if let SessionState::Playing {
            session_id: previous,
            recording_id: previous_recording,
            ..
        } = current
        {
            let stopped = self.device.stop_player().await;
            self.with_core(|core| {
                core.listeners.detach_playback(self.device.as_ref());
                core.state = SessionState::Idle;
            });

            if let Err(source) = stopped {
                pending.disarm();
                self.publish(SessionUpdate::StateChanged(SessionSnapshot::default()));
                error!(session_id = %previous, error = %source, "Failed to stop previous playback");
                return Err(device_failure(DeviceOperation::StopPlayer, source));
            }

            debug!(
                session_id = %previous,
                recording_id = %previous_recording,
                "Previous playback stopped"
            );
        }

        let session_id = Uuid::new_v4();
        self.device.set_metering_interval(self.metering_interval);

        let progress = self.playback_progress_handler(session_id);
        let finished = self.playback_finished_handler(session_id);
        self.with_core(|core| {
            core.listeners
                .attach_playback(self.device.as_ref(), progress, finished)
        });

        let started = self.device.start_player(&recording.path).await;
        pending.disarm();

        match started {
            Ok(()) => {
                let snapshot = self.with_core(|core| {
                    core.state = SessionState::Playing {
                        session_id,
                        recording_id,
                        started_at: Instant::now(),
                    };
                    core.state.snapshot()
                });
                if snapshot != current.snapshot() {
                    self.publish(SessionUpdate::StateChanged(snapshot));
                }

                info!(
                    session_id = %session_id,
                    recording_id = %recording_id,
                    "Playback started"
                );
                Ok(session_id)
            }
            Err(source) => {
                self.reset_to_idle();
                if current.mode() != SessionMode::Idle {
                    self.publish(SessionUpdate::StateChanged(SessionSnapshot::default()));
                }
                error!(
                    session_id = %session_id,
                    recording_id = %recording_id,
                    error = %source,
                    "Failed to start player"
                );
                Err(device_failure(DeviceOperation::StartPlayer, source))
            }
        }
    }

    /// Playing → Idle. A no-op when nothing is playing.
    ///
    /// # Errors
    ///
    /// `DeviceFailure` when the player fails to stop; the session is idle
    /// with no listeners attached regardless.
    #[instrument(skip(self))]
    pub async fn end_playback(&self) -> CoreResult<()> {
        let _op = self.gate.lock().await;

        let SessionState::Playing {
            session_id,
            recording_id,
            ..
        } = self.state()
        else {
            debug!("No playback in progress");
            return Ok(());
        };

        let stopped = self.device.stop_player().await;

        let snapshot = self.with_core(|core| {
            core.listeners.detach_playback(self.device.as_ref());
            core.state = SessionState::Idle;
            core.state.snapshot()
        });
        self.publish(SessionUpdate::StateChanged(snapshot));

        if let Err(source) = stopped {
            error!(session_id = %session_id, error = %source, "Failed to stop player");
            return Err(device_failure(DeviceOperation::StopPlayer, source));
        }

        info!(session_id = %session_id, recording_id = %recording_id, "Playback stopped");

        Ok(())
    }

    /// Apply a device event. Returns the update it produced, or `None` when
    /// the event belongs to a session that is no longer current.
    #[instrument(skip(self))]
    pub async fn handle_event(&self, event: DeviceEvent) -> Option<SessionUpdate> {
        let _op = self.gate.lock().await;

        let update = self.with_core(|core| match (event.kind, core.state) {
            (
                DeviceEventKind::RecordProgress(progress),
                SessionState::Recording { session_id, .. },
            ) if session_id == event.session_id => Some(SessionUpdate::RecordProgress(progress)),
            (
                DeviceEventKind::PlaybackProgress(progress),
                SessionState::Playing {
                    session_id,
                    recording_id,
                    ..
                },
            ) if session_id == event.session_id => Some(SessionUpdate::PlaybackProgress {
                recording_id,
                progress,
            }),
            (
                DeviceEventKind::PlaybackFinished,
                SessionState::Playing {
                    session_id,
                    recording_id,
                    ..
                },
            ) if session_id == event.session_id => {
                core.listeners.detach_playback(self.device.as_ref());
                core.state = SessionState::Idle;
                Some(SessionUpdate::PlaybackFinished { recording_id })
            }
            _ => None,
        });

        match &update {
            Some(SessionUpdate::PlaybackFinished { recording_id }) => {
                info!(
                    session_id = %event.session_id,
                    recording_id = %recording_id,
                    "Playback finished"
                );
                self.publish(SessionUpdate::PlaybackFinished {
                    recording_id: *recording_id,
                });
                self.publish(SessionUpdate::StateChanged(SessionSnapshot::default()));
            }
            Some(update) => self.publish(update.clone()),
            None => debug!(
                session_id = %event.session_id,
                kind = ?event.kind,
                "Discarding stale device event"
            ),
        }

        update
    }

    /// Tear the session down.
    ///
    /// Waits for an in-flight operation, stops an active recording or
    /// playback best-effort (failures are logged), detaches every listener
    /// and returns to idle. An interrupted recording is not cataloged.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        let _op = self.gate.lock().await;

        match self.state() {
            SessionState::Idle => {}
            SessionState::Recording { session_id, .. } => {
                if let Err(e) = self.device.stop_recorder().await {
                    warn!(session_id = %session_id, error = %e, "Failed to stop recorder during teardown");
                }
            }
            SessionState::Playing { session_id, .. } => {
                if let Err(e) = self.device.stop_player().await {
                    warn!(session_id = %session_id, error = %e, "Failed to stop player during teardown");
                }
            }
        }

        if self.reset_to_idle() != SessionMode::Idle {
            self.publish(SessionUpdate::StateChanged(SessionSnapshot::default()));
        }

        info!("Audio session shut down");
    }

    /// Detach everything and go idle. Returns the mode that was left.
    fn reset_to_idle(&self) -> SessionMode {
        self.with_core(|core| {
            core.listeners.detach_all(self.device.as_ref());
            core.pending_path = None;
            let left = core.state.mode();
            core.state = SessionState::Idle;
            left
        })
    }

    fn with_core<R>(&self, f: impl FnOnce(&mut SessionCore) -> R) -> R {
        let mut core = self.core.lock().unwrap_or_else(|e| {
            error!("Session state lock poisoned, recovering: {}", e);
            e.into_inner()
        });
        f(&mut core)
    }

    fn publish(&self, update: SessionUpdate) {
        // No receivers is fine; observers are optional.
        let _ = self.updates.send(update);
    }

    fn record_progress_handler(&self, session_id: SessionId) -> RecordProgressHandler {
        let tx = self.event_tx.clone();
        Arc::new(move |progress| {
            let _ = tx.send(DeviceEvent {
                session_id,
                kind: DeviceEventKind::RecordProgress(progress),
            });
        })
    }

    fn playback_progress_handler(&self, session_id: SessionId) -> PlaybackProgressHandler {
        let tx = self.event_tx.clone();
        Arc::new(move |progress| {
            let _ = tx.send(DeviceEvent {
                session_id,
                kind: DeviceEventKind::PlaybackProgress(progress),
            });
        })
    }

    fn playback_finished_handler(&self, session_id: SessionId) -> PlaybackFinishedHandler {
        let tx = self.event_tx.clone();
        Arc::new(move || {
            let _ = tx.send(DeviceEvent {
                session_id,
                kind: DeviceEventKind::PlaybackFinished,
            });
        })
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        let core = self.core.get_mut().unwrap_or_else(|e| e.into_inner());
        let state = core.state;

        if !core.listeners.is_empty() {
            core.listeners.detach_all(self.device.as_ref());
        }

        if state == SessionState::Idle {
            return;
        }

        warn!(
            mode = %state.mode(),
            "SessionManager dropped while active; shutdown() was not called"
        );

        let Ok(runtime) = Handle::try_current() else {
            warn!(mode = %state.mode(), "No runtime to stop the device on, leaving it running");
            return;
        };

        let device = Arc::clone(&self.device);
        runtime.spawn(async move {
            let (operation, stopped) = match state {
                SessionState::Idle => return,
                SessionState::Recording { .. } => {
                    (DeviceOperation::StopRecorder, device.stop_recorder().await)
                }
                SessionState::Playing { .. } => {
                    (DeviceOperation::StopPlayer, device.stop_player().await)
                }
            };
            match stopped {
                Ok(()) => debug!(%operation, "Device stopped after manager drop"),
                Err(e) => warn!(%operation, error = %e, "Failed to stop device after manager drop"),
            }
        });
    }
}
