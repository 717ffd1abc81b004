use crate::{
    AudioDevice, DeviceError, DeviceOperation, DeviceResult, Listener, PlaybackFinishedHandler,
    PlaybackProgress, PlaybackProgressHandler, RecordProgress, RecordProgressHandler,
};

use std::{
    collections::{BTreeSet, HashSet, VecDeque},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Notify;

/// Everything the manager asked the device to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeviceCall {
    StartRecorder,
    StopRecorder,
    StartPlayer(String),
    StopPlayer,
    SetMeteringInterval(Duration),
    Subscribe(Listener),
    Unsubscribe(Listener),
}

#[derive(Default)]
struct Handlers {
    record_progress: Option<RecordProgressHandler>,
    playback_progress: Option<PlaybackProgressHandler>,
    playback_finished: Option<PlaybackFinishedHandler>,
}

/// In-memory device that logs calls, counts overlap and can be told to
/// fail or to hold the next start until released.
#[derive(Default)]
pub(crate) struct ScriptedDevice {
    calls: Mutex<Vec<DeviceCall>>,
    recorder_paths: Mutex<VecDeque<String>>,
    failures: Mutex<HashSet<DeviceOperation>>,
    hold: Mutex<Option<Arc<Notify>>>,
    handlers: Mutex<Handlers>,
    recordings_started: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    duplicates: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedDevice {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue the paths `start_recorder` hands out, in order. Once drained,
    /// paths default to `rec<n>.m4a`.
    pub(crate) fn with_recorder_paths(self, paths: &[&str]) -> Self {
        lock(&self.recorder_paths).extend(paths.iter().map(|p| p.to_string()));
        self
    }

    pub(crate) fn fail(&self, operation: DeviceOperation) {
        lock(&self.failures).insert(operation);
    }

    pub(crate) fn recover(&self, operation: DeviceOperation) {
        lock(&self.failures).remove(&operation);
    }

    /// Make the next start call wait until the returned notify fires.
    pub(crate) fn hold_next_start(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *lock(&self.hold) = Some(Arc::clone(&notify));
        notify
    }

    pub(crate) fn calls(&self) -> Vec<DeviceCall> {
        lock(&self.calls).clone()
    }

    /// Start/stop calls only, without subscription bookkeeping.
    pub(crate) fn device_calls(&self) -> Vec<DeviceCall> {
        self.calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    DeviceCall::StartRecorder
                        | DeviceCall::StopRecorder
                        | DeviceCall::StartPlayer(_)
                        | DeviceCall::StopPlayer
                )
            })
            .collect()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn duplicate_subscriptions(&self) -> usize {
        self.duplicates.load(Ordering::SeqCst)
    }

    pub(crate) fn subscribed(&self) -> BTreeSet<Listener> {
        let handlers = lock(&self.handlers);
        let mut subscribed = BTreeSet::new();
        if handlers.record_progress.is_some() {
            subscribed.insert(Listener::RecordProgress);
        }
        if handlers.playback_progress.is_some() {
            subscribed.insert(Listener::PlaybackProgress);
        }
        if handlers.playback_finished.is_some() {
            subscribed.insert(Listener::PlaybackFinished);
        }
        subscribed
    }

    pub(crate) fn playback_finished_handler(&self) -> Option<PlaybackFinishedHandler> {
        lock(&self.handlers).playback_finished.clone()
    }

    /// Deliver a record-progress tick. Returns whether anyone listened.
    pub(crate) fn emit_record_progress(&self, progress: RecordProgress) -> bool {
        let handler = lock(&self.handlers).record_progress.clone();
        match handler {
            Some(handler) => {
                handler(progress);
                true
            }
            None => false,
        }
    }

    /// Deliver a playback-progress tick. Returns whether anyone listened.
    pub(crate) fn emit_playback_progress(&self, progress: PlaybackProgress) -> bool {
        let handler = lock(&self.handlers).playback_progress.clone();
        match handler {
            Some(handler) => {
                handler(progress);
                true
            }
            None => false,
        }
    }

    /// Deliver playback-finished. Returns whether anyone listened.
    pub(crate) fn finish_playback(&self) -> bool {
        let handler = lock(&self.handlers).playback_finished.clone();
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    fn log(&self, call: DeviceCall) {
        lock(&self.calls).push(call);
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    fn outcome(&self, operation: DeviceOperation) -> DeviceResult<()> {
        if lock(&self.failures).contains(&operation) {
            return Err(DeviceError::new(format!("scripted {} failure", operation)));
        }
        Ok(())
    }

    async fn wait_if_held(&self) {
        let hold = lock(&self.hold).take();
        if let Some(notify) = hold {
            notify.notified().await;
        }
    }

    fn note_subscribe(&self, listener: Listener, already: bool) {
        if already {
            self.duplicates.fetch_add(1, Ordering::SeqCst);
        }
        self.log(DeviceCall::Subscribe(listener));
    }
}

#[async_trait]
impl AudioDevice for ScriptedDevice {
    async fn start_recorder(&self) -> DeviceResult<String> {
        let _flight = self.enter();
        self.log(DeviceCall::StartRecorder);
        self.wait_if_held().await;
        self.outcome(DeviceOperation::StartRecorder)?;

        let n = self.recordings_started.fetch_add(1, Ordering::SeqCst) + 1;
        let queued = lock(&self.recorder_paths).pop_front();
        Ok(queued.unwrap_or_else(|| format!("rec{}.m4a", n)))
    }

    async fn stop_recorder(&self) -> DeviceResult<()> {
        let _flight = self.enter();
        self.log(DeviceCall::StopRecorder);
        tokio::task::yield_now().await;
        self.outcome(DeviceOperation::StopRecorder)
    }

    async fn start_player(&self, path: &str) -> DeviceResult<()> {
        let _flight = self.enter();
        self.log(DeviceCall::StartPlayer(path.to_string()));
        self.wait_if_held().await;
        self.outcome(DeviceOperation::StartPlayer)
    }

    async fn stop_player(&self) -> DeviceResult<()> {
        let _flight = self.enter();
        self.log(DeviceCall::StopPlayer);
        tokio::task::yield_now().await;
        self.outcome(DeviceOperation::StopPlayer)
    }

    fn subscribe_record_progress(&self, handler: RecordProgressHandler) {
        let already = lock(&self.handlers).record_progress.replace(handler).is_some();
        self.note_subscribe(Listener::RecordProgress, already);
    }

    fn unsubscribe_record_progress(&self) {
        lock(&self.handlers).record_progress = None;
        self.log(DeviceCall::Unsubscribe(Listener::RecordProgress));
    }

    fn subscribe_playback_progress(&self, handler: PlaybackProgressHandler) {
        let already = lock(&self.handlers)
            .playback_progress
            .replace(handler)
            .is_some();
        self.note_subscribe(Listener::PlaybackProgress, already);
    }

    fn unsubscribe_playback_progress(&self) {
        lock(&self.handlers).playback_progress = None;
        self.log(DeviceCall::Unsubscribe(Listener::PlaybackProgress));
    }

    fn subscribe_playback_finished(&self, handler: PlaybackFinishedHandler) {
        let already = lock(&self.handlers)
            .playback_finished
            .replace(handler)
            .is_some();
        self.note_subscribe(Listener::PlaybackFinished, already);
    }

    fn unsubscribe_playback_finished(&self) {
        lock(&self.handlers).playback_finished = None;
        self.log(DeviceCall::Unsubscribe(Listener::PlaybackFinished));
    }

    fn set_metering_interval(&self, interval: Duration) {
        self.log(DeviceCall::SetMeteringInterval(interval));
    }
}
