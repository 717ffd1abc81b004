use crate::DeviceResult;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

/// Progress tick delivered while the recorder is capturing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordProgress {
    /// Audio captured so far.
    pub elapsed: Duration,
    /// Peak absolute sample value since the previous tick (0.0..=1.0).
    pub peak_level: f32,
}

/// Progress tick delivered while the player is outputting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackProgress {
    /// Current playback position.
    pub position: Duration,
    /// Total length of the clip being played.
    pub duration: Duration,
}

/// Handler for record-progress ticks.
pub type RecordProgressHandler = Arc<dyn Fn(RecordProgress) + Send + Sync>;

/// Handler for playback-progress ticks.
pub type PlaybackProgressHandler = Arc<dyn Fn(PlaybackProgress) + Send + Sync>;

/// Handler fired once when a playback runs to completion.
pub type PlaybackFinishedHandler = Arc<dyn Fn() + Send + Sync>;

/// Platform audio subsystem consumed by the session manager.
///
/// Implementations own the physical input/output but none of the session
/// rules: exclusivity, listener bookkeeping and failure recovery are the
/// [`SessionManager`](crate::SessionManager)'s job. At most one handler of
/// each kind is subscribed at a time; subscribing replaces the previous one.
#[async_trait]
pub trait AudioDevice: Send + Sync {
    /// Start capturing and return the storage handle the clip will land in.
    async fn start_recorder(&self) -> DeviceResult<String>;

    /// Stop capturing and finalize the clip.
    async fn stop_recorder(&self) -> DeviceResult<()>;

    /// Start playing the clip stored at `path`.
    async fn start_player(&self, path: &str) -> DeviceResult<()>;

    /// Stop the current playback.
    async fn stop_player(&self) -> DeviceResult<()>;

    /// Attach the record-progress handler.
    fn subscribe_record_progress(&self, handler: RecordProgressHandler);

    /// Detach the record-progress handler.
    fn unsubscribe_record_progress(&self);

    /// Attach the playback-progress handler.
    fn subscribe_playback_progress(&self, handler: PlaybackProgressHandler);

    /// Detach the playback-progress handler.
    fn unsubscribe_playback_progress(&self);

    /// Attach the playback-finished handler. Fires exactly once per
    /// completed playback.
    fn subscribe_playback_finished(&self, handler: PlaybackFinishedHandler);

    /// Detach the playback-finished handler.
    fn unsubscribe_playback_finished(&self);

    /// Advisory progress-event interval.
    fn set_metering_interval(&self, interval: Duration);
}
