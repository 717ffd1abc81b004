//! Host sound system implementation of [`AudioDevice`].
//!
//! Recording captures the input device into memory and writes a WAV clip on
//! stop. Playback decodes a clip and streams it to the output device. Both
//! run a ticker task at the metering interval that feeds the subscribed
//! progress handlers; the playback ticker also fires the finished handler
//! once the clip drains and releases the output stream.

use crate::{
    DeviceError, DeviceResult, PlaybackFinishedHandler, PlaybackProgress,
    PlaybackProgressHandler, RecordProgress, RecordProgressHandler,
    audio::{
        AudioDevice,
        capture::{AudioCapturer, CaptureMeter},
        clip::{read_clip, write_clip},
        playback::{AudioPlayer, PlaybackCursor},
    },
};

use std::{
    path::PathBuf,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

const DEFAULT_METERING_INTERVAL_MS: u64 = 200;

/// Where clips are stored and which host devices to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpalDeviceSettings {
    /// Directory new clips are written into.
    pub recordings_dir: PathBuf,
    /// Input device name (None = default device).
    pub input_device: Option<String>,
    /// Output device name (None = default device).
    pub output_device: Option<String>,
}

impl CpalDeviceSettings {
    /// Settings using the default input and output devices.
    pub fn new(recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
            input_device: None,
            output_device: None,
        }
    }
}

#[derive(Default)]
struct Handlers {
    record_progress: Option<RecordProgressHandler>,
    playback_progress: Option<PlaybackProgressHandler>,
    playback_finished: Option<PlaybackFinishedHandler>,
}

struct ActiveRecorder {
    capturer: AudioCapturer,
    path: PathBuf,
    ticker: JoinHandle<()>,
}

struct ActivePlayer {
    _player: AudioPlayer,
    ticker: JoinHandle<()>,
    generation: u64,
}

/// [`AudioDevice`] backed by cpal input/output streams and WAV clips.
pub struct CpalDevice {
    settings: CpalDeviceSettings,
    metering_interval_ms: AtomicU64,
    handlers: Arc<Mutex<Handlers>>,
    recorder: Mutex<Option<ActiveRecorder>>,
    player: Arc<Mutex<Option<ActivePlayer>>>,
    player_generation: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| {
        error!("Device lock poisoned, recovering: {}", e);
        e.into_inner()
    })
}

impl CpalDevice {
    /// Create a device; no host stream is opened until a start call.
    pub fn new(settings: CpalDeviceSettings) -> Self {
        Self {
            settings,
            metering_interval_ms: AtomicU64::new(DEFAULT_METERING_INTERVAL_MS),
            handlers: Arc::new(Mutex::new(Handlers::default())),
            recorder: Mutex::new(None),
            player: Arc::new(Mutex::new(None)),
            player_generation: AtomicU64::new(0),
        }
    }

    fn metering_interval(&self) -> Duration {
        Duration::from_millis(self.metering_interval_ms.load(Ordering::Relaxed))
    }

    fn spawn_record_ticker(&self, meter: Arc<CaptureMeter>, sample_rate: u32) -> JoinHandle<()> {
        let handlers = Arc::clone(&self.handlers);
        let period = self.metering_interval();

        tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticks.tick().await;

            loop {
                ticks.tick().await;
                let progress = RecordProgress {
                    elapsed: meter.elapsed(sample_rate),
                    peak_level: meter.take_peak(),
                };
                let handler = lock(&handlers).record_progress.clone();
                if let Some(handler) = handler {
                    handler(progress);
                }
            }
        })
    }

    fn spawn_playback_ticker(&self, cursor: Arc<PlaybackCursor>, generation: u64) -> JoinHandle<()> {
        let handlers = Arc::clone(&self.handlers);
        let player = Arc::clone(&self.player);
        let period = self.metering_interval();

        tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticks.tick().await;

                if cursor.is_drained() {
                    {
                        let mut slot = lock(&player);
                        if slot.as_ref().map(|p| p.generation) == Some(generation) {
                            *slot = None;
                        }
                    }
                    let handler = lock(&handlers).playback_finished.clone();
                    if let Some(handler) = handler {
                        handler();
                    }
                    debug!(generation, "Playback drained");
                    break;
                }

                let progress = PlaybackProgress {
                    position: cursor.position(),
                    duration: cursor.duration(),
                };
                let handler = lock(&handlers).playback_progress.clone();
                if let Some(handler) = handler {
                    handler(progress);
                }
            }
        })
    }
}

#[async_trait]
impl AudioDevice for CpalDevice {
    #[instrument(skip(self))]
    async fn start_recorder(&self) -> DeviceResult<String> {
        let mut slot = lock(&self.recorder);
        if slot.is_some() {
            return Err(DeviceError::new("Recorder already running"));
        }

        let mut capturer = AudioCapturer::new(self.settings.input_device.as_deref())?;
        capturer.start()?;

        let path = self
            .settings
            .recordings_dir
            .join(format!("{}.wav", Uuid::new_v4()));
        let ticker = self.spawn_record_ticker(capturer.meter(), capturer.sample_rate());
        let handle = path.to_string_lossy().into_owned();

        *slot = Some(ActiveRecorder {
            capturer,
            path,
            ticker,
        });

        info!(path = %handle, "Recorder started");

        Ok(handle)
    }

    #[instrument(skip(self))]
    async fn stop_recorder(&self) -> DeviceResult<()> {
        let (samples, sample_rate, path) = {
            let active = lock(&self.recorder).take();
            let Some(mut active) = active else {
                return Err(DeviceError::new("Recorder is not running"));
            };
            active.ticker.abort();
            let samples = active.capturer.stop()?;
            (samples, active.capturer.sample_rate(), active.path)
        };

        let written_path = path.clone();
        tokio::task::spawn_blocking(move || write_clip(&written_path, &samples, sample_rate))
            .await
            .map_err(|e| DeviceError::new(format!("Clip writer task failed: {}", e)))??;

        info!(path = ?path, "Recorder stopped");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn start_player(&self, path: &str) -> DeviceResult<()> {
        let clip_path = PathBuf::from(path);
        let output = self.settings.output_device.clone();

        let player = tokio::task::spawn_blocking(move || {
            let clip = read_clip(&clip_path)?;
            AudioPlayer::start(output.as_deref(), clip)
        })
        .await
        .map_err(|e| DeviceError::new(format!("Player task failed: {}", e)))??;

        let generation = self.player_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let ticker = self.spawn_playback_ticker(player.cursor(), generation);

        let previous = lock(&self.player).replace(ActivePlayer {
            _player: player,
            ticker,
            generation,
        });
        if let Some(previous) = previous {
            warn!("Replacing a playback that was still running");
            previous.ticker.abort();
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop_player(&self) -> DeviceResult<()> {
        let active = lock(&self.player).take();
        match active {
            Some(active) => {
                active.ticker.abort();
                info!("Player stopped");
            }
            None => debug!("Player already idle"),
        }
        Ok(())
    }

    fn subscribe_record_progress(&self, handler: RecordProgressHandler) {
        lock(&self.handlers).record_progress = Some(handler);
    }

    fn unsubscribe_record_progress(&self) {
        lock(&self.handlers).record_progress = None;
    }

    fn subscribe_playback_progress(&self, handler: PlaybackProgressHandler) {
        lock(&self.handlers).playback_progress = Some(handler);
    }

    fn unsubscribe_playback_progress(&self) {
        lock(&self.handlers).playback_progress = None;
    }

    fn subscribe_playback_finished(&self, handler: PlaybackFinishedHandler) {
        lock(&self.handlers).playback_finished = Some(handler);
    }

    fn unsubscribe_playback_finished(&self) {
        lock(&self.handlers).playback_finished = None;
    }

    fn set_metering_interval(&self, interval: Duration) {
        let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1);
        self.metering_interval_ms.store(millis, Ordering::Relaxed);
    }
}
