use crate::{DeviceError, DeviceResult, audio::frames_to_duration};

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
        {Arc, Mutex},
    },
    time::Duration,
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use tracing::{debug, error, info, instrument};

/// Maximum samples to buffer (5 minutes at 48kHz mono).
/// Prevents unbounded memory growth during long recordings.
///
/// **Memory footprint at max capacity:**
/// - 48,000 Hz * 60s * 5 min * 4 bytes/f32 = ~58MB
/// - This is a hard upper bound; journal notes are far shorter
pub(crate) const MAX_BUFFER_SAMPLES: usize = 48_000 * 60 * 5;

/// Resolve an input device by name, or the host default.
pub(crate) fn select_input_device(name: Option<&str>) -> DeviceResult<Device> {
    let host = cpal::default_host();

    match name {
        None => host
            .default_input_device()
            .ok_or_else(|| DeviceError::new("No microphone found")),
        Some(wanted) => host
            .input_devices()
            .map_err(|e| DeviceError::new(format!("Failed to enumerate inputs: {}", e)))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| DeviceError::new(format!("Input device not found: {}", wanted))),
    }
}

/// Level and length counters shared between the capture callback and the
/// progress ticker.
#[derive(Debug, Default)]
pub(crate) struct CaptureMeter {
    frames: AtomicU64,
    peak_bits: AtomicU32,
}

impl CaptureMeter {
    pub(crate) fn record(&self, frames: u64, peak: f32) {
        self.frames.fetch_add(frames, Ordering::Relaxed);
        let _ = self
            .peak_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                (peak > f32::from_bits(bits)).then_some(peak.to_bits())
            });
    }

    fn reset(&self) {
        self.frames.store(0, Ordering::Relaxed);
        self.peak_bits.store(0, Ordering::Relaxed);
    }

    /// Captured length at the given sample rate.
    pub(crate) fn elapsed(&self, sample_rate: u32) -> Duration {
        let frames = self.frames.load(Ordering::Relaxed);
        frames_to_duration(frames, sample_rate)
    }

    /// Peak level since the previous call.
    pub(crate) fn take_peak(&self) -> f32 {
        f32::from_bits(self.peak_bits.swap(0, Ordering::Relaxed))
    }
}

/// Mono capture from one input device into a bounded ring buffer.
pub(crate) struct AudioCapturer {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    samples: Arc<Mutex<VecDeque<f32>>>,
    meter: Arc<CaptureMeter>,
    /// Signals the audio callback to stop writing. Set to `true` before
    /// dropping the stream so no in-flight callback writes after the lock
    /// is acquired in `stop()`.
    shutdown: Arc<AtomicBool>,
}

impl AudioCapturer {
    #[instrument]
    pub(crate) fn new(input_device: Option<&str>) -> DeviceResult<Self> {
        let device = select_input_device(input_device)?;

        let config = device
            .default_input_config()
            .map_err(|e| DeviceError::new(format!("Failed to get config: {}", e)))?;

        info!(
            device_id = ?device.id(),
            sample_rate = config.sample_rate(),
            channels = config.channels(),
            "AudioCapturer initialized"
        );

        Ok(Self {
            device,
            config: config.into(),
            stream: None,
            samples: Arc::new(Mutex::new(VecDeque::new())),
            meter: Arc::new(CaptureMeter::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    #[instrument(skip(self))]
    pub(crate) fn start(&mut self) -> DeviceResult<()> {
        let samples = Arc::clone(&self.samples);
        let shutdown = Arc::clone(&self.shutdown);
        let meter = Arc::clone(&self.meter);
        let channels = usize::from(self.config.channels.max(1));

        self.shutdown.store(false, Ordering::Release);
        self.meter.reset();

        samples
            .lock()
            .map_err(|e| DeviceError::new(format!("Failed to lock samples: {}", e)))?
            .clear();

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    let mut peak = 0.0f32;
                    let mut buf = samples.lock().unwrap_or_else(|e| {
                        error!("Sample buffer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    // Downmix interleaved frames to mono.
                    for frame in data.chunks(channels) {
                        let mono = frame.iter().sum::<f32>() / frame.len() as f32;
                        peak = peak.max(mono.abs());
                        buf.push_back(mono);
                    }
                    while buf.len() > MAX_BUFFER_SAMPLES {
                        buf.pop_front();
                    }
                    drop(buf);
                    meter.record((data.len() / channels) as u64, peak);
                },
                |err| {
                    error!("Audio input stream error: {}", err);
                },
                None,
            )
            .map_err(|e| DeviceError::new(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| DeviceError::new(format!("Failed to start input stream: {}", e)))?;

        self.stream = Some(stream);
        info!("Audio capture started");

        Ok(())
    }

    #[instrument(skip(self))]
    pub(crate) fn stop(&mut self) -> DeviceResult<Vec<f32>> {
        self.shutdown.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            drop(stream);
            // Let a callback that raced the flag finish before draining.
            std::thread::sleep(Duration::from_millis(5));
            info!("Audio capture stopped");
        }

        let samples: Vec<f32> = self
            .samples
            .lock()
            .map_err(|e| DeviceError::new(format!("Failed to lock samples: {}", e)))?
            .drain(..)
            .collect();

        debug!(sample_count = samples.len(), "Captured audio samples");

        Ok(samples)
    }

    pub(crate) fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub(crate) fn meter(&self) -> Arc<CaptureMeter> {
        Arc::clone(&self.meter)
    }
}
