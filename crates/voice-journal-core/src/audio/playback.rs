use crate::{
    DeviceError, DeviceResult,
    audio::{clip::Clip, frames_to_duration, resampler::resample_clip},
};

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use tracing::{error, info, instrument};

fn select_output_device(name: Option<&str>) -> DeviceResult<Device> {
    let host = cpal::default_host();

    match name {
        None => host
            .default_output_device()
            .ok_or_else(|| DeviceError::new("No output device found")),
        Some(wanted) => host
            .output_devices()
            .map_err(|e| DeviceError::new(format!("Failed to enumerate outputs: {}", e)))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| DeviceError::new(format!("Output device not found: {}", wanted))),
    }
}

/// Read position into a clip, shared with the output callback.
#[derive(Debug)]
pub(crate) struct PlaybackCursor {
    samples: Vec<f32>,
    sample_rate: u32,
    position: AtomicUsize,
    drained: AtomicBool,
}

impl PlaybackCursor {
    pub(crate) fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate: sample_rate.max(1),
            position: AtomicUsize::new(0),
            drained: AtomicBool::new(false),
        }
    }

    /// Fill interleaved output frames, copying each mono sample to every
    /// channel. Silence once the clip is exhausted.
    pub(crate) fn fill(&self, data: &mut [f32], channels: usize) {
        let mut position = self.position.load(Ordering::Acquire);

        for frame in data.chunks_mut(channels.max(1)) {
            let sample = self.samples.get(position).copied().unwrap_or(0.0);
            frame.fill(sample);
            if position < self.samples.len() {
                position += 1;
            }
        }

        self.position.store(position, Ordering::Release);
        if position >= self.samples.len() {
            self.drained.store(true, Ordering::Release);
        }
    }

    pub(crate) fn position(&self) -> Duration {
        frames_to_duration(self.position.load(Ordering::Acquire) as u64, self.sample_rate)
    }

    pub(crate) fn duration(&self) -> Duration {
        frames_to_duration(self.samples.len() as u64, self.sample_rate)
    }

    pub(crate) fn is_drained(&self) -> bool {
        self.drained.load(Ordering::Acquire)
    }
}

/// A clip playing on one output device. Dropping it stops output.
pub(crate) struct AudioPlayer {
    _stream: Stream,
    cursor: Arc<PlaybackCursor>,
}

impl AudioPlayer {
    #[instrument(skip(clip))]
    pub(crate) fn start(output_device: Option<&str>, clip: Clip) -> DeviceResult<Self> {
        let device = select_output_device(output_device)?;

        let supported = device
            .default_output_config()
            .map_err(|e| DeviceError::new(format!("Failed to get output config: {}", e)))?;
        let config: StreamConfig = supported.into();
        let channels = usize::from(config.channels.max(1));

        let samples = resample_clip(clip.samples, clip.sample_rate, config.sample_rate)?;
        let cursor = Arc::new(PlaybackCursor::new(samples, config.sample_rate));
        let callback_cursor = Arc::clone(&cursor);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback_cursor.fill(data, channels);
                },
                |err| {
                    error!("Audio output stream error: {}", err);
                },
                None,
            )
            .map_err(|e| DeviceError::new(format!("Failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| DeviceError::new(format!("Failed to start output stream: {}", e)))?;

        info!(
            device_id = ?device.id(),
            sample_rate = config.sample_rate,
            channels,
            duration_ms = cursor.duration().as_millis(),
            "Playback started"
        );

        Ok(Self {
            _stream: stream,
            cursor,
        })
    }

    pub(crate) fn cursor(&self) -> Arc<PlaybackCursor> {
        Arc::clone(&self.cursor)
    }
}
