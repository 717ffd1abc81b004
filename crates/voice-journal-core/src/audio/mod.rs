pub(crate) mod capture;
pub(crate) mod clip;
mod cpal_device;
mod device;
mod permission;
pub(crate) mod playback;
pub(crate) mod resampler;

use std::time::Duration;

pub use {
    cpal_device::{CpalDevice, CpalDeviceSettings},
    device::{
        AudioDevice, PlaybackFinishedHandler, PlaybackProgress, PlaybackProgressHandler,
        RecordProgress, RecordProgressHandler,
    },
    permission::{AlwaysGranted, CpalPermissionGate, PermissionGate},
};

/// Exact length of `frames` mono frames at `sample_rate`.
pub(crate) fn frames_to_duration(frames: u64, sample_rate: u32) -> Duration {
    let rate = u64::from(sample_rate.max(1));
    Duration::from_secs(frames / rate)
        + Duration::from_nanos((frames % rate) * 1_000_000_000 / rate)
}
