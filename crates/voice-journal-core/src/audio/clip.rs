//! WAV storage for journal clips.

use crate::{DeviceError, DeviceResult};

use std::{fs, path::Path};

use tracing::{debug, instrument};

/// Decoded mono clip.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Clip {
    pub(crate) samples: Vec<f32>,
    pub(crate) sample_rate: u32,
}

/// Write mono samples as a 32-bit float WAV, creating parent directories.
#[instrument(skip(samples))]
pub(crate) fn write_clip(path: &Path, samples: &[f32], sample_rate: u32) -> DeviceResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| DeviceError::new(format!("Failed to create {:?}: {}", parent, e)))?;
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| DeviceError::new(format!("Failed to create clip: {}", e)))?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| DeviceError::new(format!("Failed to write clip: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| DeviceError::new(format!("Failed to finalize clip: {}", e)))?;

    debug!(sample_count = samples.len(), "Clip written");

    Ok(())
}

/// Read a WAV clip, downmixing to mono and normalizing integer formats.
#[instrument]
pub(crate) fn read_clip(path: &Path) -> DeviceResult<Clip> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| DeviceError::new(format!("Failed to open clip {:?}: {}", path, e)))?;

    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| DeviceError::new(format!("Failed to decode clip: {}", e)))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| DeviceError::new(format!("Failed to decode clip: {}", e)))?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    debug!(
        sample_count = samples.len(),
        sample_rate = spec.sample_rate,
        "Clip read"
    );

    Ok(Clip {
        samples,
        sample_rate: spec.sample_rate,
    })
}
