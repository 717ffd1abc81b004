use crate::{DeviceError, DeviceResult};

use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};
use tracing::{debug, instrument};

const CHUNK_FRAMES: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Convert a whole mono clip from `input_rate` to `output_rate`.
///
/// Clips that already match the output rate are returned untouched. The
/// resampler's output delay is skipped and its tail flushed with silence,
/// so the result lines up with the input and has the expected length.
#[instrument(skip(samples))]
pub(crate) fn resample_clip(
    samples: Vec<f32>,
    input_rate: u32,
    output_rate: u32,
) -> DeviceResult<Vec<f32>> {
    if input_rate == output_rate || samples.is_empty() {
        return Ok(samples);
    }

    let mut resampler = Fft::<f32>::new(
        input_rate as usize,
        output_rate as usize,
        CHUNK_FRAMES,
        SUB_CHUNKS,
        1,
        FixedSync::Input,
    )
    .map_err(|e| DeviceError::new(format!("Failed to create resampler: {}", e)))?;

    let expected_len =
        (samples.len() as f64 * f64::from(output_rate) / f64::from(input_rate)) as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected_len + delay);
    let mut scratch = vec![0.0f32; resampler.output_frames_max()];
    let mut chunks = samples.chunks(CHUNK_FRAMES);

    // Keep feeding silence past the end until the delayed tail is out.
    while output.len() < expected_len + delay {
        let mut input_chunk = chunks.next().map(<[f32]>::to_vec).unwrap_or_default();
        input_chunk.resize(CHUNK_FRAMES, 0.0);

        let input = InterleavedSlice::new(&input_chunk, 1, CHUNK_FRAMES)
            .map_err(|e| DeviceError::new(format!("Failed to wrap resampler input: {}", e)))?;

        let scratch_frames = scratch.len();
        let mut out = InterleavedSlice::new_mut(&mut scratch, 1, scratch_frames)
            .map_err(|e| DeviceError::new(format!("Failed to wrap resampler output: {}", e)))?;

        let (_consumed, written) = resampler
            .process_into_buffer(&input, &mut out, None)
            .map_err(|e| DeviceError::new(format!("Resampling failed: {}", e)))?;

        if written == 0 {
            break;
        }
        output.extend_from_slice(&scratch[..written]);
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected_len);

    debug!(
        input_len = samples.len(),
        output_len = output.len(),
        input_rate,
        output_rate,
        delay,
        "Clip resampled for playback"
    );

    Ok(output)
}
