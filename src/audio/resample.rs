//! Sample-rate conversion using rubato
//!
//! Used to force a configured output sample rate on a finished clip.

use crate::types::StereoBuffer;
use rubato::{FftFixedInOut, Resampler};
use tracing::debug;

/// Resample both channels of a clip to `to_rate`
pub fn resample_stereo(clip: StereoBuffer, to_rate: u32) -> StereoBuffer {
    if clip.sample_rate == to_rate || to_rate == 0 || clip.sample_rate == 0 {
        return clip;
    }
    debug!("Resampling clip {}Hz -> {}Hz", clip.sample_rate, to_rate);
    let left = resample(&clip.left, clip.sample_rate, to_rate);
    let right = resample(&clip.right, clip.sample_rate, to_rate);
    StereoBuffer::new(left, right, to_rate)
}

/// FFT-based resampling of a single channel
///
/// Falls back to linear interpolation if rubato cannot be initialized
/// for the given rate pair.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    const CHUNK_SIZE: usize = 1024;

    let mut resampler =
        match FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 1) {
            Ok(r) => r,
            Err(e) => {
                debug!("Rubato initialization failed ({}), using fallback", e);
                return resample_linear_fallback(samples, from_rate, to_rate);
            }
        };

    let input_frames_per_chunk = resampler.input_frames_next();
    let output_frames_per_chunk = resampler.output_frames_next();
    let delay = resampler.output_delay();

    let ratio = to_rate as f64 / from_rate as f64;
    let expected_len = (samples.len() as f64 * ratio).round() as usize;
    let needed = expected_len + delay;
    let mut output = Vec::with_capacity(needed + output_frames_per_chunk);

    // Keep feeding zero chunks past the input until the delayed tail is out
    let mut pos = 0;
    while output.len() < needed {
        let mut chunk = if pos < samples.len() {
            let end = (pos + input_frames_per_chunk).min(samples.len());
            samples[pos..end].to_vec()
        } else {
            Vec::new()
        };
        chunk.resize(input_frames_per_chunk, 0.0);

        match resampler.process(&[chunk], None) {
            Ok(resampled) => match resampled.first() {
                Some(channel) if !channel.is_empty() => {
                    let take = output_frames_per_chunk.min(channel.len());
                    output.extend_from_slice(&channel[..take]);
                }
                _ => {
                    debug!("Rubato produced no output, using fallback");
                    return resample_linear_fallback(samples, from_rate, to_rate);
                }
            },
            Err(e) => {
                debug!("Rubato processing error ({}), using fallback", e);
                return resample_linear_fallback(samples, from_rate, to_rate);
            }
        }

        pos += input_frames_per_chunk;
    }

    // Align with the input, then drop what the zero padding produced
    output.drain(..delay.min(output.len()));
    output.truncate(expected_len);
    output
}

/// Fallback linear interpolation resampler
fn resample_linear_fallback(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 * ratio;
        let src_idx = src_pos as usize;
        let frac = src_pos - src_idx as f64;

        let sample = if src_idx + 1 < samples.len() {
            samples[src_idx] * (1.0 - frac as f32) + samples[src_idx + 1] * frac as f32
        } else {
            samples[src_idx.min(samples.len() - 1)]
        };

        output.push(sample);
    }

    output
}
