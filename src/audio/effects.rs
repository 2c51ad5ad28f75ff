//! Clip shaping: slicing, channel coercion, gain and fades
//!
//! Millisecond positions are mapped to frames with `ms * rate / 1000`,
//! rounding down.

use crate::types::{AudioBuffer, StereoBuffer};

/// Frame index for a millisecond offset
fn frame_at(ms: u64, sample_rate: u32) -> usize {
    ((ms as u128 * sample_rate as u128) / 1000) as usize
}

/// Cut `[start_ms, start_ms + duration_ms)` out of a buffer
///
/// The end is clamped to the buffer length; a start beyond the end yields
/// an empty buffer.
pub fn slice_ms(buffer: &AudioBuffer, start_ms: u64, duration_ms: u64) -> AudioBuffer {
    let frames = buffer.frames();
    let start = frame_at(start_ms, buffer.sample_rate).min(frames);
    let end = frame_at(start_ms.saturating_add(duration_ms), buffer.sample_rate).min(frames);
    let ch = buffer.channels;
    AudioBuffer::new(
        buffer.samples[start * ch..end * ch].to_vec(),
        ch,
        buffer.sample_rate,
    )
}

/// Coerce any channel layout to stereo
///
/// Mono is duplicated to both sides; extra channels beyond the front pair
/// are dropped.
pub fn to_stereo(buffer: &AudioBuffer) -> StereoBuffer {
    match buffer.channels {
        1 => StereoBuffer::new(
            buffer.samples.clone(),
            buffer.samples.clone(),
            buffer.sample_rate,
        ),
        2 => StereoBuffer::from_interleaved(&buffer.samples, buffer.sample_rate),
        ch => {
            let mut left = Vec::with_capacity(buffer.frames());
            let mut right = Vec::with_capacity(buffer.frames());
            for frame in buffer.samples.chunks_exact(ch) {
                left.push(frame[0]);
                right.push(frame[1]);
            }
            StereoBuffer::new(left, right, buffer.sample_rate)
        }
    }
}

/// RMS level relative to full scale, over both channels
///
/// Silence (or an empty clip) is `-inf`.
pub fn dbfs(clip: &StereoBuffer) -> f64 {
    let count = clip.left.len() + clip.right.len();
    let sum_of_squares: f64 = clip
        .left
        .iter()
        .chain(clip.right.iter())
        .map(|s| (*s as f64) * (*s as f64))
        .sum();
    if count == 0 || sum_of_squares <= 0.0 {
        return f64::NEG_INFINITY;
    }
    20.0 * (sum_of_squares / count as f64).sqrt().log10()
}

/// Apply a uniform gain in decibels
pub fn apply_gain_db(clip: &mut StereoBuffer, gain_db: f64) {
    let factor = 10f64.powf(gain_db / 20.0) as f32;
    for channel in clip.channels_mut() {
        for s in channel.iter_mut() {
            *s *= factor;
        }
    }
}

/// Gain a clip so its level equals `target_dbfs`
///
/// Returns the applied gain, or `None` for silent clips, which are left
/// untouched.
pub fn match_target_dbfs(clip: &mut StereoBuffer, target_dbfs: f64) -> Option<f64> {
    let current = dbfs(clip);
    if !current.is_finite() {
        return None;
    }
    let gain = target_dbfs - current;
    apply_gain_db(clip, gain);
    Some(gain)
}

/// Linear fade from silence over the first `duration_ms`
pub fn fade_in(clip: &mut StereoBuffer, duration_ms: u64) {
    let len = clip.len();
    let fade = frame_at(duration_ms, clip.sample_rate).min(len);
    if fade == 0 {
        return;
    }
    for channel in clip.channels_mut() {
        for (i, s) in channel.iter_mut().take(fade).enumerate() {
            *s *= i as f32 / fade as f32;
        }
    }
}

/// Linear fade to silence over the last `duration_ms`
pub fn fade_out(clip: &mut StereoBuffer, duration_ms: u64) {
    let len = clip.len();
    let fade = frame_at(duration_ms, clip.sample_rate).min(len);
    if fade == 0 {
        return;
    }
    let start = len - fade;
    for channel in clip.channels_mut() {
        for (i, s) in channel[start..].iter_mut().enumerate() {
            *s *= (fade - 1 - i) as f32 / fade as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, channels: usize, rate: u32) -> AudioBuffer {
        let samples = (0..frames * channels).map(|i| (i % 7) as f32 / 10.0).collect();
        AudioBuffer::new(samples, channels, rate)
    }

    #[test]
    fn test_slice_length_is_clamped() {
        // 10 s source at 1 kHz
        let buf = ramp(10_000, 2, 1000);
        assert_eq!(slice_ms(&buf, 2_000, 3_000).duration_ms(), 3_000);
        assert_eq!(slice_ms(&buf, 8_000, 30_000).duration_ms(), 2_000);
        assert_eq!(slice_ms(&buf, 10_000, 30_000).duration_ms(), 0);
        assert_eq!(slice_ms(&buf, 60_000, 30_000).duration_ms(), 0);
    }

    #[test]
    fn test_slice_takes_the_right_frames() {
        let buf = AudioBuffer::new((0..20).map(|i| i as f32).collect(), 2, 1000);
        let sliced = slice_ms(&buf, 3, 2);
        assert_eq!(sliced.samples, vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_mono_becomes_stereo() {
        let buf = AudioBuffer::new(vec![0.1, 0.2, 0.3], 1, 8000);
        let stereo = to_stereo(&buf);
        assert_eq!(stereo.left, vec![0.1, 0.2, 0.3]);
        assert_eq!(stereo.right, stereo.left);
    }

    #[test]
    fn test_surround_keeps_front_pair() {
        let buf = AudioBuffer::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0], 6, 8000);
        let stereo = to_stereo(&buf);
        assert_eq!(stereo.left, vec![1.0, 7.0]);
        assert_eq!(stereo.right, vec![2.0, 8.0]);
    }

    #[test]
    fn test_dbfs_of_full_scale_square_is_zero() {
        let clip = StereoBuffer::new(vec![1.0, -1.0, 1.0, -1.0], vec![1.0; 4], 8000);
        assert!(dbfs(&clip).abs() < 1e-9);
        let silent = StereoBuffer::new(vec![0.0; 4], vec![0.0; 4], 8000);
        assert_eq!(dbfs(&silent), f64::NEG_INFINITY);
    }

    #[test]
    fn test_match_target_hits_level() {
        let left: Vec<f32> = (0..8000).map(|i| (i as f32 * 0.05).sin() * 0.6).collect();
        let mut clip = StereoBuffer::new(left.clone(), left, 8000);
        let gain = match_target_dbfs(&mut clip, -20.0).unwrap();
        assert!(gain < 0.0);
        assert!((dbfs(&clip) + 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_silent_clip_is_not_gained() {
        let mut clip = StereoBuffer::new(vec![0.0; 100], vec![0.0; 100], 8000);
        assert_eq!(match_target_dbfs(&mut clip, -20.0), None);
        assert!(clip.left.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_fades_shape_the_edges() {
        let mut clip = StereoBuffer::new(vec![1.0; 1000], vec![1.0; 1000], 1000);
        fade_in(&mut clip, 100);
        fade_out(&mut clip, 100);
        assert_eq!(clip.left[0], 0.0);
        assert!((clip.left[50] - 0.5).abs() < 1e-6);
        assert_eq!(clip.left[500], 1.0);
        assert_eq!(clip.right[999], 0.0);
        assert!(clip.right[900] > 0.98);
    }

    #[test]
    fn test_fade_longer_than_clip_is_clamped() {
        let mut clip = StereoBuffer::new(vec![1.0; 10], vec![1.0; 10], 1000);
        fade_out(&mut clip, 60_000);
        assert_eq!(clip.left[9], 0.0);
        assert!((clip.left[0] - 0.9).abs() < 1e-6);
    }
}
