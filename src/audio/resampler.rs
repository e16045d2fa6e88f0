//! Sample rate and channel layout conversion for decoded clips.
//!
//! The output device dictates both sample rate and channel count, so every
//! clip is converted once after decoding using the `rubato` crate.

use {
    rubato::{FftFixedIn, Resampler},
    thiserror::Error,
    tracing::debug,
};

use crate::audio::decoder::DecodedClip;

/// Error type for resampling operations.
#[derive(Error, Debug)]
pub enum ResamplingError {
    /// Rubato resampling error.
    #[error("Rubato error: {0}")]
    RubatoError(String),
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Offline resampler over planar buffers.
pub struct AudioResampler {
    /// Rubato resampler instance.
    resampler: FftFixedIn<f32>,
    /// Source sample rate in Hz.
    source_rate: u32,
    /// Target sample rate in Hz.
    target_rate: u32,
    /// Number of channels.
    channels: usize,
    /// Fixed input chunk size per channel expected by rubato.
    chunk_size: usize,
}

impl AudioResampler {
    /// Creates a new audio resampler.
    ///
    /// # Errors
    ///
    /// Returns `ResamplingError` if the resampler cannot be created or if rates are invalid.
    pub fn new(
        source_rate: u32,
        target_rate: u32,
        channels: usize,
    ) -> Result<Self, ResamplingError> {
        if source_rate == 0 || target_rate == 0 {
            return Err(ResamplingError::InvalidConfiguration(
                "Sample rates must be greater than 0".to_string(),
            ));
        }

        if source_rate == target_rate {
            return Err(ResamplingError::InvalidConfiguration(
                "Source and target rates must be different".to_string(),
            ));
        }

        if channels == 0 {
            return Err(ResamplingError::InvalidConfiguration(
                "Channel count must be greater than 0".to_string(),
            ));
        }

        let chunk_size = calculate_chunk_size(source_rate, target_rate);

        let resampler = FftFixedIn::<f32>::new(
            source_rate as usize,
            target_rate as usize,
            chunk_size,
            1,
            channels,
        )
        .map_err(|e| ResamplingError::RubatoError(e.to_string()))?;

        debug!(
            "Created resampler: {} Hz -> {} Hz, {} channels, chunk size: {}",
            source_rate, target_rate, channels, chunk_size
        );

        Ok(Self {
            resampler,
            source_rate,
            target_rate,
            channels,
            chunk_size,
        })
    }

    /// Resamples a whole interleaved buffer, flushing the filter tail.
    ///
    /// The returned buffer is trimmed to the length implied by the rate ratio,
    /// with the filter delay removed from the front.
    ///
    /// # Errors
    ///
    /// Returns `ResamplingError` if rubato rejects a chunk.
    pub fn resample_all(&mut self, interleaved: &[f32]) -> Result<Vec<f32>, ResamplingError> {
        let ch = self.channels;
        let input_frames = interleaved.len() / ch;
        if input_frames == 0 {
            return Ok(Vec::new());
        }

        let mut planar_out: Vec<Vec<f32>> = vec![Vec::new(); ch];

        for chunk in interleaved[..input_frames * ch].chunks(self.chunk_size * ch) {
            let planar_in = deinterleave(chunk, ch);
            let produced = if chunk.len() == self.chunk_size * ch {
                self.resampler.process(&planar_in, None)
            } else {
                self.resampler.process_partial(Some(planar_in.as_slice()), None)
            };
            let produced = produced.map_err(|e| ResamplingError::RubatoError(e.to_string()))?;
            append_planar(&mut planar_out, produced);
        }

        let delay = self.resampler.output_delay();
        let expected = self.expected_output_size(input_frames);
        while planar_out[0].len() < expected + delay {
            let produced = self
                .resampler
                .process_partial::<Vec<f32>>(None, None)
                .map_err(|e| ResamplingError::RubatoError(e.to_string()))?;
            if produced.first().is_none_or(Vec::is_empty) {
                break;
            }
            append_planar(&mut planar_out, produced);
        }

        for plane in &mut planar_out {
            let start = delay.min(plane.len());
            plane.drain(..start);
            plane.truncate(expected);
        }

        Ok(interleave(&planar_out))
    }

    /// Gets the expected output size (per channel) for a given input size.
    #[must_use]
    pub fn expected_output_size(&self, input_size: usize) -> usize {
        let in_rate = u64::from(self.source_rate);
        let out_rate = u64::from(self.target_rate);
        ((input_size as u64 * out_rate) / in_rate) as usize
    }
}

/// Converts `clip` to `target_rate`, returning it unchanged when the rates match.
///
/// # Errors
///
/// Returns `ResamplingError` if the clip cannot be resampled.
pub fn resample(clip: DecodedClip, target_rate: u32) -> Result<DecodedClip, ResamplingError> {
    if clip.sample_rate == target_rate {
        return Ok(clip);
    }

    let mut resampler = AudioResampler::new(clip.sample_rate, target_rate, clip.channels)?;
    let samples = resampler.resample_all(&clip.samples)?;

    Ok(DecodedClip {
        samples,
        sample_rate: target_rate,
        channels: clip.channels,
    })
}

/// Maps `clip` onto `channels` output channels.
///
/// Mono is duplicated to every output channel, a mono target averages all
/// inputs, and other layouts wrap source channels round-robin.
///
/// # Errors
///
/// Returns `ResamplingError::InvalidConfiguration` for a zero channel count.
pub fn remix(clip: DecodedClip, channels: usize) -> Result<DecodedClip, ResamplingError> {
    if channels == 0 || clip.channels == 0 {
        return Err(ResamplingError::InvalidConfiguration(
            "Channel count must be greater than 0".to_string(),
        ));
    }

    if clip.channels == channels {
        return Ok(clip);
    }

    let source_channels = clip.channels;
    let mut samples = Vec::with_capacity(clip.frames() * channels);
    for frame in clip.samples.chunks_exact(source_channels) {
        if channels == 1 {
            samples.push(frame.iter().sum::<f32>() / source_channels as f32);
        } else {
            samples.extend((0..channels).map(|c| frame[c % source_channels]));
        }
    }

    Ok(DecodedClip {
        samples,
        sample_rate: clip.sample_rate,
        channels,
    })
}

/// Calculates an appropriate chunk size for resampling based on sample rates.
fn calculate_chunk_size(source_rate: u32, target_rate: u32) -> usize {
    let gcd = gcd(source_rate, target_rate);
    let lcm = (u64::from(source_rate) * u64::from(target_rate)) / u64::from(gcd);
    let base_chunk = (lcm / u64::from(source_rate)).min(4096) as usize;
    base_chunk.clamp(256, 8192)
}

/// Calculates the greatest common divisor of two numbers.
fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn deinterleave(interleaved: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = interleaved.len() / channels;
    let mut planar: Vec<Vec<f32>> = (0..channels).map(|_| Vec::with_capacity(frames)).collect();
    for frame in interleaved.chunks_exact(channels) {
        for (c, plane) in planar.iter_mut().enumerate() {
            plane.push(frame[c]);
        }
    }
    planar
}

fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let frames = planar.iter().map(Vec::len).min().unwrap_or(0);
    let mut interleaved = Vec::with_capacity(frames * planar.len());
    for i in 0..frames {
        interleaved.extend(planar.iter().map(|plane| plane[i]));
    }
    interleaved
}

fn append_planar(target: &mut [Vec<f32>], produced: Vec<Vec<f32>>) {
    for (plane, chunk) in target.iter_mut().zip(produced) {
        plane.extend(chunk);
    }
}

#[cfg(test)]
mod tests {
    use crate::audio::{
        decoder::DecodedClip,
        resampler::{AudioResampler, ResamplingError, gcd, remix, resample},
    };

    fn sine_clip(sample_rate: u32, channels: usize, frames: usize) -> DecodedClip {
        let samples = (0..frames)
            .flat_map(|i| {
                let t = i as f32 / sample_rate as f32;
                let value = (t * 440.0 * std::f32::consts::TAU).sin() * 0.5;
                std::iter::repeat_n(value, channels)
            })
            .collect();
        DecodedClip {
            samples,
            sample_rate,
            channels,
        }
    }

    #[test]
    fn test_resampler_creation() {
        assert!(AudioResampler::new(44_100, 48_000, 2).is_ok());
        assert!(AudioResampler::new(96_000, 48_000, 2).is_ok());
    }

    #[test]
    fn test_invalid_resampler_creation() {
        assert!(matches!(
            AudioResampler::new(0, 48_000, 2),
            Err(ResamplingError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            AudioResampler::new(44_100, 44_100, 2),
            Err(ResamplingError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            AudioResampler::new(44_100, 48_000, 0),
            Err(ResamplingError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_resample_preserves_duration() {
        let clip = sine_clip(44_100, 2, 44_100);
        let resampled = resample(clip, 48_000).unwrap();

        assert_eq!(resampled.sample_rate, 48_000);
        assert_eq!(resampled.channels, 2);
        assert!(resampled.frames().abs_diff(48_000) <= 1);
    }

    #[test]
    fn test_downsample_short_clip() {
        let clip = sine_clip(48_000, 1, 1000);
        let resampled = resample(clip, 24_000).unwrap();
        assert!(resampled.frames().abs_diff(500) <= 1);
    }

    #[test]
    fn test_matching_rate_is_untouched() {
        let clip = sine_clip(48_000, 2, 128);
        let resampled = resample(clip.clone(), 48_000).unwrap();
        assert_eq!(resampled, clip);
    }

    #[test]
    fn test_remix_mono_to_stereo() {
        let clip = DecodedClip {
            samples: vec![0.1, 0.2, 0.3],
            sample_rate: 48_000,
            channels: 1,
        };
        let stereo = remix(clip, 2).unwrap();
        assert_eq!(stereo.samples, vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
    }

    #[test]
    fn test_remix_stereo_to_mono() {
        let clip = DecodedClip {
            samples: vec![0.2, 0.4, -0.5, 0.5],
            sample_rate: 48_000,
            channels: 2,
        };
        let mono = remix(clip, 1).unwrap();
        assert_eq!(mono.channels, 1);
        assert!((mono.samples[0] - 0.3).abs() < f32::EPSILON);
        assert!(mono.samples[1].abs() < f32::EPSILON);
    }

    #[test]
    fn test_remix_rejects_zero_channels() {
        let clip = sine_clip(48_000, 2, 16);
        assert!(remix(clip, 0).is_err());
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(44_100, 48_000), 300);
        assert_eq!(gcd(48_000, 96_000), 48_000);
    }
}
