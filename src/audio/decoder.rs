//! Audio clip decoding using the `symphonia` crate.
//!
//! Gallery tracks are short ambient loops, so a clip is decoded completely
//! into memory before playback instead of being streamed.

use std::io::{Cursor, Error as StdError, ErrorKind::UnexpectedEof};

use {
    symphonia::{
        core::{
            audio::SampleBuffer,
            codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions},
            errors::Error as SymphoniaError,
            formats::{FormatOptions, FormatReader},
            io::{MediaSourceStream, MediaSourceStreamOptions},
            meta::MetadataOptions,
            probe::Hint,
        },
        default::{get_codecs, get_probe},
    },
    thiserror::Error,
    tracing::{debug, warn},
};

/// Sample rate assumed when the container does not declare one.
const FALLBACK_SAMPLE_RATE: u32 = 44_100;

/// Error type for audio decoding operations.
#[derive(Error, Debug)]
pub enum DecoderError {
    /// Failed to read the audio data.
    #[error("IO error: {0}")]
    IoError(#[from] StdError),
    /// Symphonia decoding error.
    #[error("Decoding error: {0}")]
    SymphoniaError(#[from] SymphoniaError),
    /// No audio track found in the container.
    #[error("No audio track found")]
    NoAudioTrack,
    /// The track decoded to zero samples.
    #[error("Audio stream contains no samples")]
    EmptyStream,
}

/// Fully decoded, interleaved PCM clip.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    /// Interleaved samples in `-1.0..=1.0`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: usize,
}

impl DecodedClip {
    /// Number of frames (samples per channel).
    #[must_use]
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    /// Clip duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        let frames = u64::try_from(self.frames()).unwrap_or(u64::MAX);
        frames.saturating_mul(1000) / u64::from(self.sample_rate)
    }
}

/// Decoder over an in-memory encoded clip.
pub struct AudioDecoder {
    /// The underlying format reader.
    format_reader: Box<dyn FormatReader>,
    /// The active codec decoder.
    decoder: Box<dyn Decoder>,
    /// Id of the selected audio track.
    track_id: u32,
    /// Sample rate declared by the container, if any.
    declared_rate: Option<u32>,
}

impl AudioDecoder {
    /// Probes `bytes` and prepares a decoder for the first audio track.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Encoded audio data.
    /// * `extension` - Optional file extension used as a format hint.
    ///
    /// # Errors
    ///
    /// Returns `DecoderError` if the format is not recognised or the container
    /// has no decodable audio track.
    pub fn from_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<Self, DecoderError> {
        let mss = MediaSourceStream::new(
            Box::new(Cursor::new(bytes)),
            MediaSourceStreamOptions::default(),
        );

        let mut hint = Hint::new();
        if let Some(extension) = extension {
            hint.with_extension(extension);
        }

        let probed = get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecoderError::NoAudioTrack)?;

        let track_id = track.id;
        let declared_rate = track.codec_params.sample_rate;
        let decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        Ok(Self {
            format_reader,
            decoder,
            track_id,
            declared_rate,
        })
    }

    /// Decodes every remaining packet into one interleaved clip.
    ///
    /// Corrupt packets are skipped.
    ///
    /// # Errors
    ///
    /// Returns `DecoderError` on unrecoverable read or codec failures, or
    /// `DecoderError::EmptyStream` if nothing could be decoded.
    pub fn decode_to_end(mut self) -> Result<DecodedClip, DecoderError> {
        let mut samples = Vec::new();
        let mut sample_rate = self.declared_rate;
        let mut channels = None;
        let mut skipped_packets = 0_usize;

        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == UnexpectedEof => break,
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate.get_or_insert(spec.rate);
                    channels.get_or_insert(spec.channels.count());

                    let capacity = u64::try_from(decoded.capacity()).unwrap_or(u64::MAX);
                    let mut buffer = SampleBuffer::<f32>::new(capacity, spec);
                    buffer.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buffer.samples());
                }
                Err(SymphoniaError::DecodeError(reason)) => {
                    skipped_packets += 1;
                    warn!("Skipping corrupt packet: {reason}");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let channels = channels.unwrap_or(0);
        if samples.is_empty() || channels == 0 {
            return Err(DecoderError::EmptyStream);
        }

        let clip = DecodedClip {
            samples,
            sample_rate: sample_rate.unwrap_or(FALLBACK_SAMPLE_RATE),
            channels,
        };
        debug!(
            frames = clip.frames(),
            sample_rate = clip.sample_rate,
            channels = clip.channels,
            skipped_packets,
            "Decoded clip"
        );
        Ok(clip)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Error, ErrorKind::NotFound};

    use crate::audio::decoder::{AudioDecoder, DecodedClip, DecoderError};

    /// Minimal 16-bit PCM WAV file.
    fn wav_bytes(sample_rate: u32, channels: u16, frames: &[i16]) -> Vec<u8> {
        let data_len = u32::try_from(frames.len() * 2).unwrap();
        let block_align = channels * 2;
        let byte_rate = sample_rate * u32::from(block_align);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16_u32.to_le_bytes());
        bytes.extend_from_slice(&1_u16.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&byte_rate.to_le_bytes());
        bytes.extend_from_slice(&block_align.to_le_bytes());
        bytes.extend_from_slice(&16_u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for sample in frames {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_decode_wav_clip() {
        let samples: Vec<i16> = (0..800).map(|i| if i % 2 == 0 { 8192 } else { -8192 }).collect();
        let bytes = wav_bytes(8000, 2, &samples);

        let clip = AudioDecoder::from_bytes(bytes, Some("wav"))
            .unwrap()
            .decode_to_end()
            .unwrap();

        assert_eq!(clip.sample_rate, 8000);
        assert_eq!(clip.channels, 2);
        assert_eq!(clip.frames(), 400);
        assert_eq!(clip.duration_ms(), 50);
        assert!((clip.samples[0] - 0.25).abs() < 0.01);
        assert!((clip.samples[1] + 0.25).abs() < 0.01);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let result = AudioDecoder::from_bytes(vec![0x42; 512], None);
        assert!(result.is_err());
    }

    #[test]
    fn test_clip_frame_math() {
        let clip = DecodedClip {
            samples: vec![0.0; 48_000 * 2],
            sample_rate: 48_000,
            channels: 2,
        };
        assert_eq!(clip.frames(), 48_000);
        assert_eq!(clip.duration_ms(), 1000);

        let empty = DecodedClip {
            samples: Vec::new(),
            sample_rate: 0,
            channels: 0,
        };
        assert_eq!(empty.frames(), 0);
        assert_eq!(empty.duration_ms(), 0);
    }

    #[test]
    fn test_decoder_error_display() {
        let io_error = Error::new(NotFound, "File not found");
        let decoder_error = DecoderError::IoError(io_error);
        assert!(decoder_error.to_string().contains("IO error"));
        assert_eq!(
            DecoderError::EmptyStream.to_string(),
            "Audio stream contains no samples"
        );
    }
}
