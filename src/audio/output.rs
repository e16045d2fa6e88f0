//! Audio output management using the `cpal` crate.
//!
//! Clips are held fully in memory by a [`ClipPlayer`], which the device
//! callback reads from directly.

use std::{
    sync::{
        Arc,
        atomic::{
            AtomicBool, AtomicUsize,
            Ordering::{Acquire, Relaxed, Release},
        },
    },
    time::Duration,
};

use {
    cpal::{
        BuildStreamError, DefaultStreamConfigError, Device, OutputCallbackInfo,
        PauseStreamError, PlayStreamError,
        SampleFormat::{self, F32, I16, U16},
        Stream, StreamConfig, default_host,
        traits::{DeviceTrait, HostTrait},
    },
    num_traits::cast::ToPrimitive,
    thiserror::Error,
    tracing::{debug, error},
};

use crate::audio::{backend::PlaybackStatus, decoder::DecodedClip};

/// Callback timeout handed to the device.
const STREAM_TIMEOUT: Duration = Duration::from_millis(50);

/// Error type for audio output operations.
#[derive(Error, Debug)]
pub enum OutputError {
    /// CPAL stream construction error.
    #[error("Audio output error: {0}")]
    CpalError(#[from] BuildStreamError),
    /// Failed to start audio stream.
    #[error("Failed to start audio stream: {0}")]
    StreamStartError(#[from] PlayStreamError),
    /// Failed to pause audio stream.
    #[error("Failed to pause audio stream: {0}")]
    StreamPauseError(#[from] PauseStreamError),
    /// The device could not report a default configuration.
    #[error("Failed to query output configuration: {0}")]
    ConfigError(#[from] DefaultStreamConfigError),
    /// No suitable audio device found.
    #[error("No suitable audio device found")]
    NoDeviceFound,
    /// Unsupported sample format.
    #[error("Unsupported sample format: {format:?}")]
    UnsupportedSampleFormat { format: SampleFormat },
}

/// In-memory clip shared between the control side and the device callback.
#[derive(Debug)]
pub struct ClipPlayer {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
    looping: bool,
    volume: f32,
    cursor: AtomicUsize,
    playing: AtomicBool,
}

impl ClipPlayer {
    /// Wraps a decoded clip already matched to the output format.
    #[must_use]
    pub fn new(clip: DecodedClip, looping: bool, volume: f32) -> Self {
        Self {
            samples: clip.samples,
            channels: clip.channels.max(1),
            sample_rate: clip.sample_rate,
            looping,
            volume: volume.clamp(0.0, 1.0),
            cursor: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
        }
    }

    /// Returns the next interleaved sample, or silence when paused or finished.
    pub fn next_sample(&self) -> f32 {
        if !self.playing.load(Acquire) || self.samples.is_empty() {
            return 0.0;
        }

        let mut index = self.cursor.fetch_add(1, Relaxed);
        if index >= self.samples.len() {
            if !self.looping {
                self.playing.store(false, Release);
                self.cursor.store(self.samples.len(), Relaxed);
                return 0.0;
            }
            index %= self.samples.len();
            self.cursor.store(index + 1, Relaxed);
        }

        self.samples[index] * self.volume
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Release);
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Acquire)
    }

    /// Moves playback back to the first frame.
    pub fn rewind(&self) {
        self.cursor.store(0, Relaxed);
    }

    /// Playback position of the next frame in milliseconds.
    #[must_use]
    pub fn position_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        let cursor = self.cursor.load(Relaxed).min(self.samples.len());
        let frame = u64::try_from(cursor / self.channels).unwrap_or(u64::MAX);
        frame.saturating_mul(1000) / u64::from(self.sample_rate)
    }

    /// Snapshot for status listeners.
    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            is_loaded: true,
            is_playing: self.is_playing(),
            position_ms: self.position_ms(),
        }
    }

    fn fill<T>(&self, data: &mut [T], convert: impl Fn(f32) -> T) {
        for sample in data.iter_mut() {
            *sample = convert(self.next_sample().clamp(-1.0, 1.0));
        }
    }
}

/// The default output device and its preferred stream format.
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
}

impl AudioOutput {
    /// Opens the default output device of the default host.
    ///
    /// # Errors
    ///
    /// Returns `OutputError` if no device exists or its configuration cannot be queried.
    pub fn new() -> Result<Self, OutputError> {
        let host = default_host();
        let device = host
            .default_output_device()
            .ok_or(OutputError::NoDeviceFound)?;
        let supported = device.default_output_config()?;

        debug!(
            device = %device
                .description()
                .map(|desc| desc.to_string())
                .unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate = supported.sample_rate(),
            channels = supported.channels(),
            "Opened audio output"
        );

        Ok(Self {
            sample_format: supported.sample_format(),
            config: supported.config(),
            device,
        })
    }

    /// Output sample rate in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Number of interleaved output channels.
    #[must_use]
    pub fn channels(&self) -> usize {
        usize::from(self.config.channels)
    }

    /// Builds a stream that pulls samples from `player`.
    ///
    /// The stream is returned paused; the player's own flag gates audibility.
    ///
    /// # Errors
    ///
    /// Returns `OutputError` if stream creation fails.
    pub fn create_stream(&self, player: Arc<ClipPlayer>) -> Result<Stream, OutputError> {
        let err_player = Arc::clone(&player);
        let err_fn = move |err| {
            error!("Audio stream error: {err}");
            err_player.set_playing(false);
        };

        let stream = match self.sample_format {
            F32 => self.device.build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &OutputCallbackInfo| player.fill(data, |value| value),
                err_fn,
                Some(STREAM_TIMEOUT),
            )?,
            I16 => self.device.build_output_stream(
                &self.config,
                move |data: &mut [i16], _: &OutputCallbackInfo| {
                    player.fill(data, |value| {
                        (value * f32::from(i16::MAX)).to_i16().unwrap_or(0)
                    });
                },
                err_fn,
                Some(STREAM_TIMEOUT),
            )?,
            U16 => self.device.build_output_stream(
                &self.config,
                move |data: &mut [u16], _: &OutputCallbackInfo| {
                    player.fill(data, |value| {
                        ((value + 1.0) * f32::from(u16::MAX) / 2.0)
                            .to_u16()
                            .unwrap_or(32768)
                    });
                },
                err_fn,
                Some(STREAM_TIMEOUT),
            )?,
            format => return Err(OutputError::UnsupportedSampleFormat { format }),
        };

        Ok(stream)
    }
}
