//! Audio playback for the detail view.
//!
//! [`backend::AudioBackend`] is the seam the audio session state machine talks
//! to. [`native::NativeAudioBackend`] implements it on top of `reqwest`
//! (remote sources), `symphonia` (decoding), `rubato` (rate conversion) and
//! `cpal` (output).

pub mod backend;
pub mod decoder;
pub mod fetch;
pub mod native;
pub mod output;
pub mod resampler;

pub use {
    backend::{AudioBackend, PlaybackOptions, PlaybackStatus, SessionOptions},
    native::{AudioHandle, NativeAudioBackend},
};
