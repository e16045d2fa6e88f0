//! Platform audio subsystem contract.

use std::{fmt::Debug, time::Duration};

use {
    async_channel::Receiver,
    serde::{Deserialize, Serialize},
};

use crate::{catalog::MediaSource, error::AudioError};

/// Process-wide audio session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Whether the session may record.
    pub allows_recording: bool,
    /// Whether playback continues while the application is in the background.
    pub stays_active_in_background: bool,
    /// Whether playback ignores the silent switch.
    pub plays_in_silent_mode: bool,
    /// Whether other audio is ducked while this session plays.
    pub duck_others: bool,
    /// Whether audio is routed to the earpiece instead of the speaker.
    pub play_through_earpiece: bool,
}

impl SessionOptions {
    /// Background-capable playback that also plays in silent mode.
    #[must_use]
    pub fn background_playback() -> Self {
        Self {
            allows_recording: false,
            stays_active_in_background: true,
            plays_in_silent_mode: true,
            duck_others: true,
            play_through_earpiece: false,
        }
    }
}

/// Per-load playback configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackOptions {
    /// Restart from the beginning when the clip ends.
    pub looping: bool,
    /// Linear gain in `0.0..=1.0`.
    pub volume: f32,
    /// Interval between status updates while playing.
    pub progress_interval: Duration,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            looping: true,
            volume: 1.0,
            progress_interval: Duration::from_millis(1000),
        }
    }
}

/// Native playback status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackStatus {
    /// Whether the handle still refers to a loaded clip.
    pub is_loaded: bool,
    /// Whether audio is currently being produced.
    pub is_playing: bool,
    /// Playback position in milliseconds.
    pub position_ms: u64,
}

/// Platform audio subsystem.
///
/// Every call may suspend until the native layer responds. Implementations
/// are driven from a single logical task and need not be thread-safe.
#[allow(async_fn_in_trait)]
pub trait AudioBackend {
    /// Opaque reference to one loaded clip.
    type Handle: Clone + Debug + PartialEq + 'static;

    /// Configures the process-wide audio session.
    async fn configure_session(&self, options: SessionOptions) -> Result<(), AudioError>;

    /// Loads `source`, returning a paused handle.
    async fn load(
        &self,
        source: MediaSource,
        options: PlaybackOptions,
    ) -> Result<Self::Handle, AudioError>;

    /// Starts or resumes playback.
    async fn play(&self, handle: &Self::Handle) -> Result<(), AudioError>;

    /// Pauses playback, keeping the position.
    async fn pause(&self, handle: &Self::Handle) -> Result<(), AudioError>;

    /// Stops playback and rewinds.
    async fn stop(&self, handle: &Self::Handle) -> Result<(), AudioError>;

    /// Releases the native resource behind `handle`.
    async fn unload(&self, handle: &Self::Handle) -> Result<(), AudioError>;

    /// Status stream for `handle`.
    ///
    /// The stream closes when the handle is unloaded. Unknown handles yield an
    /// already-closed stream.
    fn status_updates(&self, handle: &Self::Handle) -> Receiver<PlaybackStatus>;
}
