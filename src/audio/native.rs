//! Desktop implementation of [`AudioBackend`].
//!
//! A load fetches the whole asset, decodes it on the blocking pool, converts
//! it to the device format and parks a paused `cpal` stream behind an opaque
//! [`AudioHandle`]. Status updates are pushed from a tokio interval task for
//! as long as the handle stays loaded.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    sync::Arc,
    time::Duration,
};

use {
    anyhow::Error,
    async_channel::{Receiver, Sender, bounded},
    cpal::{Stream, traits::StreamTrait},
    tokio::{
        runtime::Handle,
        time::{MissedTickBehavior, interval},
    },
    tracing::{debug, info},
};

use crate::{
    audio::{
        backend::{AudioBackend, PlaybackOptions, PlaybackStatus, SessionOptions},
        decoder::{AudioDecoder, DecodedClip},
        fetch::SourceFetcher,
        output::{AudioOutput, ClipPlayer, OutputError},
        resampler::{remix, resample},
    },
    catalog::MediaSource,
    error::{AudioError, ErrorReporter},
};

/// Capacity of each per-handle status channel.
const STATUS_CHANNEL_CAPACITY: usize = 16;

/// Shortest accepted progress interval.
const MIN_PROGRESS_INTERVAL: Duration = Duration::from_millis(10);

/// Opaque reference to a clip loaded by [`NativeAudioBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioHandle(u64);

impl AudioHandle {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0
    }
}

struct ActiveClip {
    stream: Stream,
    player: Arc<ClipPlayer>,
    status_tx: Sender<PlaybackStatus>,
    status_rx: Receiver<PlaybackStatus>,
}

impl ActiveClip {
    fn publish(&self) {
        let _ = self.status_tx.try_send(self.player.status());
    }
}

/// `cpal`-backed audio backend.
///
/// Lives on the UI thread; only decoding, I/O and status ticking run on the
/// tokio runtime.
pub struct NativeAudioBackend {
    fetcher: SourceFetcher,
    runtime: Handle,
    clips: RefCell<HashMap<u64, ActiveClip>>,
    session: Cell<Option<SessionOptions>>,
    next_id: Cell<u64>,
}

impl NativeAudioBackend {
    /// Creates a backend that loads through `fetcher` and spawns work on `runtime`.
    #[must_use]
    pub fn new(fetcher: SourceFetcher, runtime: Handle) -> Self {
        Self {
            fetcher,
            runtime,
            clips: RefCell::new(HashMap::new()),
            session: Cell::new(None),
            next_id: Cell::new(1),
        }
    }

    /// Session options applied by the last `configure_session` call.
    #[must_use]
    pub fn session_options(&self) -> Option<SessionOptions> {
        self.session.get()
    }

    /// Number of handles currently holding an output stream.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.clips.borrow().len()
    }

    fn with_clip<T>(
        &self,
        handle: &AudioHandle,
        f: impl FnOnce(&ActiveClip) -> Result<T, AudioError>,
    ) -> Result<T, AudioError> {
        let clips = self.clips.borrow();
        let clip = clips
            .get(&handle.0)
            .ok_or(AudioError::UnknownHandle { id: handle.0 })?;
        f(clip)
    }
}

impl AudioBackend for NativeAudioBackend {
    type Handle = AudioHandle;

    async fn configure_session(&self, options: SessionOptions) -> Result<(), AudioError> {
        debug!(?options, "Configured audio session");
        self.session.set(Some(options));
        Ok(())
    }

    async fn load(
        &self,
        source: MediaSource,
        options: PlaybackOptions,
    ) -> Result<AudioHandle, AudioError> {
        let bytes = self.fetcher.fetch(source).await?;

        let output = AudioOutput::new()?;
        let target_rate = output.sample_rate();
        let target_channels = output.channels();
        let extension = source.extension();

        let clip = self
            .runtime
            .spawn_blocking(move || -> Result<DecodedClip, AudioError> {
                let clip = AudioDecoder::from_bytes(bytes, extension)?.decode_to_end()?;
                let clip = remix(clip, target_channels)?;
                Ok(resample(clip, target_rate)?)
            })
            .await
            .map_err(|e| {
                let reason = format!("Decoding task failed: {e}");
                ErrorReporter::error(&Error::from(e), "Audio decoding task did not complete");
                AudioError::InvalidOperation { reason }
            })??;

        let player = Arc::new(ClipPlayer::new(clip, options.looping, options.volume));
        let stream = output.create_stream(Arc::clone(&player))?;
        stream.pause().map_err(OutputError::from)?;

        let (status_tx, status_rx) = bounded(STATUS_CHANNEL_CAPACITY);
        self.runtime.spawn(report_progress(
            Arc::clone(&player),
            status_tx.clone(),
            options.progress_interval,
        ));

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.clips.borrow_mut().insert(
            id,
            ActiveClip {
                stream,
                player,
                status_tx,
                status_rx,
            },
        );

        info!(handle = id, %source, "Loaded audio clip");
        Ok(AudioHandle(id))
    }

    async fn play(&self, handle: &AudioHandle) -> Result<(), AudioError> {
        self.with_clip(handle, |clip| {
            clip.stream.play().map_err(OutputError::from)?;
            clip.player.set_playing(true);
            clip.publish();
            Ok(())
        })
    }

    async fn pause(&self, handle: &AudioHandle) -> Result<(), AudioError> {
        self.with_clip(handle, |clip| {
            clip.player.set_playing(false);
            clip.stream.pause().map_err(OutputError::from)?;
            clip.publish();
            Ok(())
        })
    }

    async fn stop(&self, handle: &AudioHandle) -> Result<(), AudioError> {
        self.with_clip(handle, |clip| {
            clip.player.set_playing(false);
            clip.player.rewind();
            clip.stream.pause().map_err(OutputError::from)?;
            clip.publish();
            Ok(())
        })
    }

    async fn unload(&self, handle: &AudioHandle) -> Result<(), AudioError> {
        let clip = self
            .clips
            .borrow_mut()
            .remove(&handle.0)
            .ok_or(AudioError::UnknownHandle { id: handle.0 })?;

        clip.player.set_playing(false);
        clip.status_tx.close();
        drop(clip.stream);

        debug!(handle = handle.0, "Unloaded audio clip");
        Ok(())
    }

    fn status_updates(&self, handle: &AudioHandle) -> Receiver<PlaybackStatus> {
        if let Some(clip) = self.clips.borrow().get(&handle.0) {
            return clip.status_rx.clone();
        }

        let (closed_tx, closed_rx) = bounded(1);
        closed_tx.close();
        closed_rx
    }
}

/// Pushes a status snapshot every tick while playing, plus one when playback stops.
async fn report_progress(
    player: Arc<ClipPlayer>,
    status_tx: Sender<PlaybackStatus>,
    period: Duration,
) {
    let mut ticker = interval(period.max(MIN_PROGRESS_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut was_playing = false;

    loop {
        ticker.tick().await;
        if status_tx.is_closed() {
            break;
        }

        let playing = player.is_playing();
        if playing || was_playing {
            let _ = status_tx.try_send(player.status());
        }
        was_playing = playing;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use {tempfile::TempDir, tokio::runtime::Handle};

    use crate::{
        audio::{
            backend::{AudioBackend, PlaybackOptions, SessionOptions},
            fetch::SourceFetcher,
            native::{AudioHandle, NativeAudioBackend},
        },
        catalog::MediaSource,
        error::AudioError,
    };

    fn backend(temp_dir: &TempDir) -> NativeAudioBackend {
        let fetcher =
            SourceFetcher::new(temp_dir.path(), Duration::from_secs(5), Handle::current())
                .unwrap();
        NativeAudioBackend::new(fetcher, Handle::current())
    }

    #[tokio::test]
    async fn test_configure_session_records_options() {
        let temp_dir = TempDir::new().unwrap();
        let backend = backend(&temp_dir);
        assert!(backend.session_options().is_none());

        let options = SessionOptions::background_playback();
        backend.configure_session(options).await.unwrap();
        assert_eq!(backend.session_options(), Some(options));
    }

    #[tokio::test]
    async fn test_unknown_handle_operations() {
        let temp_dir = TempDir::new().unwrap();
        let backend = backend(&temp_dir);
        let handle = AudioHandle(42);

        assert!(matches!(
            backend.play(&handle).await,
            Err(AudioError::UnknownHandle { id: 42 })
        ));
        assert!(matches!(
            backend.unload(&handle).await,
            Err(AudioError::UnknownHandle { id: 42 })
        ));

        let updates = backend.status_updates(&handle);
        assert!(updates.is_closed());
        assert!(updates.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_asset_fails_before_touching_output() {
        let temp_dir = TempDir::new().unwrap();
        let backend = backend(&temp_dir);

        let result = backend
            .load(MediaSource::Local("absent.ogg"), PlaybackOptions::default())
            .await;

        assert!(matches!(result, Err(AudioError::FetchError(_))));
        assert_eq!(backend.loaded_count(), 0);
    }
}
