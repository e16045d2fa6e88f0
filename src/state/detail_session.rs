//! Audio and lifecycle state machine of the detail screen.
//!
//! A [`DetailSession`] owns the screen's single audio handle. It is driven by
//! [`SessionEvent`]s from the view and by completions from the audio backend,
//! all on one logical task, and reports back through [`SessionNotice`]s.
//!
//! Loads are the only transition that runs concurrently with event handling.
//! Every load is tagged with an epoch; a completion whose epoch is stale, or
//! that arrives after the screen was torn down, releases its handle instead
//! of storing it.

use std::{
    future::{Future, pending},
    pin::Pin,
    rc::Rc,
};

use {
    anyhow::Error,
    async_channel::{Receiver, Sender, bounded, unbounded},
    tokio::select,
    tracing::{debug, info},
};

use crate::{
    audio::{AudioBackend, PlaybackOptions, PlaybackStatus, SessionOptions},
    catalog::{CATALOG, CatalogItem, MediaSource},
    error::{AudioError, ErrorReporter, GalleryError},
    network::ConnectivityState,
    platform::{HardwareBack, Subscription, SystemChrome},
    state::{
        audio_slot::{AudioSlot, PlaybackState},
        detail_content::DetailContent,
    },
};

type LoadFuture<H> = Pin<Box<dyn Future<Output = (u64, Result<H, AudioError>)>>>;

/// Input to the session from the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The screen became the visible page.
    FocusGained,
    /// The screen stopped being the visible page.
    FocusLost,
    /// The play/pause control was activated.
    TogglePlayback,
    /// The on-screen back button was activated.
    Back,
    /// A new connectivity reading arrived.
    ConnectivityChanged(ConnectivityState),
}

/// Output of the session for the detail view to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// The playback state changed.
    State(PlaybackState),
    /// The content to render, sent on focus and on every change.
    Content(DetailContent<'static>),
    /// A recovered failure worth telling the user about.
    Failed(String),
    /// Teardown after a back action has finished; the view may pop.
    NavigateBack,
}

/// A load the session wants performed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadRequest {
    pub epoch: u64,
    pub source: MediaSource,
    pub options: PlaybackOptions,
}

/// Detail-screen audio session for one catalog id.
pub struct DetailSession<B: AudioBackend> {
    backend: Rc<B>,
    chrome: Rc<dyn SystemChrome>,
    back: Rc<dyn HardwareBack>,
    catalog: &'static [CatalogItem],
    id: String,
    connectivity: ConnectivityState,
    content: DetailContent<'static>,
    playback_options: PlaybackOptions,
    slot: AudioSlot<B::Handle>,
    state: PlaybackState,
    epoch: u64,
    load_in_flight: bool,
    focused: bool,
    mounted: bool,
    chrome_hidden: bool,
    navigated_back: bool,
    back_subscription: Option<Subscription>,
    back_rx: Option<Receiver<()>>,
    status_rx: Option<Receiver<PlaybackStatus>>,
    notices: Sender<SessionNotice>,
}

impl<B: AudioBackend + 'static> DetailSession<B> {
    /// Creates an unfocused session for `id`.
    ///
    /// Returns the session and the receiver of its notices.
    pub fn new(
        backend: Rc<B>,
        chrome: Rc<dyn SystemChrome>,
        back: Rc<dyn HardwareBack>,
        id: impl Into<String>,
        connectivity: ConnectivityState,
    ) -> (Self, Receiver<SessionNotice>) {
        let (notices, notices_rx) = unbounded();
        let id = id.into();
        let session = Self {
            backend,
            chrome,
            back,
            catalog: CATALOG,
            content: DetailContent::resolve(CATALOG, &id, connectivity),
            id,
            connectivity,
            playback_options: PlaybackOptions::default(),
            slot: AudioSlot::new(),
            state: PlaybackState::Idle,
            epoch: 0,
            load_in_flight: false,
            focused: false,
            mounted: false,
            chrome_hidden: false,
            navigated_back: false,
            back_subscription: None,
            back_rx: None,
            status_rx: None,
            notices,
        };
        (session, notices_rx)
    }

    /// Resolves the id against `catalog` instead of the built-in catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: &'static [CatalogItem]) -> Self {
        self.catalog = catalog;
        self.content = DetailContent::resolve(catalog, &self.id, self.connectivity);
        self
    }

    #[must_use]
    pub fn with_playback_options(mut self, options: PlaybackOptions) -> Self {
        self.playback_options = options;
        self
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[must_use]
    pub fn content(&self) -> &DetailContent<'static> {
        &self.content
    }

    #[must_use]
    pub fn handle(&self) -> Option<&B::Handle> {
        self.slot.handle()
    }

    /// Whether the session has been torn down and left the screen.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.focused && self.state == PlaybackState::Unloaded
    }

    /// Drives the session until `events` closes or the screen is left.
    ///
    /// A load still in flight on exit is awaited so its handle is released.
    pub async fn run(&mut self, events: Receiver<SessionEvent>) {
        let mut in_flight: Option<LoadFuture<B::Handle>> = None;

        loop {
            let status_rx = self.status_rx.clone();
            let back_rx = self.back_rx.clone();

            select! {
                biased;

                (epoch, result) = load_completion(&mut in_flight) => {
                    in_flight = None;
                    self.finish_load(epoch, result).await;
                }
                Some(status) = next_from(status_rx.as_ref()) => self.apply_status(status),
                Some(()) = next_from(back_rx.as_ref()) => self.back().await,
                event = events.recv() => match event {
                    Ok(event) => {
                        if let Some(request) = self.handle_event(event).await {
                            let load = self.start_load(request);
                            in_flight = Some(match in_flight.take() {
                                Some(superseded) => self.after_superseded(superseded, load),
                                None => load,
                            });
                        }
                    }
                    Err(_) => break,
                },
            }

            if self.is_finished() {
                break;
            }
        }

        if self.focused {
            self.focus_lost().await;
        } else {
            self.teardown().await;
        }

        if let Some(load) = in_flight.take() {
            let (epoch, result) = load.await;
            self.finish_load(epoch, result).await;
        }

        debug!(id = %self.id, "Detail session finished");
    }

    async fn handle_event(&mut self, event: SessionEvent) -> Option<LoadRequest> {
        debug!(id = %self.id, ?event, "Session event");
        match event {
            SessionEvent::FocusGained => self.focus_gained().await,
            SessionEvent::FocusLost => self.focus_lost().await,
            SessionEvent::TogglePlayback => return self.toggle().await,
            SessionEvent::Back => self.back().await,
            SessionEvent::ConnectivityChanged(state) => self.connectivity_changed(state).await,
        }
        None
    }

    /// Entry: configure the audio session, hide chrome, intercept back.
    ///
    /// An unknown id only intercepts back; no native resources are touched.
    pub async fn focus_gained(&mut self) {
        if self.focused || self.state == PlaybackState::Unloaded {
            return;
        }
        self.focused = true;
        self.mounted = true;
        self.register_back();
        self.notify(SessionNotice::Content(self.content.clone()));

        if matches!(self.content, DetailContent::NotFound { .. }) {
            info!(id = %self.id, "Detail requested for unknown id");
            return;
        }

        if let Err(e) = self
            .backend
            .configure_session(SessionOptions::background_playback())
            .await
        {
            self.report(e, "Configuring audio session failed");
        }
        self.chrome.set_system_bars_hidden(true);
        self.chrome_hidden = true;
    }

    /// Exit: tear down audio, stop intercepting back, restore chrome.
    pub async fn focus_lost(&mut self) {
        self.focused = false;
        self.teardown().await;

        if let Some(subscription) = self.back_subscription.take() {
            subscription.cancel();
        }
        self.back_rx = None;

        if self.chrome_hidden {
            self.chrome.set_system_bars_hidden(false);
            self.chrome_hidden = false;
        }
    }

    /// Play/pause request.
    ///
    /// Returns the load to perform when no handle exists yet. Requests while
    /// a transition is in flight, after teardown, or without playable content
    /// are ignored.
    pub async fn toggle(&mut self) -> Option<LoadRequest> {
        if !self.mounted || self.load_in_flight || !self.state.accepts_toggle() {
            debug!(id = %self.id, state = ?self.state, "Ignoring playback toggle");
            return None;
        }
        let item = self.content.playable_item()?;

        let Some(handle) = self.slot.handle().cloned() else {
            self.epoch += 1;
            self.load_in_flight = true;
            self.set_state(PlaybackState::Loading);
            return Some(LoadRequest {
                epoch: self.epoch,
                source: item.audio,
                options: self.playback_options,
            });
        };

        let result = if self.state == PlaybackState::Playing {
            self.backend
                .pause(&handle)
                .await
                .map(|()| PlaybackState::Paused)
        } else {
            self.backend
                .play(&handle)
                .await
                .map(|()| PlaybackState::Playing)
        };

        match result {
            Ok(state) => self.set_state(state),
            Err(e) => self.report(e, "Toggling playback failed"),
        }
        None
    }

    /// Performs `request` and applies its completion in one step.
    pub async fn perform_load(&mut self, request: LoadRequest) {
        let (epoch, result) = self.start_load(request).await;
        self.finish_load(epoch, result).await;
    }

    fn start_load(&self, request: LoadRequest) -> LoadFuture<B::Handle> {
        debug!(id = %self.id, source = %request.source, epoch = request.epoch, "Loading audio");
        let backend = Rc::clone(&self.backend);
        Box::pin(async move {
            let result = backend.load(request.source, request.options).await;
            (request.epoch, result)
        })
    }

    /// Runs `next` once `superseded` has completed and released its handle.
    fn after_superseded(
        &self,
        superseded: LoadFuture<B::Handle>,
        next: LoadFuture<B::Handle>,
    ) -> LoadFuture<B::Handle> {
        let backend = Rc::clone(&self.backend);
        let id = self.id.clone();
        Box::pin(async move {
            if let (epoch, Ok(handle)) = superseded.await {
                debug!(%id, epoch, ?handle, "Releasing superseded audio load");
                if let Err(e) = backend.unload(&handle).await {
                    ErrorReporter::warn(
                        &Error::from(GalleryError::Resource(e)),
                        "Releasing audio handle failed",
                    );
                }
            }
            next.await
        })
    }

    /// Applies a load completion.
    ///
    /// A completion for a torn-down screen or a superseded request releases
    /// the new handle and leaves the session untouched.
    pub async fn finish_load(&mut self, epoch: u64, result: Result<B::Handle, AudioError>) {
        if epoch == self.epoch {
            self.load_in_flight = false;
        }
        let current =
            self.mounted && epoch == self.epoch && self.state == PlaybackState::Loading;

        let handle = match result {
            Ok(handle) if !current => {
                debug!(id = %self.id, ?handle, "Releasing late audio load");
                self.release(&handle).await;
                return;
            }
            Err(e) if !current => {
                debug!(id = %self.id, error = %e, "Late audio load failed");
                return;
            }
            Err(e) => {
                self.report(e, "Loading audio failed");
                self.set_state(PlaybackState::Idle);
                return;
            }
            Ok(handle) => handle,
        };

        if let Some(previous) = self.slot.take() {
            self.release(&previous).await;
        }
        self.slot.store(handle.clone());
        self.status_rx = Some(self.backend.status_updates(&handle));

        match self.backend.play(&handle).await {
            Ok(()) => self.set_state(PlaybackState::Playing),
            Err(e) => {
                self.report(e, "Starting playback failed");
                self.release_audio().await;
                self.set_state(PlaybackState::Idle);
            }
        }
    }

    /// Syncs the state with the native playing flag.
    pub fn apply_status(&mut self, status: PlaybackStatus) {
        if !self.slot.is_occupied()
            || !status.is_loaded
            || !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
        {
            return;
        }
        self.set_state(if status.is_playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        });
    }

    /// Back action: tear down, then allow navigation exactly once.
    pub async fn back(&mut self) {
        if self.navigated_back {
            return;
        }
        self.teardown().await;
        self.navigated_back = true;
        self.notify(SessionNotice::NavigateBack);
    }

    /// Stops and releases audio and makes the session terminal.
    ///
    /// Safe to call any number of times.
    pub async fn teardown(&mut self) {
        self.mounted = false;
        self.epoch += 1;
        self.load_in_flight = false;
        self.release_audio().await;
        self.set_state(PlaybackState::Unloaded);
    }

    /// Re-resolves content for a new reading.
    ///
    /// Losing playable content releases audio and returns to `Idle`.
    pub async fn connectivity_changed(&mut self, connectivity: ConnectivityState) {
        self.connectivity = connectivity;
        let content = DetailContent::resolve(self.catalog, &self.id, connectivity);
        if content == self.content {
            return;
        }
        self.content = content;
        if self.focused {
            self.notify(SessionNotice::Content(self.content.clone()));
        }

        if self.content.playable_item().is_none() && self.state != PlaybackState::Unloaded {
            self.epoch += 1;
            self.load_in_flight = false;
            self.release_audio().await;
            self.set_state(PlaybackState::Idle);
        }
    }

    fn register_back(&mut self) {
        let (back_tx, back_rx) = bounded(1);
        self.back_rx = Some(back_rx);
        self.back_subscription = Some(self.back.on_hardware_back(Box::new(move || {
            let _ = back_tx.try_send(());
        })));
    }

    /// stop → unload → clear, logging failures.
    async fn release_audio(&mut self) {
        self.status_rx = None;
        let Some(handle) = self.slot.handle().cloned() else {
            return;
        };

        if let Err(e) = self.backend.stop(&handle).await {
            self.report(e, "Stopping audio failed");
        }
        if let Err(e) = self.backend.unload(&handle).await {
            self.report(e, "Unloading audio failed");
        }
        self.slot.take();
    }

    async fn release(&self, handle: &B::Handle) {
        if let Err(e) = self.backend.unload(handle).await {
            ErrorReporter::warn(
                &Error::from(GalleryError::Resource(e)),
                "Releasing audio handle failed",
            );
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state == state {
            return;
        }
        debug!(id = %self.id, from = ?self.state, to = ?state, "Playback state changed");
        self.state = state;
        self.notify(SessionNotice::State(state));
    }

    fn report(&self, error: AudioError, context: &str) {
        let error = Error::from(GalleryError::Resource(error));
        ErrorReporter::warn(&error, context);
        self.notify(SessionNotice::Failed(ErrorReporter::to_user_message(&error)));
    }

    fn notify(&self, notice: SessionNotice) {
        let _ = self.notices.try_send(notice);
    }
}

async fn load_completion<H>(in_flight: &mut Option<LoadFuture<H>>) -> (u64, Result<H, AudioError>) {
    match in_flight {
        Some(load) => load.await,
        None => pending().await,
    }
}

async fn next_from<T>(rx: Option<&Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await.ok(),
        None => pending().await,
    }
}
