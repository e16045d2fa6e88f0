//! Lifecycle tests for the detail session against recording platform doubles.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use async_channel::{Receiver, Sender, bounded, unbounded};

use crate::{
    audio::{AudioBackend, PlaybackOptions, PlaybackStatus, SessionOptions, fetch::FetchError},
    catalog::{MediaSource, find_item},
    error::AudioError,
    network::ConnectivityState::{self, Connected, Disconnected, Unknown},
    platform::{HardwareBack, Subscription, SystemChrome},
    state::{DetailContent, DetailSession, PlaybackState, SessionEvent, SessionNotice},
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Configure(SessionOptions),
    Load(MediaSource),
    Play(u64),
    Pause(u64),
    Stop(u64),
    Unload(u64),
}

type StatusChannel = (Sender<PlaybackStatus>, Receiver<PlaybackStatus>);

/// Audio backend that records every call and tracks live handles.
#[derive(Default)]
struct MockAudioBackend {
    calls: RefCell<Vec<Call>>,
    live: RefCell<HashMap<u64, StatusChannel>>,
    max_live: Cell<usize>,
    next_id: Cell<u64>,
    fail_load: Cell<bool>,
    fail_play: Cell<bool>,
    load_gate: RefCell<Option<Receiver<()>>>,
}

impl MockAudioBackend {
    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    /// Holds the next load until the returned sender fires or drops.
    fn gate_next_load(&self) -> Sender<()> {
        let (gate_tx, gate_rx) = bounded(1);
        *self.load_gate.borrow_mut() = Some(gate_rx);
        gate_tx
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn publish(&self, handle: u64, is_playing: bool) {
        if let Some((status_tx, _)) = self.live.borrow().get(&handle) {
            let _ = status_tx.try_send(PlaybackStatus {
                is_loaded: true,
                is_playing,
                position_ms: 0,
            });
        }
    }

    fn require_live(&self, handle: u64) -> Result<(), AudioError> {
        if self.live.borrow().contains_key(&handle) {
            Ok(())
        } else {
            Err(AudioError::UnknownHandle { id: handle })
        }
    }
}

impl AudioBackend for MockAudioBackend {
    type Handle = u64;

    async fn configure_session(&self, options: SessionOptions) -> Result<(), AudioError> {
        self.record(Call::Configure(options));
        Ok(())
    }

    async fn load(
        &self,
        source: MediaSource,
        _options: PlaybackOptions,
    ) -> Result<u64, AudioError> {
        self.record(Call::Load(source));

        let gate = self.load_gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.recv().await;
        }

        if self.fail_load.get() {
            return Err(AudioError::FetchError(FetchError::Interrupted(
                "simulated network error".to_string(),
            )));
        }

        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.live.borrow_mut().insert(id, unbounded());
        self.max_live.set(self.max_live.get().max(self.live_count()));
        Ok(id)
    }

    async fn play(&self, handle: &u64) -> Result<(), AudioError> {
        self.record(Call::Play(*handle));
        self.require_live(*handle)?;
        if self.fail_play.get() {
            return Err(AudioError::InvalidOperation {
                reason: "device busy".to_string(),
            });
        }
        self.publish(*handle, true);
        Ok(())
    }

    async fn pause(&self, handle: &u64) -> Result<(), AudioError> {
        self.record(Call::Pause(*handle));
        self.require_live(*handle)?;
        self.publish(*handle, false);
        Ok(())
    }

    async fn stop(&self, handle: &u64) -> Result<(), AudioError> {
        self.record(Call::Stop(*handle));
        self.require_live(*handle)?;
        self.publish(*handle, false);
        Ok(())
    }

    async fn unload(&self, handle: &u64) -> Result<(), AudioError> {
        self.record(Call::Unload(*handle));
        let (status_tx, _) = self
            .live
            .borrow_mut()
            .remove(handle)
            .ok_or(AudioError::UnknownHandle { id: *handle })?;
        status_tx.close();
        Ok(())
    }

    fn status_updates(&self, handle: &u64) -> Receiver<PlaybackStatus> {
        match self.live.borrow().get(handle) {
            Some((_, status_rx)) => status_rx.clone(),
            None => {
                let (closed_tx, closed_rx) = bounded(1);
                closed_tx.close();
                closed_rx
            }
        }
    }
}

#[derive(Default)]
struct RecordingChrome {
    calls: RefCell<Vec<bool>>,
}

impl SystemChrome for RecordingChrome {
    fn set_system_bars_hidden(&self, hidden: bool) {
        self.calls.borrow_mut().push(hidden);
    }
}

type BackCallbacks = Rc<RefCell<Vec<(u64, Rc<dyn Fn()>)>>>;

#[derive(Default)]
struct MockBack {
    callbacks: BackCallbacks,
    next_id: Cell<u64>,
}

impl MockBack {
    fn trigger(&self) {
        let callbacks: Vec<_> = self
            .callbacks
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    fn registered(&self) -> usize {
        self.callbacks.borrow().len()
    }
}

impl HardwareBack for MockBack {
    fn on_hardware_back(&self, callback: Box<dyn Fn()>) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.callbacks.borrow_mut().push((id, Rc::from(callback)));
        let callbacks = Rc::clone(&self.callbacks);
        Subscription::new(move || callbacks.borrow_mut().retain(|(other, _)| *other != id))
    }
}

struct Harness {
    backend: Rc<MockAudioBackend>,
    chrome: Rc<RecordingChrome>,
    back: Rc<MockBack>,
    notices: Receiver<SessionNotice>,
    session: DetailSession<MockAudioBackend>,
}

fn harness(id: &str, connectivity: ConnectivityState) -> Harness {
    harness_with(Rc::new(MockAudioBackend::default()), id, connectivity)
}

fn harness_with(
    backend: Rc<MockAudioBackend>,
    id: &str,
    connectivity: ConnectivityState,
) -> Harness {
    let chrome = Rc::new(RecordingChrome::default());
    let back = Rc::new(MockBack::default());
    let (session, notices) = DetailSession::new(
        Rc::clone(&backend),
        chrome.clone(),
        back.clone(),
        id,
        connectivity,
    );
    Harness {
        backend,
        chrome,
        back,
        notices,
        session,
    }
}

fn drain(notices: &Receiver<SessionNotice>) -> Vec<SessionNotice> {
    let mut drained = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        drained.push(notice);
    }
    drained
}

async fn wait_for(notices: &Receiver<SessionNotice>, expected: SessionNotice) {
    while let Ok(notice) = notices.recv().await {
        if notice == expected {
            return;
        }
    }
    panic!("notice channel closed before {expected:?}");
}

/// Focuses the session and plays until the first load has completed.
async fn start_playing(harness: &mut Harness) {
    harness.session.focus_gained().await;
    let request = harness.session.toggle().await.unwrap();
    harness.session.perform_load(request).await;
    assert_eq!(harness.session.state(), PlaybackState::Playing);
}

#[tokio::test]
async fn test_focus_gained_prepares_platform() {
    let mut h = harness("leaf-1", Connected);
    h.session.focus_gained().await;

    assert_eq!(
        h.backend.calls(),
        vec![Call::Configure(SessionOptions::background_playback())]
    );
    assert_eq!(*h.chrome.calls.borrow(), vec![true]);
    assert_eq!(h.back.registered(), 1);

    let item = find_item("leaf-1").unwrap();
    assert_eq!(
        drain(&h.notices),
        vec![SessionNotice::Content(DetailContent::Ready(item))]
    );
}

#[tokio::test]
async fn test_play_request_loads_then_plays_looped() {
    let mut h = harness("leaf-1", Connected);
    h.session.focus_gained().await;

    let request = h.session.toggle().await.unwrap();
    assert_eq!(h.session.state(), PlaybackState::Loading);
    assert_eq!(request.source, find_item("leaf-1").unwrap().audio);
    assert!(request.options.looping);
    assert_eq!(request.options.volume, 1.0);

    h.session.perform_load(request).await;

    assert_eq!(h.session.state(), PlaybackState::Playing);
    assert_eq!(h.session.handle(), Some(&1));
    assert_eq!(
        h.backend.calls()[1..],
        [Call::Load(request.source), Call::Play(1)]
    );
}

#[tokio::test]
async fn test_toggle_pauses_and_resumes_existing_handle() {
    let mut h = harness("leaf-1", Connected);
    start_playing(&mut h).await;

    assert!(h.session.toggle().await.is_none());
    assert_eq!(h.session.state(), PlaybackState::Paused);

    assert!(h.session.toggle().await.is_none());
    assert_eq!(h.session.state(), PlaybackState::Playing);

    let calls = h.backend.calls();
    assert_eq!(calls[calls.len() - 2..], [Call::Pause(1), Call::Play(1)]);
    assert_eq!(h.backend.max_live.get(), 1);
}

#[tokio::test]
async fn test_toggle_is_ignored_while_loading() {
    let mut h = harness("leaf-1", Connected);
    h.session.focus_gained().await;

    let request = h.session.toggle().await.unwrap();
    assert!(h.session.toggle().await.is_none());
    assert!(h.session.toggle().await.is_none());
    assert_eq!(h.session.state(), PlaybackState::Loading);

    h.session.perform_load(request).await;
    let loads = h
        .backend
        .calls()
        .iter()
        .filter(|call| matches!(call, Call::Load(_)))
        .count();
    assert_eq!(loads, 1);
}

#[tokio::test]
async fn test_failed_remote_load_reverts_to_idle() {
    let mut h = harness("leaf-2", Connected);
    h.backend.fail_load.set(true);
    h.session.focus_gained().await;
    drain(&h.notices);

    let request = h.session.toggle().await.unwrap();
    assert!(matches!(request.source, MediaSource::Remote(_)));
    h.session.perform_load(request).await;

    assert_eq!(h.session.state(), PlaybackState::Idle);
    assert!(h.session.handle().is_none());
    assert_eq!(h.backend.live_count(), 0);
    assert_eq!(
        drain(&h.notices),
        vec![
            SessionNotice::State(PlaybackState::Loading),
            SessionNotice::Failed("Audio could not be played".to_string()),
            SessionNotice::State(PlaybackState::Idle),
        ]
    );

    h.backend.fail_load.set(false);
    let retry = h.session.toggle().await.unwrap();
    h.session.perform_load(retry).await;
    assert_eq!(h.session.state(), PlaybackState::Playing);
}

#[tokio::test]
async fn test_play_failure_after_load_releases_handle() {
    let mut h = harness("leaf-1", Connected);
    h.backend.fail_play.set(true);
    h.session.focus_gained().await;

    let request = h.session.toggle().await.unwrap();
    h.session.perform_load(request).await;

    assert_eq!(h.session.state(), PlaybackState::Idle);
    assert!(h.session.handle().is_none());
    assert_eq!(h.backend.live_count(), 0);
}

#[tokio::test]
async fn test_late_load_after_back_is_released() {
    let mut h = harness("leaf-1", Connected);
    h.session.focus_gained().await;

    let request = h.session.toggle().await.unwrap();
    h.session.back().await;
    assert_eq!(h.session.state(), PlaybackState::Unloaded);

    h.session.perform_load(request).await;

    let calls = h.backend.calls();
    assert!(!calls.iter().any(|call| matches!(call, Call::Play(_))));
    assert_eq!(calls.last(), Some(&Call::Unload(1)));
    assert!(h.session.handle().is_none());
    assert_eq!(h.backend.live_count(), 0);
    assert_eq!(h.session.state(), PlaybackState::Unloaded);
}

#[tokio::test]
async fn test_unknown_id_renders_not_found_without_native_calls() {
    let mut h = harness("ghost", Connected);
    h.session.focus_gained().await;

    assert_eq!(
        *h.session.content(),
        DetailContent::NotFound {
            id: "ghost".to_string()
        }
    );
    assert!(h.session.toggle().await.is_none());
    h.session.back().await;
    h.session.focus_lost().await;

    assert!(h.backend.calls().is_empty());
    assert!(h.chrome.calls.borrow().is_empty());
    assert_eq!(h.back.registered(), 0);
    assert!(h.session.is_finished());
}

#[tokio::test]
async fn test_teardown_is_idempotent_and_ordered() {
    let mut h = harness("leaf-4", Connected);
    start_playing(&mut h).await;

    h.session.teardown().await;
    h.session.teardown().await;

    assert_eq!(h.session.state(), PlaybackState::Unloaded);
    let calls = h.backend.calls();
    assert_eq!(calls[calls.len() - 2..], [Call::Stop(1), Call::Unload(1)]);
    assert!(h.session.toggle().await.is_none());
    assert_eq!(h.backend.calls().len(), calls.len());
}

#[tokio::test]
async fn test_back_double_tap_navigates_once() {
    let mut h = harness("leaf-1", Connected);
    start_playing(&mut h).await;
    drain(&h.notices);

    h.session.back().await;
    h.session.back().await;

    assert_eq!(
        drain(&h.notices),
        vec![
            SessionNotice::State(PlaybackState::Unloaded),
            SessionNotice::NavigateBack,
        ]
    );
    assert_eq!(h.backend.live_count(), 0);
}

#[tokio::test]
async fn test_focus_lost_restores_platform() {
    let mut h = harness("leaf-1", Connected);
    start_playing(&mut h).await;

    h.session.focus_lost().await;

    assert_eq!(*h.chrome.calls.borrow(), vec![true, false]);
    assert_eq!(h.back.registered(), 0);
    assert_eq!(h.backend.live_count(), 0);
    assert!(h.session.is_finished());

    h.session.focus_gained().await;
    assert_eq!(h.back.registered(), 0);
}

#[tokio::test]
async fn test_one_handle_across_successive_screens() {
    let backend = Rc::new(MockAudioBackend::default());
    for id in ["leaf-1", "leaf-2", "leaf-4"] {
        let mut h = harness_with(Rc::clone(&backend), id, Connected);
        start_playing(&mut h).await;
        h.session.focus_lost().await;
    }

    assert_eq!(backend.max_live.get(), 1);
    assert_eq!(backend.live_count(), 0);
}

#[tokio::test]
async fn test_native_status_is_authoritative() {
    let mut h = harness("leaf-1", Connected);
    start_playing(&mut h).await;

    h.session.apply_status(PlaybackStatus {
        is_loaded: true,
        is_playing: false,
        position_ms: 1200,
    });
    assert_eq!(h.session.state(), PlaybackState::Paused);

    h.session.apply_status(PlaybackStatus {
        is_loaded: false,
        is_playing: true,
        position_ms: 0,
    });
    assert_eq!(h.session.state(), PlaybackState::Paused);

    h.session.apply_status(PlaybackStatus {
        is_loaded: true,
        is_playing: true,
        position_ms: 2200,
    });
    assert_eq!(h.session.state(), PlaybackState::Playing);
}

#[tokio::test]
async fn test_remote_image_offline_shows_placeholder() {
    let mut h = harness("leaf-3", Disconnected);
    h.session.focus_gained().await;

    let item = find_item("leaf-3").unwrap();
    assert_eq!(*h.session.content(), DetailContent::Offline(item));
    assert!(h.session.toggle().await.is_none());
    assert!(
        !h.backend
            .calls()
            .iter()
            .any(|call| matches!(call, Call::Load(_)))
    );

    drain(&h.notices);
    h.session.connectivity_changed(Connected).await;
    assert_eq!(
        drain(&h.notices),
        vec![SessionNotice::Content(DetailContent::Ready(item))]
    );
    assert!(h.session.toggle().await.is_some());
}

#[tokio::test]
async fn test_going_offline_releases_remote_content_audio() {
    let mut h = harness("leaf-3", Unknown);
    start_playing(&mut h).await;

    h.session.connectivity_changed(Disconnected).await;

    assert_eq!(h.session.state(), PlaybackState::Idle);
    assert!(h.session.handle().is_none());
    assert_eq!(h.backend.live_count(), 0);
}

#[tokio::test]
async fn test_going_offline_mid_load_keeps_control_usable() {
    let mut h = harness("leaf-3", Connected);
    h.session.focus_gained().await;

    let stale = h.session.toggle().await.unwrap();
    assert_eq!(h.session.state(), PlaybackState::Loading);

    h.session.connectivity_changed(Disconnected).await;
    assert_eq!(h.session.state(), PlaybackState::Idle);

    h.session.perform_load(stale).await;
    assert_eq!(h.backend.live_count(), 0);
    assert_eq!(h.session.state(), PlaybackState::Idle);

    h.session.connectivity_changed(Connected).await;
    let request = h.session.toggle().await.unwrap();
    assert_ne!(request.epoch, stale.epoch);

    h.session.perform_load(request).await;
    assert_eq!(h.session.state(), PlaybackState::Playing);
    assert_eq!(h.session.handle(), Some(&2));
    assert_eq!(h.backend.live_count(), 1);
}

#[tokio::test]
async fn test_local_image_with_remote_audio_still_loads_offline() {
    let mut h = harness("leaf-2", Disconnected);
    h.session.focus_gained().await;

    assert!(matches!(h.session.content(), DetailContent::Ready(_)));
    let request = h.session.toggle().await.unwrap();
    assert!(request.source.is_remote());
}

#[tokio::test]
async fn test_run_loop_hardware_back_then_focus_lost() {
    let Harness {
        backend,
        chrome,
        back,
        notices,
        mut session,
    } = harness("leaf-1", Connected);
    let (events_tx, events_rx) = unbounded();
    let item = find_item("leaf-1").unwrap();

    let driver = async {
        events_tx.send(SessionEvent::FocusGained).await.unwrap();
        wait_for(&notices, SessionNotice::Content(DetailContent::Ready(item))).await;
        events_tx.send(SessionEvent::TogglePlayback).await.unwrap();
        wait_for(&notices, SessionNotice::State(PlaybackState::Playing)).await;

        back.trigger();
        wait_for(&notices, SessionNotice::NavigateBack).await;
        events_tx.send(SessionEvent::FocusLost).await.unwrap();
    };

    tokio::join!(session.run(events_rx), driver);

    assert!(session.is_finished());
    assert_eq!(backend.live_count(), 0);
    assert_eq!(*chrome.calls.borrow(), vec![true, false]);
    assert_eq!(back.registered(), 0);
}

#[tokio::test]
async fn test_run_loop_releases_load_completing_after_back() {
    let Harness {
        backend,
        notices,
        mut session,
        ..
    } = harness("leaf-1", Connected);
    let (events_tx, events_rx) = unbounded();
    let gate = backend.gate_next_load();

    let driver = async {
        events_tx.send(SessionEvent::FocusGained).await.unwrap();
        events_tx.send(SessionEvent::TogglePlayback).await.unwrap();
        wait_for(&notices, SessionNotice::State(PlaybackState::Loading)).await;

        events_tx.send(SessionEvent::Back).await.unwrap();
        wait_for(&notices, SessionNotice::NavigateBack).await;

        gate.send(()).await.unwrap();
        events_tx.send(SessionEvent::FocusLost).await.unwrap();
    };

    tokio::join!(session.run(events_rx), driver);

    let calls = backend.calls();
    assert!(calls.iter().any(|call| matches!(call, Call::Load(_))));
    assert!(!calls.iter().any(|call| matches!(call, Call::Play(_))));
    assert!(calls.contains(&Call::Unload(1)));
    assert_eq!(backend.live_count(), 0);
    assert!(session.handle().is_none());
    assert_eq!(session.state(), PlaybackState::Unloaded);
}

#[tokio::test]
async fn test_run_loop_reload_after_reconnect_releases_stale_load() {
    let Harness {
        backend,
        notices,
        mut session,
        ..
    } = harness("leaf-3", Connected);
    let (events_tx, events_rx) = unbounded();
    let item = find_item("leaf-3").unwrap();
    let gate = backend.gate_next_load();

    let driver = async {
        events_tx.send(SessionEvent::FocusGained).await.unwrap();
        wait_for(&notices, SessionNotice::Content(DetailContent::Ready(item))).await;
        events_tx.send(SessionEvent::TogglePlayback).await.unwrap();
        wait_for(&notices, SessionNotice::State(PlaybackState::Loading)).await;

        events_tx
            .send(SessionEvent::ConnectivityChanged(Disconnected))
            .await
            .unwrap();
        wait_for(&notices, SessionNotice::State(PlaybackState::Idle)).await;
        events_tx
            .send(SessionEvent::ConnectivityChanged(Connected))
            .await
            .unwrap();
        wait_for(&notices, SessionNotice::Content(DetailContent::Ready(item))).await;

        events_tx.send(SessionEvent::TogglePlayback).await.unwrap();
        wait_for(&notices, SessionNotice::State(PlaybackState::Loading)).await;
        gate.send(()).await.unwrap();
        wait_for(&notices, SessionNotice::State(PlaybackState::Playing)).await;

        events_tx.send(SessionEvent::FocusLost).await.unwrap();
    };

    tokio::join!(session.run(events_rx), driver);

    let calls = backend.calls();
    assert!(calls.contains(&Call::Unload(1)));
    assert!(!calls.contains(&Call::Play(1)));
    assert!(calls.contains(&Call::Play(2)));
    assert_eq!(backend.max_live.get(), 1);
    assert_eq!(backend.live_count(), 0);
    assert_eq!(session.state(), PlaybackState::Unloaded);
}

#[tokio::test]
async fn test_run_loop_closed_channel_tears_down() {
    let Harness {
        backend,
        chrome,
        notices,
        mut session,
        ..
    } = harness("leaf-4", Connected);
    let (events_tx, events_rx) = unbounded();

    let driver = async move {
        events_tx.send(SessionEvent::FocusGained).await.unwrap();
        events_tx.send(SessionEvent::TogglePlayback).await.unwrap();
        wait_for(&notices, SessionNotice::State(PlaybackState::Playing)).await;
    };

    tokio::join!(session.run(events_rx), driver);

    assert_eq!(backend.live_count(), 0);
    assert_eq!(*chrome.calls.borrow(), vec![true, false]);
    assert_eq!(session.state(), PlaybackState::Unloaded);
}
