//! The detail view's audio session: at most one native handle plus its state.

use std::fmt::Debug;

use tracing::warn;

/// Lifecycle of the detail view's audio session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    /// Nothing loaded yet, or the last load failed.
    #[default]
    Idle,
    /// A load is in flight.
    Loading,
    /// The native player reports audio output.
    Playing,
    /// Loaded but not producing audio.
    Paused,
    /// Torn down; no further transitions.
    Unloaded,
}

impl PlaybackState {
    /// Whether a toggle request may be serviced in this state.
    #[must_use]
    pub fn accepts_toggle(self) -> bool {
        matches!(self, Self::Idle | Self::Playing | Self::Paused)
    }
}

/// Owned slot for the single native audio handle.
///
/// The slot never releases on its own because releasing is asynchronous.
/// Callers `take` the handle and unload it; a slot dropped while still
/// holding one is reported as a leak.
#[derive(Debug)]
pub struct AudioSlot<H: Debug> {
    handle: Option<H>,
}

impl<H: Debug> AudioSlot<H> {
    #[must_use]
    pub fn new() -> Self {
        Self { handle: None }
    }

    #[must_use]
    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.handle.is_some()
    }

    /// Stores `handle`, returning the previous one for the caller to unload.
    pub fn store(&mut self, handle: H) -> Option<H> {
        self.handle.replace(handle)
    }

    /// Empties the slot.
    pub fn take(&mut self) -> Option<H> {
        self.handle.take()
    }
}

impl<H: Debug> Default for AudioSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Debug> Drop for AudioSlot<H> {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            warn!(?handle, "Audio slot dropped while still holding a handle");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::state::{AudioSlot, PlaybackState};

    #[test]
    fn test_toggle_acceptance() {
        assert!(PlaybackState::Idle.accepts_toggle());
        assert!(PlaybackState::Playing.accepts_toggle());
        assert!(PlaybackState::Paused.accepts_toggle());
        assert!(!PlaybackState::Loading.accepts_toggle());
        assert!(!PlaybackState::Unloaded.accepts_toggle());
        assert_eq!(PlaybackState::default(), PlaybackState::Idle);
    }

    #[test]
    fn test_slot_holds_one_handle() {
        let mut slot = AudioSlot::new();
        assert!(!slot.is_occupied());

        assert_eq!(slot.store(1_u64), None);
        assert_eq!(slot.handle(), Some(&1));
        assert_eq!(slot.store(2), Some(1));

        assert_eq!(slot.take(), Some(2));
        assert_eq!(slot.take(), None);
        assert!(!slot.is_occupied());
    }
}
