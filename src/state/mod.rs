//! Application and screen state.
//!
//! `AppState` is shared by every view; the detail screen's audio lifecycle
//! lives in [`DetailSession`], which owns the only audio handle.

pub mod app_state;
pub mod audio_slot;
pub mod detail_content;
pub mod detail_session;
pub mod navigation;

#[cfg(test)]
mod tests;

pub use {
    app_state::{AppState, AppStateEvent},
    audio_slot::{AudioSlot, PlaybackState},
    detail_content::{DetailContent, PlayControl},
    detail_session::{DetailSession, LoadRequest, SessionEvent, SessionNotice},
    navigation::Route,
};
