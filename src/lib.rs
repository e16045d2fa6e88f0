//! Cozy Leaf - a calm image gallery with background soundscapes.
//!
//! A two-column gallery of bundled and remote images, each opening a
//! full-screen detail page that loops its own ambient audio. Remote-hosted
//! images are hidden while the network is unavailable. Built with Libadwaita
//! for the interface and `cpal`/`symphonia` for native audio playback.

pub mod audio;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod network;
pub mod platform;
pub mod state;
pub mod ui;

// Re-export key types for convenience
pub use {
    audio::{AudioBackend, AudioHandle, NativeAudioBackend, PlaybackOptions, PlaybackStatus},
    catalog::{CATALOG, CatalogItem, MediaSource, visible_items},
    config::{SettingsManager, UserSettings},
    error::{AudioError, GalleryError},
    network::{ConnectivityMonitor, ConnectivityState},
    state::{AppState, AppStateEvent, DetailSession, PlaybackState, Route},
    ui::CozyLeafApplication,
};
