//! What the detail screen renders for a route id.

use crate::{
    catalog::{CatalogItem, find_in},
    error::GalleryError,
    network::ConnectivityState,
    state::audio_slot::PlaybackState,
};

/// Resolved content of the detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailContent<'a> {
    /// The id is not in the catalog.
    NotFound { id: String },
    /// The item needs the network for its image and the network is down.
    Offline(&'a CatalogItem),
    /// Full-screen image with playback controls.
    Ready(&'a CatalogItem),
}

impl<'a> DetailContent<'a> {
    /// Resolves `id` against `catalog` under the current connectivity.
    ///
    /// Only a confirmed `Disconnected` reading gates content, and only for
    /// remotely hosted images.
    #[must_use]
    pub fn resolve(
        catalog: &'a [CatalogItem],
        id: &str,
        connectivity: ConnectivityState,
    ) -> Self {
        match find_in(catalog, id) {
            None => Self::NotFound { id: id.to_string() },
            Some(item) if connectivity.is_disconnected() && item.image.is_remote() => {
                Self::Offline(item)
            }
            Some(item) => Self::Ready(item),
        }
    }

    /// The item whose image and audio may be used.
    #[must_use]
    pub fn playable_item(&self) -> Option<&'a CatalogItem> {
        match self {
            Self::Ready(item) => Some(*item),
            Self::NotFound { .. } | Self::Offline(_) => None,
        }
    }

    /// The error this content stands for, if it is a placeholder.
    #[must_use]
    pub fn error(&self) -> Option<GalleryError> {
        match self {
            Self::NotFound { id } => Some(GalleryError::not_found(id.clone())),
            Self::Offline(item) => Some(GalleryError::connectivity_unavailable(
                item.image.to_string(),
            )),
            Self::Ready(_) => None,
        }
    }
}

/// Presentation of the play/pause control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayControl {
    pub icon_name: &'static str,
    pub tooltip: &'static str,
    /// Label announced by screen readers.
    pub accessible_label: &'static str,
    pub sensitive: bool,
    /// Show a spinner instead of the icon.
    pub loading: bool,
}

impl PlayControl {
    #[must_use]
    pub fn for_state(state: PlaybackState) -> Self {
        match state {
            PlaybackState::Idle | PlaybackState::Paused => Self {
                icon_name: "media-playback-start-symbolic",
                tooltip: "Play",
                accessible_label: "Play audio",
                sensitive: true,
                loading: false,
            },
            PlaybackState::Playing => Self {
                icon_name: "media-playback-pause-symbolic",
                tooltip: "Pause",
                accessible_label: "Pause audio",
                sensitive: true,
                loading: false,
            },
            PlaybackState::Loading => Self {
                icon_name: "content-loading-symbolic",
                tooltip: "Loading",
                accessible_label: "Loading audio",
                sensitive: false,
                loading: true,
            },
            PlaybackState::Unloaded => Self {
                icon_name: "media-playback-start-symbolic",
                tooltip: "Play",
                accessible_label: "Play audio",
                sensitive: false,
                loading: false,
            },
        }
    }
}
