//! Data models for the gallery catalog.
//!
//! Items are immutable and `'static`: every string lives in the binary, so
//! entries can be copied freely between views and the audio session.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use serde::Serialize;

/// Location of an image or audio asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum MediaSource {
    /// Asset bundled with the application, relative to the assets directory.
    Local(&'static str),
    /// Asset hosted remotely and fetched over HTTP(S).
    Remote(&'static str),
}

impl MediaSource {
    /// Whether the asset is bundled with the application.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, MediaSource::Local(_))
    }

    /// Whether the asset requires network access.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, MediaSource::Remote(_))
    }

    /// Resolves a local asset against the assets directory.
    ///
    /// Returns `None` for remote sources.
    #[must_use]
    pub fn local_path(&self, assets_dir: &Path) -> Option<PathBuf> {
        match self {
            MediaSource::Local(relative) => Some(assets_dir.join(relative)),
            MediaSource::Remote(_) => None,
        }
    }

    /// File extension of the asset, used as a format hint when decoding.
    #[must_use]
    pub fn extension(&self) -> Option<&'static str> {
        let location = match self {
            MediaSource::Local(location) | MediaSource::Remote(location) => *location,
        };
        let file_name = location.rsplit('/').next()?;
        let file_name = file_name.split(['?', '#']).next()?;
        let (_, extension) = file_name.rsplit_once('.')?;
        (!extension.is_empty()).then_some(extension)
    }
}

impl Display for MediaSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaSource::Local(path) => write!(f, "asset:{path}"),
            MediaSource::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// A single gallery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    /// Stable unique identifier, used as the detail route parameter.
    pub id: &'static str,
    /// Display title.
    pub title: &'static str,
    /// Image shown in the grid card and as the detail background.
    pub image: MediaSource,
    /// Looping background audio for the detail view.
    pub audio: MediaSource,
}
