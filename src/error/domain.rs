//! Domain-specific error types using `thiserror`.
//!
//! `GalleryError` is the taxonomy the views recover from locally; `AudioError`
//! covers everything the native audio path can fail with.

use std::result::Result as StdResult;

use {anyhow::Error, thiserror::Error};

use crate::audio::{
    decoder::DecoderError, fetch::FetchError, output::OutputError, resampler::ResamplingError,
};

/// Audio-related errors.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The source could not be fetched.
    #[error("Fetch error: {0}")]
    FetchError(#[from] FetchError),
    /// The source could not be decoded.
    #[error("Decoder error: {0}")]
    DecoderError(#[from] DecoderError),
    /// The clip could not be converted to the device rate.
    #[error("Resampling error: {0}")]
    ResamplingError(#[from] ResamplingError),
    /// The output device rejected the stream.
    #[error("Output error: {0}")]
    OutputError(#[from] OutputError),
    /// The handle was never loaded or has already been unloaded.
    #[error("Unknown audio handle {id}")]
    UnknownHandle { id: u64 },
    /// Invalid operation for the current state.
    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },
}

/// Errors surfaced by the gallery and detail views.
///
/// None of these are fatal: every variant maps to a placeholder or a
/// retry-capable control.
#[derive(Error, Debug)]
pub enum GalleryError {
    /// The requested catalog id does not exist.
    #[error("No gallery item with id {id}")]
    NotFound { id: String },
    /// Loading or playing an asset failed.
    #[error("Resource error: {0}")]
    Resource(#[from] AudioError),
    /// A remote asset is required while the network is unavailable.
    #[error("Network unavailable for {resource}")]
    ConnectivityUnavailable { resource: String },
}

impl GalleryError {
    /// Creates a new `NotFound` error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a new `ConnectivityUnavailable` error.
    pub fn connectivity_unavailable(resource: impl Into<String>) -> Self {
        Self::ConnectivityUnavailable {
            resource: resource.into(),
        }
    }
}

/// Operational error context propagation with `anyhow`.
pub type Result<T> = StdResult<T, Error>;
