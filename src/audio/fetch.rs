//! Retrieval of encoded asset bytes from the assets directory or over HTTP.

use std::{
    io::Error as IoError,
    path::{Path, PathBuf},
    time::Duration,
};

use {
    reqwest::{Client, redirect::Policy},
    thiserror::Error,
    tokio::{fs::read, runtime::Handle},
    tracing::debug,
};

use crate::catalog::MediaSource;

/// Error type for asset retrieval.
#[derive(Error, Debug)]
pub enum FetchError {
    /// A bundled asset could not be read.
    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    /// The remote request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    /// The background task was cancelled or panicked.
    #[error("Fetch interrupted: {0}")]
    Interrupted(String),
}

/// Loads asset bytes on the shared tokio runtime.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    client: Client,
    assets_dir: PathBuf,
    runtime: Handle,
}

impl SourceFetcher {
    /// Creates a fetcher rooted at `assets_dir`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::HttpError` if the HTTP client cannot be built.
    pub fn new(
        assets_dir: impl Into<PathBuf>,
        timeout: Duration,
        runtime: Handle,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(Policy::limited(10))
            .user_agent(concat!("CozyLeaf/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            assets_dir: assets_dir.into(),
            runtime,
        })
    }

    #[must_use]
    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Reads the full contents of `source`.
    ///
    /// The returned future may be polled from any executor; the work itself
    /// runs on the fetcher's runtime.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the asset cannot be read or downloaded.
    pub async fn fetch(&self, source: MediaSource) -> Result<Vec<u8>, FetchError> {
        match source {
            MediaSource::Local(_) => {
                let path = source
                    .local_path(&self.assets_dir)
                    .unwrap_or_else(|| self.assets_dir.clone());
                debug!(path = %path.display(), "Reading bundled asset");
                self.runtime
                    .spawn(async move {
                        read(&path)
                            .await
                            .map_err(|source| FetchError::IoError { path, source })
                    })
                    .await
                    .map_err(|e| FetchError::Interrupted(e.to_string()))?
            }
            MediaSource::Remote(url) => {
                debug!(url, "Downloading remote asset");
                let client = self.client.clone();
                self.runtime
                    .spawn(async move {
                        let response = client.get(url).send().await?.error_for_status()?;
                        let bytes = response.bytes().await?;
                        Ok::<_, FetchError>(bytes.to_vec())
                    })
                    .await
                    .map_err(|e| FetchError::Interrupted(e.to_string()))?
            }
        }
    }
}
