//! Operational error context propagation with `anyhow`.
//!
//! This module provides extension traits and utilities for enhancing
//! error context and centralized error reporting.

use std::{error::Error as StdError, fmt::Display};

use {
    anyhow::{Context, Error, Result as AnyhowResult},
    tracing::{error, warn},
};

use crate::error::domain::GalleryError;

/// Extension trait for enhanced error context.
pub trait ResultExt<T, E> {
    /// Adds context to an error with a static string.
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;

    /// Adds context to an error with a formatted string.
    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(context)
    }

    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(format.to_string())
    }
}

/// Centralized error reporting and logging.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Reports a recoverable error.
    pub fn warn(error: &Error, context: &str) {
        warn!(context = context, error = format!("{error:#}"), "Recovered from error");
    }

    /// Reports an unexpected error.
    pub fn error(error: &Error, context: &str) {
        error!(context = context, error = format!("{error:#}"), "Unexpected error");
    }

    /// Converts an error to a message suitable for display.
    ///
    /// Known gallery errors get a fixed wording; anything else falls back to
    /// the top-level message.
    pub fn to_user_message(error: &Error) -> String {
        match error.downcast_ref::<GalleryError>() {
            Some(GalleryError::NotFound { .. }) => "This image could not be found".to_string(),
            Some(GalleryError::ConnectivityUnavailable { .. }) => {
                "No internet connection".to_string()
            }
            Some(GalleryError::Resource(_)) => "Audio could not be played".to_string(),
            None => error.to_string(),
        }
    }
}
