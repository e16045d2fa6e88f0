//! Error handling built on `thiserror` and `anyhow`.
//!
//! Domain errors are precise enums the views match on; operational errors
//! carry `anyhow` context and are reported through `tracing`.

pub mod domain;
pub mod operational;

pub use {
    domain::{AudioError, GalleryError},
    operational::{ErrorReporter, ResultExt},
};
