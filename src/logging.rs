//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over the filter stored in the user settings.

use {
    anyhow::{Result, anyhow},
    tracing::info,
    tracing_subscriber::{
        EnvFilter,
        fmt::{self, format::FmtSpan},
        layer::SubscriberExt,
        util::SubscriberInitExt,
    },
};

/// Builds the filter from `RUST_LOG`, falling back to `default_filter`.
///
/// # Errors
///
/// Returns an error if `default_filter` is not a valid filter directive.
pub fn build_filter(default_filter: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| anyhow!("Invalid log filter {default_filter:?}: {e}")),
    }
}

/// Installs the global tracing subscriber writing to stderr.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init_logging(default_filter: &str) -> Result<()> {
    let filter = build_filter(default_filter)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))?;

    info!("Logging initialized");
    Ok(())
}
