//! Cozy Leaf - image gallery with background soundscapes.
//!
//! Loads the user settings, installs logging, and runs the Libadwaita
//! application. The tokio runtime created here performs asset downloads,
//! decoding and playback status ticks; the interface itself runs on the GTK
//! main loop on this thread.

use {
    anyhow::Result,
    cozyleaf::{
        config::SettingsManager, error::ResultExt, logging::init_logging,
        ui::CozyLeafApplication,
    },
    tokio::runtime::Handle,
    tracing::info,
};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = SettingsManager::new().add_context("Failed to initialize settings")?;

    let log_filter = settings.get_settings().log_filter.clone();
    init_logging(&log_filter)?;
    info!(
        config = %settings.get_config_path().display(),
        "Starting Cozy Leaf {}",
        env!("CARGO_PKG_VERSION")
    );

    let app = CozyLeafApplication::new(settings, Handle::current())?;
    let exit_code = app.run();
    info!(?exit_code, "Cozy Leaf exited");

    Ok(())
}
