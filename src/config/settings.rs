//! User preference management with XDG Base Directory compliance.
//!
//! Settings live in `$XDG_CONFIG_HOME/cozyleaf/settings.json`; bundled assets
//! default to `$XDG_DATA_HOME/cozyleaf/assets`.

use std::{
    env::var,
    fs::{create_dir_all, read_to_string, write},
    io::Error as StdError,
    path::PathBuf,
    time::Duration,
};

use {
    parking_lot::{RwLock, RwLockReadGuard},
    serde::{Deserialize, Serialize},
    serde_json::{Error as SerdeJsonError, from_str, to_string_pretty},
    thiserror::Error,
    tracing::debug,
};

/// Error type for settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read or write settings file.
    #[error("IO error: {0}")]
    IoError(#[from] StdError),
    /// Failed to serialize or deserialize settings.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerdeJsonError),
    /// Invalid settings value.
    #[error("Invalid settings value: {reason}")]
    InvalidValue { reason: String },
}

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    /// Follow the desktop setting.
    #[default]
    System,
    /// Always light.
    Light,
    /// Always dark.
    Dark,
}

/// Serializable user settings structure with default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Directory holding bundled image and audio assets.
    pub assets_dir: Option<String>,
    /// Default `tracing` filter, overridden by `RUST_LOG`.
    pub log_filter: String,
    /// Timeout for fetching remote assets, in seconds.
    pub fetch_timeout_secs: u64,
    /// Interval between playback status updates, in milliseconds.
    pub progress_interval_ms: u64,
    /// Number of columns in the gallery grid.
    pub grid_columns: u32,
    /// Theme preference.
    pub theme_preference: ThemePreference,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            assets_dir: None,
            log_filter: "cozyleaf=info,warn".to_string(),
            fetch_timeout_secs: 30,
            progress_interval_ms: 1000,
            grid_columns: 2,
            theme_preference: ThemePreference::System,
        }
    }
}

impl UserSettings {
    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` naming the first bad field.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |reason: &str| {
            Err(SettingsError::InvalidValue {
                reason: reason.to_string(),
            })
        };

        if self.fetch_timeout_secs == 0 {
            return invalid("fetch_timeout_secs must be greater than 0");
        }
        if self.progress_interval_ms == 0 {
            return invalid("progress_interval_ms must be greater than 0");
        }
        if self.grid_columns == 0 {
            return invalid("grid_columns must be greater than 0");
        }
        if self.log_filter.trim().is_empty() {
            return invalid("log_filter must not be empty");
        }
        Ok(())
    }

    /// Resolved assets directory.
    #[must_use]
    pub fn assets_dir(&self) -> PathBuf {
        match &self.assets_dir {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => {
                let mut dir = get_data_dir();
                dir.push("assets");
                dir
            }
        }
    }

    /// Remote fetch timeout.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Playback status interval.
    #[must_use]
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

/// Handles loading, saving, and validation of user preferences.
#[derive(Debug)]
pub struct SettingsManager {
    /// Thread-safe user settings storage.
    settings: RwLock<UserSettings>,
    /// Path to the configuration file on disk.
    config_path: PathBuf,
}

impl Clone for SettingsManager {
    fn clone(&self) -> Self {
        Self {
            settings: RwLock::new(self.settings.read().clone()),
            config_path: self.config_path.clone(),
        }
    }
}

impl SettingsManager {
    /// Creates a new settings manager with the default config path.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if settings cannot be loaded from disk.
    pub fn new() -> Result<Self, SettingsError> {
        Self::with_config_path(get_config_path())
    }

    /// Creates a new settings manager with a custom config path.
    ///
    /// A missing file yields default settings; nothing is written until
    /// [`SettingsManager::update_settings`] is called.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the file exists but cannot be read, parsed,
    /// or fails validation.
    pub fn with_config_path(config_path: PathBuf) -> Result<Self, SettingsError> {
        let settings = if config_path.exists() {
            debug!("Loading settings from existing file: {:?}", config_path);
            let contents = read_to_string(&config_path)?;
            let settings: UserSettings = from_str(&contents)?;
            settings.validate()?;
            settings
        } else {
            debug!("No settings file at {:?}, using defaults", config_path);
            UserSettings::default()
        };

        Ok(SettingsManager {
            settings: RwLock::new(settings),
            config_path,
        })
    }

    /// Gets the current settings.
    pub fn get_settings(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.settings.read()
    }

    /// Gets the configuration file path.
    pub fn get_config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Validates, applies and saves new settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the settings are invalid or cannot be saved.
    pub fn update_settings(&self, new_settings: UserSettings) -> Result<(), SettingsError> {
        new_settings.validate()?;
        *self.settings.write() = new_settings;
        self.save_settings()
    }

    fn save_settings(&self) -> Result<(), SettingsError> {
        debug!("Saving settings to file: {:?}", self.config_path);
        if let Some(parent) = self.config_path.parent() {
            create_dir_all(parent)?;
        }
        let contents = to_string_pretty(&*self.settings.read())?;
        write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Path to the configuration file.
#[must_use]
pub fn get_config_path() -> PathBuf {
    let mut config_dir = xdg_dir("XDG_CONFIG_HOME", ".config");
    config_dir.push("cozyleaf");
    config_dir.push("settings.json");
    config_dir
}

/// Path to the application data directory.
#[must_use]
pub fn get_data_dir() -> PathBuf {
    let mut data_dir = xdg_dir("XDG_DATA_HOME", ".local/share");
    data_dir.push("cozyleaf");
    data_dir
}

/// Resolves an XDG base directory, falling back to `$HOME/<fallback>`.
fn xdg_dir(variable: &str, fallback: &str) -> PathBuf {
    if let Ok(dir) = var(variable)
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }

    if let Ok(home) = var("HOME") {
        let mut path = PathBuf::from(home);
        path.push(fallback);
        return path;
    }

    PathBuf::from(".")
}
