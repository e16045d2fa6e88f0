//! User preferences with XDG Base Directory compliance.

pub mod settings;

pub use settings::{
    SettingsError, SettingsManager, ThemePreference, UserSettings, get_config_path,
    get_data_dir,
};
