//! Platform-specific settings locations.
//!
//! The settings file lives in the working directory by default, matching the
//! way the synthesizer has always been run from its checkout. A per-user
//! location is available for installs:
//!
//! - Linux: `~/.config/synthone/`
//! - macOS: `~/Library/Application Support/synthone/`
//! - Windows: `%APPDATA%\synthone\`

use std::path::{Path, PathBuf};

use crate::settings::DEFAULT_SETTINGS_FILE;

/// Application name used for directory paths.
const APP_NAME: &str = "synthone";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Settings file inside [`user_config_dir`].
pub fn user_settings_path() -> PathBuf {
    user_config_dir().join(DEFAULT_SETTINGS_FILE)
}

/// Settings file in the working directory.
pub fn default_settings_path() -> PathBuf {
    PathBuf::from(DEFAULT_SETTINGS_FILE)
}

/// Pick the settings file to use: an explicit path wins, else the working
/// directory default.
pub fn resolve_settings_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(default_settings_path, Path::to_path_buf)
}
