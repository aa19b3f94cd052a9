//! Process settings
//!
//! A YAML settings file (default `~/.mcegen/config.yaml`) layered under CLI
//! flags and their environment fallbacks.

pub mod settings;

pub use settings::{
    expand_path, parse_settings, DefaultSettings, GitOpsSettings, ServerSettings, Settings,
    SettingsError, SettingsOverrides, DEFAULT_BIND_ADDR, DEFAULT_PORT,
};

use std::path::{Path, PathBuf};

use tracing::debug;

/// Default settings file location: ~/.mcegen/config.yaml
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mcegen")
        .join("config.yaml")
}

// ============================================================================
// SBIO: I/O wrapper - thin layer over pure functions
// ============================================================================

/// Load settings from a file. A missing file yields defaults.
pub fn load_settings_from(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        debug!("No settings file at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut settings = parse_settings(&content)?;
    settings.expand_paths();
    Ok(settings)
}

/// Load from an explicit path, or the default location
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    match path {
        Some(path) => load_settings_from(path),
        None => load_settings_from(&default_config_path()),
    }
}
