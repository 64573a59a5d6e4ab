//! Core TOML config loading: read from path or platform default.

use crate::schema::DizanConfig;
use dizan_common::ConfigError;
use std::path::Path;
use tracing::info;

use super::paths::{create_default_config, default_config_path};

/// Load config from a specific TOML file path.
///
/// Deserializes the file using serde defaults for any missing fields.
/// Validation is left to the caller so that every problem is reported at once.
pub fn load_from_path(path: &Path) -> Result<DizanConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: DizanConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/dizan/config.toml`
/// On Linux: `~/.config/dizan/config.toml`
///
/// If the file does not exist, writes the commented template and returns defaults.
pub fn load_default() -> Result<DizanConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!(path = %path.display(), "no config found, creating default");
            create_default_config(&path)?;
            Ok(DizanConfig::default())
        }
        Err(e) => Err(e),
    }
}
