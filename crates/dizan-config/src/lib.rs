//! Dizan configuration system.
//!
//! Provides TOML-based configuration with full validation and API key
//! resolution. All config sections use defaults so partial configs work
//! out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! let config = dizan_config::load_config(None).expect("failed to load config");
//! println!("serving on {}", config.server.bind_addr());
//! ```

pub mod credentials;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use credentials::{api_key_from_env, ApiKey, API_KEY_ENV};
pub use schema::DizanConfig;

use std::path::Path;

use dizan_common::ConfigError;

/// Load and validate config.
///
/// An explicit `path` must exist. Without one, the platform default is used
/// and created from the template when missing.
pub fn load_config(path: Option<&Path>) -> Result<DizanConfig, ConfigError> {
    let config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };

    validation::validate(&config)?;
    Ok(config)
}
