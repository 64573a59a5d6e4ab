//! Full configuration validation.
//!
//! Each section has its own validator; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod completion;
mod helpers;
mod persona;
mod server;


use crate::schema::DizanConfig;
use dizan_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &DizanConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    server::validate_server(&mut errors, config);
    completion::validate_completion(&mut errors, config);
    persona::validate_persona(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
