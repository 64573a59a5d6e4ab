//! Persona configuration types.

use serde::{Deserialize, Serialize};

/// Optional replacement for the built-in therapist preamble.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PersonaConfig {
    pub preamble: Option<String>,
}
