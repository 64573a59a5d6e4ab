//! Configuration schema types for Dizan.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults documented in the template.

mod completion;
mod persona;
mod server;
mod system;

pub use completion::*;
pub use persona::*;
pub use server::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Root configuration for Dizan.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct DizanConfig {
    pub server: ServerConfig,
    pub completion: CompletionConfig,
    pub persona: PersonaConfig,
    pub logging: LoggingConfig,
}
