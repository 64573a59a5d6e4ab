//! Persona configuration validation.

use crate::schema::DizanConfig;

use super::helpers::validate_not_blank;

/// A configured preamble must say something.
pub(crate) fn validate_persona(errors: &mut Vec<String>, config: &DizanConfig) {
    if let Some(ref preamble) = config.persona.preamble {
        validate_not_blank(errors, "persona.preamble", preamble);
    }
}
