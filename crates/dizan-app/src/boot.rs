//! Startup wiring: credential, completion client, and per-session defaults.

use std::sync::Arc;
use std::time::Duration;

use dizan_ai::{
    CompletionError, CompletionService, GeminiClient, GeminiConfig, PersonaPreamble,
    SessionOptions,
};
use dizan_common::{ConfigError, DizanError};
use dizan_config::schema::{CompletionConfig, PersonaConfig};
use dizan_config::{ApiKey, DizanConfig};
use tracing::{info, warn};

/// Everything a surface needs to open sessions.
#[derive(Clone)]
pub struct Runtime {
    pub service: Arc<dyn CompletionService>,
    pub preamble: PersonaPreamble,
    pub options: SessionOptions,
}

/// Build the Gemini client and check the credential before anything is served.
///
/// A rejected key aborts startup. If the check itself cannot reach the
/// service, startup continues and the first submission reports the problem.
pub async fn boot(config: &DizanConfig, api_key: ApiKey) -> Result<Runtime, DizanError> {
    let completion = &config.completion;
    let client = GeminiClient::new(
        GeminiConfig::new(api_key.expose())
            .with_model(completion.model.as_str())
            .with_max_output_tokens(completion.max_output_tokens)
            .with_temperature(completion.temperature),
    )
    .map_err(|e| DizanError::Other(format!("failed to build completion client: {e}")))?;

    if completion.verify_credential {
        check_credential(client.verify_credential().await)?;
    }

    let preamble = persona_preamble(&config.persona);
    info!(
        model = client.model(),
        streaming = completion.streaming,
        custom_persona = config.persona.preamble.is_some(),
        "completion service ready"
    );

    Ok(Runtime {
        service: Arc::new(client),
        preamble,
        options: session_options(completion),
    })
}

/// Outcome of the startup credential check: only an explicit rejection is fatal.
pub fn check_credential(result: Result<(), CompletionError>) -> Result<(), DizanError> {
    match result {
        Ok(()) => Ok(()),
        Err(CompletionError::Auth(message)) => Err(ConfigError::CredentialRejected(message).into()),
        Err(e) => {
            warn!(error = %e, "could not verify credential, continuing");
            Ok(())
        }
    }
}

pub fn session_options(completion: &CompletionConfig) -> SessionOptions {
    SessionOptions {
        streaming: completion.streaming,
        timeout: Duration::from_secs(completion.timeout_secs),
        max_retries: completion.max_retries,
        max_context_exchanges: completion.max_context_exchanges,
        ..SessionOptions::default()
    }
}

pub fn persona_preamble(persona: &PersonaConfig) -> PersonaPreamble {
    match &persona.preamble {
        Some(text) => PersonaPreamble::new(text.as_str()),
        None => PersonaPreamble::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dizan_ai::DEFAULT_PERSONA_PREAMBLE;

    #[test]
    fn rejected_key_aborts_startup() {
        let err = check_credential(Err(CompletionError::Auth("API key not valid".into())))
            .unwrap_err();
        assert!(matches!(
            err,
            DizanError::Config(ConfigError::CredentialRejected(ref m)) if m == "API key not valid"
        ));
    }

    #[test]
    fn unreachable_service_only_warns() {
        assert!(check_credential(Err(CompletionError::Network("dns failure".into()))).is_ok());
        assert!(check_credential(Err(CompletionError::Timeout(Duration::from_secs(10)))).is_ok());
    }

    #[test]
    fn accepted_key_passes() {
        assert!(check_credential(Ok(())).is_ok());
    }

    #[test]
    fn session_options_follow_completion_config() {
        let completion = CompletionConfig {
            streaming: false,
            timeout_secs: 12,
            max_retries: 3,
            max_context_exchanges: 7,
            ..CompletionConfig::default()
        };
        let options = session_options(&completion);
        assert!(!options.streaming);
        assert_eq!(options.timeout, Duration::from_secs(12));
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.max_context_exchanges, 7);
        assert_eq!(options.retry_delay, SessionOptions::default().retry_delay);
    }

    #[test]
    fn default_persona_uses_built_in_preamble() {
        let preamble = persona_preamble(&PersonaConfig::default());
        assert_eq!(preamble.as_str(), DEFAULT_PERSONA_PREAMBLE);
    }

    #[test]
    fn configured_persona_overrides_preamble() {
        let persona = PersonaConfig {
            preamble: Some("Be brief and kind.".into()),
        };
        assert_eq!(persona_preamble(&persona).as_str(), "Be brief and kind.");
    }
}
