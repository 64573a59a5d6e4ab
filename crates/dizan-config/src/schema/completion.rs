//! Completion service configuration types.

use serde::{Deserialize, Serialize};

/// Settings for the hosted generative model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    /// Bound on one invocation, and separately on consuming its reply.
    pub timeout_secs: u64,
    /// Extra attempts for transient invocation failures.
    pub max_retries: u32,
    /// Earlier exchanges replayed to the model; older ones are dropped.
    pub max_context_exchanges: usize,
    pub streaming: bool,
    /// Check the API key against the service before accepting sessions.
    pub verify_credential: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".into(),
            temperature: 0.7,
            max_output_tokens: 2048,
            timeout_secs: 60,
            max_retries: 1,
            max_context_exchanges: 50,
            streaming: true,
            verify_credential: true,
        }
    }
}
