//! Gemini API client struct, request building, and error classification.

use tracing::{debug, info};

use crate::{CompletionError, Message, Role};

use super::chunk::chunk_text;
use super::config::GeminiConfig;

pub(crate) const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client.
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) http: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| CompletionError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub(crate) fn model_url(&self) -> String {
        format!("{}/{}", GEMINI_API_BASE, self.config.model)
    }

    pub(crate) fn api_url(&self, stream: bool) -> String {
        if stream {
            format!("{}:streamGenerateContent?alt=sse", self.model_url())
        } else {
            format!("{}:generateContent", self.model_url())
        }
    }

    /// Build the JSON request body: earlier exchanges, then the new prompt.
    pub(crate) fn build_request_body(&self, context: &[Message], prompt: &str) -> serde_json::Value {
        let mut contents: Vec<serde_json::Value> = context
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::User => "user",
                    Role::Model => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": msg.content }]
                })
            })
            .collect();

        contents.push(serde_json::json!({
            "role": "user",
            "parts": [{ "text": prompt }]
        }));

        serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.max_output_tokens,
                "temperature": self.config.temperature,
            }
        })
    }

    /// Parse a non-streamed `generateContent` response.
    pub(crate) fn parse_response(&self, json: &serde_json::Value) -> Result<String, CompletionError> {
        if json["candidates"].as_array().is_none() && json.get("promptFeedback").is_none() {
            return Err(CompletionError::Parse("no candidates in response".to_string()));
        }
        Ok(chunk_text(json)?.unwrap_or_default())
    }

    /// Check that the API key is accepted by fetching the model's metadata.
    pub async fn verify_credential(&self) -> Result<(), CompletionError> {
        debug!(model = %self.config.model, "verifying Gemini credential");

        let response = self
            .http
            .get(self.model_url())
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &body));
        }

        info!(model = %self.config.model, "Gemini credential accepted");
        Ok(())
    }
}

/// Map a failed HTTP status (and its body) onto the error taxonomy.
pub(crate) fn classify_status(status: u16, body: &str) -> CompletionError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        401 | 403 => CompletionError::Auth(message),
        400 if body.contains("API_KEY_INVALID") => CompletionError::Auth(message),
        429 => CompletionError::RateLimited(message),
        _ => CompletionError::Api { status, message },
    }
}
