//! Interpretation of a single Gemini response object.
//!
//! The same JSON shape arrives whole from `generateContent` and piecewise
//! (one object per SSE event) from `streamGenerateContent`.

use serde_json::Value;

use crate::CompletionError;

/// Text carried by one response object, plus whether the model stopped
/// on a safety filter.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Chunk {
    pub text: String,
    pub safety_stop: Option<String>,
}

impl Chunk {
    /// Resolve to text, treating a safety stop with nothing said as a rejection.
    pub(crate) fn into_text(self, said_anything: bool) -> Result<Option<String>, CompletionError> {
        if !self.text.is_empty() {
            return Ok(Some(self.text));
        }
        match self.safety_stop {
            Some(reason) if !said_anything => Err(CompletionError::SafetyRejected(reason)),
            _ => Ok(None),
        }
    }
}

/// Read the first candidate's text parts, failing on API errors and
/// blocked prompts.
pub(crate) fn parse_chunk(json: &Value) -> Result<Chunk, CompletionError> {
    if let Some(error) = json.get("error") {
        let status = error["code"]
            .as_u64()
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(500);
        let message = error["message"]
            .as_str()
            .unwrap_or("unknown error")
            .to_string();
        return Err(match status {
            401 | 403 => CompletionError::Auth(message),
            429 => CompletionError::RateLimited(message),
            _ => CompletionError::Api { status, message },
        });
    }

    if let Some(reason) = json["promptFeedback"]["blockReason"].as_str() {
        return Err(CompletionError::SafetyRejected(reason.to_string()));
    }

    let mut chunk = Chunk::default();
    let Some(first) = json["candidates"].as_array().and_then(|c| c.first()) else {
        return Ok(chunk);
    };

    if let Some(parts) = first["content"]["parts"].as_array() {
        for part in parts {
            if let Some(text) = part["text"].as_str() {
                chunk.text.push_str(text);
            }
        }
    }

    if let Some(reason) = first["finishReason"].as_str() {
        if matches!(reason, "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII") {
            chunk.safety_stop = Some(reason.to_string());
        }
    }

    Ok(chunk)
}

/// Text of a complete (non-streamed) response.
pub(crate) fn chunk_text(json: &Value) -> Result<Option<String>, CompletionError> {
    parse_chunk(json)?.into_text(false)
}
