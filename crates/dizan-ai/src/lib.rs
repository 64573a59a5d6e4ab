//! Conversation engine for Dizan.
//!
//! Provides:
//! - the `CompletionService` seam and its Gemini implementation
//! - Server-Sent Events decoding for streamed replies
//! - the per-session controller that owns the transcript and the
//!   turn-taking protocol with the model

pub mod gemini;
pub mod session;
pub mod streaming;

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

pub use gemini::{GeminiClient, GeminiConfig};
pub use session::{
    PersonaPreamble, Reservation, Session, SessionError, SessionOptions, Speaker, Submission,
    Transcript, Turn, DEFAULT_PERSONA_PREAMBLE,
};

/// A hosted model that turns a prompt (plus earlier exchanges) into text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Start a completion. With `streaming` the service may hand back a
    /// fragment stream; otherwise it returns the whole reply.
    async fn invoke(
        &self,
        context: &[Message],
        prompt: &str,
        streaming: bool,
    ) -> Result<ResponseHandle, CompletionError>;
}

/// One exchange entry replayed to the model.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Lazy, finite, forward-only sequence of reply fragments.
pub type FragmentStream = BoxStream<'static, Result<String, CompletionError>>;

/// What a completion service hands back.
pub enum ResponseHandle {
    Complete(String),
    Fragments(FragmentStream),
}

impl std::fmt::Debug for ResponseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            Self::Fragments(_) => f.write_str("Fragments(..)"),
        }
    }
}

impl ResponseHandle {
    /// Drain the response, concatenating fragments in delivery order.
    ///
    /// `on_fragment` sees every non-empty piece as it arrives. The first
    /// error ends consumption.
    pub async fn collect_text<F>(self, mut on_fragment: F) -> Result<String, CompletionError>
    where
        F: FnMut(&str) + Send,
    {
        match self {
            Self::Complete(text) => {
                if !text.is_empty() {
                    on_fragment(&text);
                }
                Ok(text)
            }
            Self::Fragments(mut stream) => {
                let mut full = String::new();
                while let Some(fragment) = stream.next().await {
                    let fragment = fragment?;
                    if fragment.is_empty() {
                        continue;
                    }
                    on_fragment(&fragment);
                    full.push_str(&fragment);
                }
                Ok(full)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompletionError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("blocked by safety filters: {0}")]
    SafetyRejected(String),
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("parse error: {0}")]
    Parse(String),
}

impl CompletionError {
    /// Whether retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Auth(_) | Self::SafetyRejected(_) | Self::Parse(_) => false,
        }
    }
}
