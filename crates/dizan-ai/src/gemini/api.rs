//! CompletionService implementation for GeminiClient (whole + streamed replies).

use async_trait::async_trait;
use futures_util::future;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tracing::debug;

use crate::streaming::{response_reader, sse_events, SseEvent};
use crate::{CompletionError, CompletionService, FragmentStream, Message, ResponseHandle};

use super::chunk::parse_chunk;
use super::client::{classify_status, GeminiClient};

#[async_trait]
impl CompletionService for GeminiClient {
    async fn invoke(
        &self,
        context: &[Message],
        prompt: &str,
        streaming: bool,
    ) -> Result<ResponseHandle, CompletionError> {
        let body = self.build_request_body(context, prompt);
        let url = self.api_url(streaming);

        debug!(
            model = %self.config.model,
            streaming,
            context_len = context.len(),
            "Gemini API request"
        );

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &text));
        }

        if !streaming {
            let json: serde_json::Value = response
                .json()
                .await
                .map_err(|e| CompletionError::Parse(e.to_string()))?;
            return Ok(ResponseHandle::Complete(self.parse_response(&json)?));
        }

        Ok(ResponseHandle::Fragments(fragment_stream(sse_events(
            response_reader(response),
        ))))
    }
}

/// Turn SSE events carrying Gemini JSON chunks into text fragments.
pub(crate) fn fragment_stream(
    events: BoxStream<'static, Result<SseEvent, CompletionError>>,
) -> FragmentStream {
    events
        .scan(false, |said_anything, event| {
            let item = event.and_then(|event| {
                let json: serde_json::Value = serde_json::from_str(&event.data)
                    .map_err(|e| CompletionError::Parse(e.to_string()))?;
                parse_chunk(&json)?.into_text(*said_anything)
            });
            if let Ok(Some(_)) = item {
                *said_anything = true;
            }
            future::ready(Some(item))
        })
        .filter_map(|item| future::ready(item.transpose()))
        .boxed()
}
