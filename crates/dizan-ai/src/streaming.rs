//! Server-Sent Events (SSE) streaming parser.
//!
//! Gemini streams `streamGenerateContent?alt=sse` replies as SSE. Decoding is
//! split in two: `SseDecoder` turns lines into events synchronously, and
//! `sse_events` drives it over any async line source as a lazy stream.

use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio_util::io::StreamReader;

use crate::CompletionError;

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event type, when the server names one.
    pub event: Option<String>,
    /// The event data; multiple `data:` lines are joined with `\n`.
    pub data: String,
}

/// Line-oriented SSE state machine.
#[derive(Debug, Default)]
pub struct SseDecoder {
    event: Option<String>,
    data: String,
    has_data: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its terminator). Returns an event when the
    /// line closes one.
    pub fn push_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            // id, retry and unknown fields carry nothing we use
            _ => {}
        }
        None
    }

    /// Flush a trailing event when the stream ends without a blank line.
    pub fn finish(&mut self) -> Option<SseEvent> {
        self.dispatch()
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(SseEvent {
            event,
            data: std::mem::take(&mut self.data),
        })
    }
}

struct EventSource<R> {
    lines: Lines<R>,
    decoder: SseDecoder,
    done: bool,
}

/// Decode SSE events from an async reader, lazily.
///
/// The stream ends after the source is exhausted or after the first read
/// error, which is yielded as `CompletionError::Network`.
pub fn sse_events<R>(reader: R) -> BoxStream<'static, Result<SseEvent, CompletionError>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let source = EventSource {
        lines: reader.lines(),
        decoder: SseDecoder::new(),
        done: false,
    };

    stream::unfold(source, |mut source| async move {
        if source.done {
            return None;
        }
        loop {
            match source.lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(event) = source.decoder.push_line(&line) {
                        return Some((Ok(event), source));
                    }
                }
                Ok(None) => {
                    source.done = true;
                    return source.decoder.finish().map(|event| (Ok(event), source));
                }
                Err(e) => {
                    source.done = true;
                    return Some((Err(CompletionError::Network(e.to_string())), source));
                }
            }
        }
    })
    .boxed()
}

/// Adapt a reqwest body into a buffered async reader.
pub fn response_reader(
    response: reqwest::Response,
) -> impl AsyncBufRead + Unpin + Send + 'static {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    tokio::io::BufReader::new(StreamReader::new(Box::pin(byte_stream)))
}
