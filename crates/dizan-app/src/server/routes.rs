//! Request handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use dizan_ai::{Session, Submission, Turn};
use dizan_common::SessionId;
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::page::INDEX_HTML;
use super::AppState;
use crate::render;

#[derive(Debug, thiserror::Error)]
pub(super) enum ApiError {
    #[error("session not found")]
    NotFound,
    #[error("session is busy with another request")]
    Busy,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Busy => StatusCode::CONFLICT,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn lookup(state: &AppState, raw: &str) -> Result<Arc<Session>, ApiError> {
    let id = SessionId::parse(raw).ok_or(ApiError::NotFound)?;
    state.store.get(&id).await.ok_or(ApiError::NotFound)
}

pub(super) async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct CreatedSession {
    pub(super) session_id: String,
}

pub(super) async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<CreatedSession>) {
    let runtime = &state.runtime;
    let session = state
        .store
        .create(runtime.preamble.clone(), runtime.options.clone())
        .await;
    (
        StatusCode::CREATED,
        Json(CreatedSession {
            session_id: session.id().to_string(),
        }),
    )
}

pub(super) async fn transcript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Turn>>, ApiError> {
    let session = lookup(&state, &id).await?;
    Ok(Json(session.transcript()))
}

pub(super) async fn transcript_html(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let session = lookup(&state, &id).await?;
    Ok(Html(render::transcript_html(&session.transcript())))
}

#[derive(Debug, Deserialize)]
pub(super) struct SubmitRequest {
    question: String,
}

/// Run one submission and stream its progress as SSE.
///
/// Events: `fragment` (`{text}`) while the reply arrives, then exactly one
/// of `done` (`{html}`, the re-rendered transcript), `ignored`, or `error`
/// (`{message}`). Closing the connection abandons the submission.
pub(super) async fn submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let session = lookup(&state, &id).await?;
    // claimed here so a second submit is refused before this one is spawned
    let reservation = session.reserve().map_err(|_| ApiError::Busy)?;

    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let disconnect = CancellationToken::new();
    let guard = disconnect.clone().drop_guard();
    let service = state.runtime.service.clone();

    tokio::spawn(async move {
        let fragments = tx.clone();
        let submission = session.submit_reserved(
            reservation,
            service.as_ref(),
            &request.question,
            move |text| {
                let _ = fragments.send(event("fragment", json!({ "text": text })));
            },
        );

        let outcome = tokio::select! {
            outcome = submission => outcome,
            _ = disconnect.cancelled() => {
                tracing::debug!(session_id = %session.id(), "Client disconnected, submission abandoned");
                return;
            }
        };

        let last = match outcome {
            Ok(Submission::Answered(_)) => event(
                "done",
                json!({ "html": render::transcript_html(&session.transcript()) }),
            ),
            Ok(Submission::Ignored) => event("ignored", json!({})),
            Err(e) => {
                tracing::warn!(session_id = %session.id(), error = %e, "Submission failed");
                event("error", json!({ "message": render::notice(&e) }))
            }
        };
        let _ = tx.send(last);
    });

    let events = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let event = rx.recv().await?;
        Some((Ok::<_, Infallible>(event), (rx, guard)))
    });
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn event(name: &'static str, data: serde_json::Value) -> Event {
    match Event::default().event(name).json_data(data) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(event = name, error = %e, "Failed to encode SSE payload");
            Event::default().event(name)
        }
    }
}

pub(super) async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = lookup(&state, &id).await?;
    Ok(Json(json!({ "cancelled": session.cancel() })))
}

pub(super) async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = SessionId::parse(&id).ok_or(ApiError::NotFound)?;
    state.store.remove(&id).await.ok_or(ApiError::NotFound)?;
    Ok(StatusCode::NO_CONTENT)
}
