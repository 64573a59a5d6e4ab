//! HTTP surface: the chat page plus a small JSON/SSE API over sessions.

mod page;
mod routes;
mod store;


use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use dizan_common::DizanError;
use dizan_config::schema::ServerConfig;
use tokio::net::TcpListener;

use crate::boot::Runtime;

pub use store::SessionStore;

/// Shared state handed to every handler.
pub struct AppState {
    pub store: SessionStore,
    pub runtime: Runtime,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/sessions", post(routes::create_session))
        .route("/api/sessions/:id", axum::routing::delete(routes::end_session))
        .route("/api/sessions/:id/transcript", get(routes::transcript))
        .route("/api/sessions/:id/transcript.html", get(routes::transcript_html))
        .route("/api/sessions/:id/submit", post(routes::submit))
        .route("/api/sessions/:id/cancel", post(routes::cancel))
        .with_state(state)
}

/// Bind, start the idle-session reaper, and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, runtime: Runtime) -> Result<(), DizanError> {
    let state = Arc::new(AppState {
        store: SessionStore::new(),
        runtime,
    });

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("dizan listening on http://{}", addr);

    let reaper = spawn_reaper(
        state.store.clone(),
        Duration::from_secs(config.reap_interval_secs),
        Duration::from_secs(config.session_idle_secs),
    );

    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DizanError::Server(e.to_string()));

    reaper.abort();
    tracing::info!("Server stopped");
    result
}

fn spawn_reaper(
    store: SessionStore,
    interval: Duration,
    max_idle: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let reaped = store.reap_idle(max_idle).await;
            let count = store.count().await;
            tracing::debug!(sessions = count, reaped, "Reaper tick");
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
