//! Session store: maps session IDs to live conversation sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dizan_ai::{PersonaPreamble, Session, SessionOptions};
use dizan_common::SessionId;
use tokio::sync::RwLock;

/// Thread-safe session store.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh session and return a handle to it.
    pub async fn create(&self, preamble: PersonaPreamble, options: SessionOptions) -> Arc<Session> {
        let session = Arc::new(Session::new(preamble).with_options(options));
        self.sessions
            .write()
            .await
            .insert(session.id().clone(), session.clone());
        tracing::info!(session_id = %session.id(), "Session created");
        session
    }

    pub async fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// End a session, cancelling any submission it has in flight.
    pub async fn remove(&self, id: &SessionId) -> Option<Arc<Session>> {
        let session = self.sessions.write().await.remove(id)?;
        session.cancel();
        tracing::info!(session_id = %id, "Session ended");
        Some(session)
    }

    /// Drop sessions idle for longer than `max_idle`. Busy sessions are kept.
    /// Returns the number reaped.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let mut map = self.sessions.write().await;
        let before = map.len();
        map.retain(|id, session| {
            let stale = !session.is_busy() && session.idle_for() > max_idle;
            if stale {
                tracing::info!(session_id = %id, "Reaping idle session");
            }
            !stale
        });
        before - map.len()
    }

    /// Number of active sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
