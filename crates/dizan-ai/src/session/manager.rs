//! Session struct and read-side accessors.

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use dizan_common::SessionId;
use tracing::debug;

use crate::Message;

use super::prompt::PersonaPreamble;
use super::transcript::{Transcript, Turn};
use super::types::{BusyGuard, BusySlot, Reservation, SessionError, SessionOptions};

/// Everything that changes when an exchange completes. Kept behind one lock
/// so readers see either the whole exchange or none of it.
#[derive(Debug, Default)]
pub(super) struct SessionState {
    pub(super) transcript: Transcript,
    /// Prompts as sent and replies as received, replayed on each request.
    pub(super) context: Vec<Message>,
}

/// A conversation session: one transcript, one model context, at most one
/// request in flight.
pub struct Session {
    id: SessionId,
    preamble: PersonaPreamble,
    pub(super) options: SessionOptions,
    pub(super) state: RwLock<SessionState>,
    /// At most one request in flight.
    pub(super) busy: Arc<BusySlot>,
    last_active: Mutex<Instant>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("turns", &self.turn_count())
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(preamble: PersonaPreamble) -> Self {
        Self {
            id: SessionId::new(),
            preamble,
            options: SessionOptions::default(),
            state: RwLock::new(SessionState::default()),
            busy: Arc::new(BusySlot::default()),
            last_active: Mutex::new(Instant::now()),
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn preamble(&self) -> &PersonaPreamble {
        &self.preamble
    }

    /// Snapshot of all turns, oldest first.
    pub fn transcript(&self) -> Vec<Turn> {
        self.touch();
        self.read_state().transcript.turns().to_vec()
    }

    pub fn turn_count(&self) -> usize {
        self.read_state().transcript.len()
    }

    /// Number of messages the model will see ahead of the next prompt.
    pub fn context_len(&self) -> usize {
        self.read_state().context.len()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Claim the request slot now, for a submission that runs later.
    pub fn reserve(&self) -> Result<Reservation, SessionError> {
        let (guard, cancel) = BusyGuard::acquire(&self.busy)?;
        Ok(Reservation { guard, cancel })
    }

    /// Abort the request in flight. Returns false when there was none.
    pub fn cancel(&self) -> bool {
        let cancelled = self.busy.cancel();
        if cancelled {
            debug!(session = %self.id, "cancelling request in flight");
        }
        cancelled
    }

    pub fn touch(&self) {
        *self
            .last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Time since the last submit or transcript read.
    pub fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    pub(super) fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PersonaPreamble::default())
    }
}
