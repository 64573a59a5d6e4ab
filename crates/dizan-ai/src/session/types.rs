//! Session types and concurrency guards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::CompletionError;

/// How a session talks to its completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Ask the service for an incremental reply.
    pub streaming: bool,
    /// Bound on one invocation, and separately on consuming its reply.
    pub timeout: Duration,
    /// Extra attempts for transient invocation failures.
    pub max_retries: u32,
    /// Pause before each retry, multiplied by the attempt number.
    pub retry_delay: Duration,
    /// Earlier exchanges replayed to the model; the oldest are dropped first.
    pub max_context_exchanges: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            streaming: true,
            timeout: Duration::from_secs(60),
            max_retries: 1,
            retry_delay: Duration::from_millis(500),
            max_context_exchanges: 50,
        }
    }
}

/// Result of a submit that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Blank question: nothing was sent and nothing was recorded.
    Ignored,
    /// The exchange was appended; carries the assistant's reply.
    Answered(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("session is busy with another request")]
    Busy,
    #[error("request was cancelled")]
    Cancelled,
}

/// The single request slot of a session: a busy flag plus the cancellation
/// handle of the request holding it.
#[derive(Debug, Default)]
pub(crate) struct BusySlot {
    flag: AtomicBool,
    pending: Mutex<Option<CancellationToken>>,
}

impl BusySlot {
    pub(crate) fn is_busy(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Trip the token of the request in flight. Returns false when idle.
    pub(crate) fn cancel(&self) -> bool {
        let token = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match token {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Guard that clears the busy flag on drop, ensuring it is always released
/// even if the future is cancelled or an early return occurs. It also owns
/// the cancellation slot for the request it covers.
pub(crate) struct BusyGuard {
    slot: Arc<BusySlot>,
}

impl BusyGuard {
    /// Attempt to acquire the busy lock. Returns `Err` if already busy.
    pub(crate) fn acquire(
        slot: &Arc<BusySlot>,
    ) -> Result<(Self, CancellationToken), SessionError> {
        if slot
            .flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(SessionError::Busy);
        }

        let token = CancellationToken::new();
        *slot.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok((Self { slot: slot.clone() }, token))
    }

    pub(crate) fn holds(&self, slot: &Arc<BusySlot>) -> bool {
        Arc::ptr_eq(&self.slot, slot)
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.slot
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.slot.flag.store(false, Ordering::Release);
    }
}

/// A claim on a session's request slot, taken before the submission runs.
///
/// Lets a caller answer "busy" synchronously and then hand the claim to a
/// task. Dropping it releases the slot.
pub struct Reservation {
    pub(crate) guard: BusyGuard,
    pub(crate) cancel: CancellationToken,
}

impl std::fmt::Debug for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
