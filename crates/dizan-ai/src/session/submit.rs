//! The submit protocol: prompt, invoke, consume, append.

use tracing::{debug, info, warn};

use crate::{CompletionError, CompletionService, Message, ResponseHandle};

use super::manager::Session;
use super::types::{Reservation, SessionError, Submission};

impl Session {
    /// Ask one question and wait for the whole reply.
    pub async fn submit(
        &self,
        service: &dyn CompletionService,
        question: &str,
    ) -> Result<Submission, SessionError> {
        self.submit_streaming(service, question, |_| {}).await
    }

    /// Ask one question, handing each reply fragment to `on_fragment` as it
    /// arrives.
    ///
    /// Blank questions are ignored without calling the service. On success the
    /// user turn and the assistant turn are appended together; on failure or
    /// cancellation nothing is appended. The model context keeps only the
    /// most recent exchanges, the transcript keeps them all.
    pub async fn submit_streaming<F>(
        &self,
        service: &dyn CompletionService,
        question: &str,
        on_fragment: F,
    ) -> Result<Submission, SessionError>
    where
        F: FnMut(&str) + Send,
    {
        if question.trim().is_empty() {
            debug!(session = %self.id(), "ignoring blank submission");
            return Ok(Submission::Ignored);
        }

        let reservation = self.reserve()?;
        self.submit_reserved(reservation, service, question, on_fragment)
            .await
    }

    /// Like [`Session::submit_streaming`], under a slot already claimed with
    /// [`Session::reserve`]. The slot is released when this returns.
    pub async fn submit_reserved<F>(
        &self,
        reservation: Reservation,
        service: &dyn CompletionService,
        question: &str,
        on_fragment: F,
    ) -> Result<Submission, SessionError>
    where
        F: FnMut(&str) + Send,
    {
        if question.trim().is_empty() {
            debug!(session = %self.id(), "ignoring blank submission");
            return Ok(Submission::Ignored);
        }

        // guard lives to the end of this call
        let Reservation { guard, cancel } = reservation;
        if !guard.holds(&self.busy) {
            warn!(session = %self.id(), "reservation belongs to another session");
            return Err(SessionError::Busy);
        }
        self.touch();

        let prompt = self.preamble().build_prompt(question);
        let context = self.read_state().context.clone();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(session = %self.id(), "submission cancelled");
                return Err(SessionError::Cancelled);
            }
            result = self.exchange(service, &context, &prompt, on_fragment) => result,
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session = %self.id(), error = %e, "completion failed, transcript unchanged");
                return Err(e.into());
            }
        };

        let turns = {
            let mut state = self.write_state();
            state.transcript.push_exchange(question, reply.as_str());
            state.context.push(Message::user(prompt));
            state.context.push(Message::model(reply.as_str()));
            let keep = 2 * self.options.max_context_exchanges;
            let excess = state.context.len().saturating_sub(keep);
            state.context.drain(..excess);
            state.transcript.len()
        };
        self.touch();

        info!(
            session = %self.id(),
            turns,
            reply_chars = reply.chars().count(),
            "exchange recorded"
        );
        Ok(Submission::Answered(reply))
    }

    async fn exchange<F>(
        &self,
        service: &dyn CompletionService,
        context: &[Message],
        prompt: &str,
        on_fragment: F,
    ) -> Result<String, CompletionError>
    where
        F: FnMut(&str) + Send,
    {
        let handle = self.invoke_with_retry(service, context, prompt).await?;
        let timeout = self.options.timeout;
        tokio::time::timeout(timeout, handle.collect_text(on_fragment))
            .await
            .map_err(|_| CompletionError::Timeout(timeout))?
    }

    /// Retries cover the invocation only; once fragments flow, failures are final.
    async fn invoke_with_retry(
        &self,
        service: &dyn CompletionService,
        context: &[Message],
        prompt: &str,
    ) -> Result<ResponseHandle, CompletionError> {
        let options = &self.options;
        let mut attempt: u32 = 0;

        loop {
            let result = tokio::time::timeout(
                options.timeout,
                service.invoke(context, prompt, options.streaming),
            )
            .await
            .unwrap_or(Err(CompletionError::Timeout(options.timeout)));

            match result {
                Ok(handle) => return Ok(handle),
                Err(e) if e.is_transient() && attempt < options.max_retries => {
                    attempt += 1;
                    warn!(
                        session = %self.id(),
                        attempt,
                        error = %e,
                        "transient completion failure, retrying"
                    );
                    tokio::time::sleep(options.retry_delay * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
