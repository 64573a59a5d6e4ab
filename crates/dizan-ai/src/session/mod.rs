//! Conversation session management.
//!
//! A `Session` owns one transcript and the model context behind it, and
//! runs the submit protocol: build the prompt, call the completion
//! service, then append the user turn and the assistant turn together.

mod manager;
mod prompt;
mod submit;
mod transcript;
mod types;

#[cfg(test)]
mod tests;

pub use manager::Session;
pub use prompt::{PersonaPreamble, DEFAULT_PERSONA_PREAMBLE};
pub use transcript::{Speaker, Transcript, Turn};
pub use types::{Reservation, SessionError, SessionOptions, Submission};
