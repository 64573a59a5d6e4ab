//! Google Gemini API client.
//!
//! Implements `CompletionService` for Gemini models via the
//! Generative Language API.

mod api;
mod chunk;
mod client;
mod config;


pub use client::GeminiClient;
pub use config::GeminiConfig;
