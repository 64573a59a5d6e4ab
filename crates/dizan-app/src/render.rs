//! Presentation shared by the HTTP and terminal surfaces.

use dizan_ai::{CompletionError, SessionError, Speaker, Turn};

pub const USER_LABEL: &str = "Patient";
pub const ASSISTANT_LABEL: &str = "Bot";

pub fn label(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::User => USER_LABEL,
        Speaker::Assistant => ASSISTANT_LABEL,
    }
}

fn css_class(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::User => "user-message",
        Speaker::Assistant => "bot-message",
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Transcript as an HTML fragment, oldest turn first.
pub fn transcript_html(turns: &[Turn]) -> String {
    let mut html = String::new();
    for turn in turns {
        html.push_str(&format!(
            "<div class=\"chat-message {}\">{}: {}</div>\n",
            css_class(turn.speaker),
            label(turn.speaker),
            escape_html(&turn.text)
        ));
    }
    html
}

/// Short, user-facing description of a failed submission.
pub fn notice(err: &SessionError) -> &'static str {
    match err {
        SessionError::Busy => "Still answering your previous message.",
        SessionError::Cancelled => "Request cancelled.",
        SessionError::Completion(e) => match e {
            CompletionError::Auth(_) => {
                "The model service rejected the API key. Check GOOGLE_API_KEY."
            }
            CompletionError::RateLimited(_) => {
                "The model service is busy right now. Please try again in a moment."
            }
            CompletionError::Network(_) => "Could not reach the model service. Please try again.",
            CompletionError::Timeout(_) => "The reply took too long. Please try again.",
            CompletionError::SafetyRejected(_) => {
                "That message could not be answered. Try rephrasing it."
            }
            CompletionError::Api { .. } | CompletionError::Parse(_) => {
                "Something went wrong while generating a reply. Please try again."
            }
        },
    }
}
