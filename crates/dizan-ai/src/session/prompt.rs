//! Persona preamble and outbound prompt assembly.

use std::sync::Arc;

/// Built-in therapist instruction prepended to every prompt.
pub const DEFAULT_PERSONA_PREAMBLE: &str = "You are a professional therapist. \
Answer only mental health and therapy-related questions with empathy and understanding. \
If the question is not related to therapy, politely inform the user.\
You are a professional therapist who provides empathetic and supportive responses. \
Instead of giving generic advice, you ask thoughtful questions to understand the user's feelings, \
validate their emotions, and help them explore ways to cope with their challenges. \
Respond like a therapist offering emotional support and guidance in a compassionate way.";

/// Read-only preamble shared by every session in the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaPreamble(Arc<str>);

impl PersonaPreamble {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `preamble + "\nUser: " + question + "\nTherapist:"`
    pub fn build_prompt(&self, question: &str) -> String {
        let mut prompt =
            String::with_capacity(self.0.len() + question.len() + "\nUser: \nTherapist:".len());
        prompt.push_str(&self.0);
        prompt.push_str("\nUser: ");
        prompt.push_str(question);
        prompt.push_str("\nTherapist:");
        prompt
    }
}

impl Default for PersonaPreamble {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA_PREAMBLE)
    }
}
