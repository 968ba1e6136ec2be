//! Chat request and response types shared by every provider.
//!
//! Planning and synthesis each send one system prompt followed by one
//! user message, so a [`ChatRequest`] is always built from that pair and
//! then tuned per stage.

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Stage instructions.
    System,
    /// Per-run prompt built from the query and document.
    User,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote it.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// System prompt first, then the user prompt.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Completion token ceiling.
    pub max_tokens: Option<u32>,
    /// Ask the backend for a JSON object.
    pub json_mode: bool,
    /// Deliver the completion as a token stream.
    pub stream: bool,
}

impl ChatRequest {
    /// Creates a request from a system prompt and a user prompt.
    #[must_use]
    pub fn new(model: impl Into<String>, system: &str, user: &str) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: None,
            max_tokens: None,
            json_mode: false,
            stream: false,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the completion token ceiling.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Requests JSON output.
    #[must_use]
    pub const fn json(mut self, on: bool) -> Self {
        self.json_mode = on;
        self
    }

    /// Requests a token stream.
    #[must_use]
    pub const fn streaming(mut self, on: bool) -> Self {
        self.stream = on;
        self
    }

    /// Text of the user prompt, or `""` if the request has none.
    #[must_use]
    pub fn user_prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map_or("", |m| m.content.as_str())
    }
}

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens.
    pub prompt_tokens: u32,
    /// Generated tokens.
    pub completion_tokens: u32,
    /// Sum of both.
    pub total_tokens: u32,
}

/// A finished completion.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    /// Generated text.
    pub content: String,
    /// Token accounting.
    pub usage: TokenUsage,
    /// Backend stop reason, lower-cased (`"stop"`, `"length"`, ...).
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Returns `true` if generation stopped at the token ceiling.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_both_prompts() {
        let request = ChatRequest::new("gpt-4o-mini", "You plan.", "Is there a conclusion?");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0], ChatMessage::system("You plan."));
        assert_eq!(request.user_prompt(), "Is there a conclusion?");
        assert!(!request.json_mode);
        assert!(request.temperature.is_none());
    }

    #[test]
    fn test_request_tuning() {
        let request = ChatRequest::new("m", "s", "u")
            .with_temperature(0.1)
            .with_max_tokens(1024)
            .json(true)
            .streaming(true);
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_tokens, Some(1024));
        assert!(request.json_mode);
        assert!(request.stream);
    }

    #[test]
    fn test_truncation() {
        let mut response = ChatResponse::default();
        assert!(!response.is_truncated());
        response.finish_reason = Some("length".to_string());
        assert!(response.is_truncated());
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_string(&ChatMessage::user("test")).unwrap_or_default();
        assert_eq!(json, r#"{"role":"user","content":"test"}"#);
    }
}
