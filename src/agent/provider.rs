//! The language-model backend seen by planning and synthesis.
//!
//! Planning sends one JSON-mode completion and synthesis one plain or
//! streamed completion. Both go through [`LlmProvider`], so a run can use
//! a hosted model, a local server, or a scripted test double.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use super::message::{ChatRequest, ChatResponse};
use crate::error::AgentError;

/// Answer text as it is generated, one delta per item.
///
/// An `Err` item ends the attempt. Deltas already yielded stay with that
/// attempt; the synthesizer voids them before it retries.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, AgentError>> + Send>>;

/// A model backend a run can plan and answer with.
///
/// A provider makes exactly one attempt per call. The planner and
/// synthesizer decide how often to retry and when to fall back to their
/// keyword rules.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Backend name recorded in logs (`"openai"`, `"ollama"`).
    fn name(&self) -> &'static str;

    /// Returns the whole completion at once.
    ///
    /// Planning always uses this path, with `json_mode` set.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiRequest`] when the backend cannot be
    /// reached or rejects the request.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError>;

    /// Opens a completion that yields the answer incrementally.
    ///
    /// Synthesis uses this path when someone is consuming run events.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the stream cannot be opened. Failures
    /// after that arrive as [`AgentError::Stream`] items.
    async fn chat_stream(&self, request: &ChatRequest) -> Result<TokenStream, AgentError>;
}
