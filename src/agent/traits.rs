//! The model-backed stage abstraction.
//!
//! Planner and synthesizer each pair a fixed system prompt with a per-run
//! user message and their own sampling settings. [`Agent`] turns that
//! into a request and sends it through whichever provider the run uses.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::message::{ChatRequest, ChatResponse};
use super::provider::{LlmProvider, TokenStream};
use crate::error::AgentError;

/// A stage that talks to a language model.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stage name used in logs.
    fn name(&self) -> &'static str;

    /// Model identifier.
    fn model(&self) -> &str;

    /// System prompt for this stage.
    fn system_prompt(&self) -> &str;

    /// Whether the stage expects a JSON object back.
    fn json_mode(&self) -> bool {
        false
    }

    /// Sampling temperature.
    fn temperature(&self) -> f32 {
        0.0
    }

    /// Completion token ceiling.
    fn max_tokens(&self) -> u32 {
        2048
    }

    /// Builds the request for one user message.
    fn build_request(&self, user_msg: &str) -> ChatRequest {
        ChatRequest::new(self.model(), self.system_prompt(), user_msg)
            .with_temperature(self.temperature())
            .with_max_tokens(self.max_tokens())
            .json(self.json_mode())
    }

    /// Sends one blocking completion.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] from the provider.
    async fn execute(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<ChatResponse, AgentError> {
        let response = provider.chat(&self.build_request(user_msg)).await?;

        debug!(
            agent = self.name(),
            provider = provider.name(),
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Completion received"
        );
        if response.is_truncated() {
            warn!(
                agent = self.name(),
                max_tokens = self.max_tokens(),
                "Completion stopped at the token limit"
            );
        }

        Ok(response)
    }

    /// Opens a streaming completion.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the stream cannot be opened.
    async fn execute_stream(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<TokenStream, AgentError> {
        provider
            .chat_stream(&self.build_request(user_msg).streaming(true))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Fixed;

    impl Agent for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn model(&self) -> &str {
            "gpt-4o-mini"
        }

        fn system_prompt(&self) -> &str {
            "system"
        }

        fn json_mode(&self) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl LlmProvider for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.clone());
            }
            Ok(ChatResponse {
                content: "ok".to_string(),
                finish_reason: Some("length".to_string()),
                ..ChatResponse::default()
            })
        }

        async fn chat_stream(&self, _request: &ChatRequest) -> Result<TokenStream, AgentError> {
            Err(AgentError::Stream {
                message: "unsupported".to_string(),
            })
        }
    }

    #[test]
    fn test_build_request_uses_stage_settings() {
        let request = Fixed.build_request("hello");
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.user_prompt(), "hello");
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, Some(2048));
        assert!(request.json_mode);
        assert!(!request.stream);
    }

    #[tokio::test]
    async fn test_execute_returns_response() {
        let provider = Recorder::default();
        let response = Fixed
            .execute(&provider, "hello")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(response.content, "ok");
        assert!(response.is_truncated());
        let seen = provider.seen.lock().map(|s| s.len()).unwrap_or_default();
        assert_eq!(seen, 1);
    }

    #[tokio::test]
    async fn test_execute_stream_propagates_open_failure() {
        let result = Fixed.execute_stream(&Recorder::default(), "hello").await;
        assert!(matches!(result, Err(AgentError::Stream { .. })));
    }
}
