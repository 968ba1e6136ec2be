//! Provider registry and factory.
//!
//! Maps provider names to concrete [`LlmProvider`] implementations.

use std::sync::Arc;

use crate::agent::config::AgentConfig;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenAiProvider;
use crate::error::AgentError;

/// Provider names accepted by [`create_provider`].
pub const SUPPORTED_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Returns `true` if the named provider cannot be reached without an API key.
///
/// Unknown names answer `true`; [`create_provider`] rejects them anyway.
#[must_use]
pub fn requires_api_key(provider: &str) -> bool {
    provider != "ollama"
}

/// Creates an [`LlmProvider`] based on the configured provider name.
///
/// # Supported Providers
///
/// - `"openai"` (default): OpenAI-compatible APIs via `async-openai`
/// - `"ollama"`: a local Ollama server through its OpenAI-compatible endpoint
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for unknown provider names.
pub fn create_provider(config: &AgentConfig) -> Result<Arc<dyn LlmProvider>, AgentError> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config))),
        "ollama" => Ok(Arc::new(OpenAiProvider::ollama(config))),
        other => Err(AgentError::UnsupportedProvider {
            name: other.to_string(),
        }),
    }
}
