//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;

use super::client::requires_api_key;
use crate::error::AgentError;

/// Default model identifier.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default provider name.
const DEFAULT_PROVIDER: &str = "openai";
/// Planning wants near-deterministic JSON.
const DEFAULT_PLANNER_TEMPERATURE: f32 = 0.1;
/// Synthesis gets a little more latitude for phrasing.
const DEFAULT_SYNTHESIZER_TEMPERATURE: f32 = 0.3;
/// Default planner max tokens.
const DEFAULT_PLANNER_MAX_TOKENS: u32 = 1024;
/// Default synthesizer max tokens.
const DEFAULT_SYNTHESIZER_MAX_TOKENS: u32 = 2048;
/// Default model attempts per stage before falling back.
const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
/// Default reasoning-cycle ceiling.
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;

/// Configuration for the agent system.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Whether the model-backed planning and synthesis paths are used.
    ///
    /// When `false` every run goes through the deterministic fallbacks and
    /// no API key is required.
    pub llm_enabled: bool,
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider. May be empty when the model path is
    /// disabled or the provider needs no key.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model identifier used by the planner and synthesizer.
    pub model: String,
    /// Sampling temperature for planning.
    pub planner_temperature: f32,
    /// Sampling temperature for synthesis.
    pub synthesizer_temperature: f32,
    /// Maximum tokens for planner responses.
    pub planner_max_tokens: u32,
    /// Maximum tokens for synthesizer responses.
    pub synthesizer_max_tokens: u32,
    /// Model attempts per stage before the deterministic fallback runs.
    ///
    /// Zero skips the model entirely.
    pub retry_attempts: u32,
    /// Hard ceiling on reasoning cycles per run.
    pub max_iterations: u32,
    /// Directory containing prompt template files.
    ///
    /// When set, system prompts are loaded from markdown files in this
    /// directory, falling back to compiled-in defaults for any missing files.
    pub prompt_dir: Option<PathBuf>,
    /// Log full prompt text at debug level.
    pub log_prompts: bool,
    /// Log full model responses at debug level.
    pub log_responses: bool,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if the model path is enabled,
    /// the provider needs a key, and none is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }

    /// Configuration for a run with no language model at all.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            llm_enabled: false,
            provider: DEFAULT_PROVIDER.to_string(),
            api_key: String::new(),
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            planner_temperature: DEFAULT_PLANNER_TEMPERATURE,
            synthesizer_temperature: DEFAULT_SYNTHESIZER_TEMPERATURE,
            planner_max_tokens: DEFAULT_PLANNER_MAX_TOKENS,
            synthesizer_max_tokens: DEFAULT_SYNTHESIZER_MAX_TOKENS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            prompt_dir: None,
            log_prompts: false,
            log_responses: false,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::offline()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    llm_enabled: Option<bool>,
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    planner_temperature: Option<f32>,
    synthesizer_temperature: Option<f32>,
    planner_max_tokens: Option<u32>,
    synthesizer_max_tokens: Option<u32>,
    retry_attempts: Option<u32>,
    max_iterations: Option<u32>,
    prompt_dir: Option<PathBuf>,
    log_prompts: Option<bool>,
    log_responses: Option<bool>,
}

/// Parses a boolean environment flag; `0`, `false`, `off` and `no` are false.
fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        !matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "off" | "no"
        )
    })
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.llm_enabled.is_none() {
            self.llm_enabled = env_flag("DOCENT_LLM_ENABLED");
        }
        if self.provider.is_none() {
            self.provider = std::env::var("DOCENT_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("DOCENT_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL")
                .or_else(|_| std::env::var("DOCENT_BASE_URL"))
                .ok();
        }
        if self.model.is_none() {
            self.model = std::env::var("DOCENT_MODEL").ok();
        }
        if self.temperature.is_none() {
            self.temperature = env_parse("DOCENT_TEMPERATURE");
        }
        if self.retry_attempts.is_none() {
            self.retry_attempts = env_parse("DOCENT_LLM_RETRY_ATTEMPTS");
        }
        if self.max_iterations.is_none() {
            self.max_iterations = env_parse("DOCENT_MAX_ITERATIONS");
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("DOCENT_PROMPT_DIR").ok().map(PathBuf::from);
        }
        if self.log_prompts.is_none() {
            self.log_prompts = env_flag("DOCENT_LOG_PROMPTS");
        }
        if self.log_responses.is_none() {
            self.log_responses = env_flag("DOCENT_LOG_RESPONSES");
        }
        self
    }

    /// Enables or disables the model-backed paths.
    #[must_use]
    pub const fn llm_enabled(mut self, enabled: bool) -> Self {
        self.llm_enabled = Some(enabled);
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets one sampling temperature for both stages.
    ///
    /// A per-stage temperature, when also set, wins for its stage.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the planner sampling temperature.
    #[must_use]
    pub const fn planner_temperature(mut self, t: f32) -> Self {
        self.planner_temperature = Some(t);
        self
    }

    /// Sets the synthesizer sampling temperature.
    #[must_use]
    pub const fn synthesizer_temperature(mut self, t: f32) -> Self {
        self.synthesizer_temperature = Some(t);
        self
    }

    /// Sets the planner max tokens.
    #[must_use]
    pub const fn planner_max_tokens(mut self, n: u32) -> Self {
        self.planner_max_tokens = Some(n);
        self
    }

    /// Sets the synthesizer max tokens.
    #[must_use]
    pub const fn synthesizer_max_tokens(mut self, n: u32) -> Self {
        self.synthesizer_max_tokens = Some(n);
        self
    }

    /// Sets the model attempts per stage.
    #[must_use]
    pub const fn retry_attempts(mut self, n: u32) -> Self {
        self.retry_attempts = Some(n);
        self
    }

    /// Sets the reasoning-cycle ceiling.
    #[must_use]
    pub const fn max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Enables prompt logging.
    #[must_use]
    pub const fn log_prompts(mut self, enabled: bool) -> Self {
        self.log_prompts = Some(enabled);
        self
    }

    /// Enables response logging.
    #[must_use]
    pub const fn log_responses(mut self, enabled: bool) -> Self {
        self.log_responses = Some(enabled);
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if the model path is enabled,
    /// the provider needs a key, and none was set.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let llm_enabled = self.llm_enabled.unwrap_or(true);
        let provider = self
            .provider
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let api_key = match self.api_key.filter(|k| !k.is_empty()) {
            Some(key) => key,
            None if llm_enabled && requires_api_key(&provider) => {
                return Err(AgentError::ApiKeyMissing);
            }
            None => String::new(),
        };

        Ok(AgentConfig {
            llm_enabled,
            provider,
            api_key,
            base_url: self.base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            planner_temperature: self
                .planner_temperature
                .or(self.temperature)
                .unwrap_or(DEFAULT_PLANNER_TEMPERATURE),
            synthesizer_temperature: self
                .synthesizer_temperature
                .or(self.temperature)
                .unwrap_or(DEFAULT_SYNTHESIZER_TEMPERATURE),
            planner_max_tokens: self
                .planner_max_tokens
                .unwrap_or(DEFAULT_PLANNER_MAX_TOKENS),
            synthesizer_max_tokens: self
                .synthesizer_max_tokens
                .unwrap_or(DEFAULT_SYNTHESIZER_MAX_TOKENS),
            retry_attempts: self.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS),
            max_iterations: self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            prompt_dir: self.prompt_dir,
            log_prompts: self.log_prompts.unwrap_or(false),
            log_responses: self.log_responses.unwrap_or(false),
        })
    }
}
