//! Chat completions over the `OpenAI` wire protocol, via `async-openai`.
//!
//! One client type serves both hosted `OpenAI` (or any compatible proxy
//! set through `base_url`) and a local Ollama server, which exposes the
//! same protocol under `/v1`.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    CreateChatCompletionResponse, ResponseFormat,
};
use async_trait::async_trait;
use futures_util::StreamExt;

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
use crate::agent::provider::{LlmProvider, TokenStream};
use crate::error::AgentError;

/// Default endpoint of a local Ollama server.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Key sent to Ollama, which accepts any value.
const OLLAMA_PLACEHOLDER_KEY: &str = "ollama";

/// Provider speaking the `OpenAI` chat completions protocol.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    name: &'static str,
}

impl OpenAiProvider {
    /// Hosted `OpenAI`, or the compatible server at `config.base_url`.
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        Self::connect("openai", &config.api_key, config.base_url.as_deref())
    }

    /// A local Ollama server.
    ///
    /// Uses [`OLLAMA_BASE_URL`] unless a base URL is configured.
    #[must_use]
    pub fn ollama(config: &AgentConfig) -> Self {
        let api_key = match config.api_key.as_str() {
            "" => OLLAMA_PLACEHOLDER_KEY,
            key => key,
        };
        let base_url = config.base_url.as_deref().unwrap_or(OLLAMA_BASE_URL);
        Self::connect("ollama", api_key, Some(base_url))
    }

    fn connect(name: &'static str, api_key: &str, base_url: Option<&str>) -> Self {
        let mut settings = OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url {
            settings = settings.with_api_base(url);
        }
        Self {
            client: Client::with_config(settings),
            name,
        }
    }

    fn to_wire_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
        let text = msg.content.clone();
        match msg.role {
            Role::System => ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(text),
                name: None,
            }),
            Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(text),
                name: None,
            }),
        }
    }

    fn to_wire_request(request: &ChatRequest) -> CreateChatCompletionRequest {
        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(Self::to_wire_message).collect(),
            // Some compatible servers reject an explicit zero.
            temperature: request.temperature.filter(|&t| t != 0.0),
            max_completion_tokens: request.max_tokens,
            stream: request.stream.then_some(true),
            response_format: request.json_mode.then_some(ResponseFormat::JsonObject),
            ..Default::default()
        }
    }

    fn from_wire_response(response: CreateChatCompletionResponse) -> ChatResponse {
        let usage = response.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let Some(choice) = response.choices.into_iter().next() else {
            return ChatResponse {
                usage,
                ..ChatResponse::default()
            };
        };

        ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
            finish_reason: choice
                .finish_reason
                .map(|reason| format!("{reason:?}").to_lowercase()),
        }
    }
}

fn request_failed(err: &OpenAIError) -> AgentError {
    AgentError::ApiRequest {
        message: err.to_string(),
        status: None,
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let response = self
            .client
            .chat()
            .create(Self::to_wire_request(request))
            .await
            .map_err(|e| request_failed(&e))?;
        Ok(Self::from_wire_response(response))
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<TokenStream, AgentError> {
        let wire = Self::to_wire_request(&request.clone().streaming(true));
        let chunks = self
            .client
            .chat()
            .create_stream(wire)
            .await
            .map_err(|e| request_failed(&e))?;

        let deltas = chunks.map(|chunk| {
            chunk
                .map(|c| {
                    c.choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.delta.content)
                        .unwrap_or_default()
                })
                .map_err(|e| AgentError::Stream {
                    message: e.to_string(),
                })
        });

        Ok(Box::pin(deltas))
    }
}
