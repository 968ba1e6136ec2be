//! Error types for docent.
//!
//! Each layer owns a `thiserror` enum: [`AgentError`] for the control loop
//! and its language-model backend, [`DocumentError`] for the document
//! provider and [`CommandError`] for the CLI. [`Error`] unifies them for
//! callers that cross layers.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Agent control-loop or backend failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Document loading failure.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Errors raised by the agent control loop and the language-model backend.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model-backed path is enabled but no API key was configured.
    #[error("no API key configured: set OPENAI_API_KEY or DOCENT_API_KEY, or disable the model with --no-llm")]
    ApiKeyMissing,

    /// The configured provider name has no implementation.
    #[error("unsupported LLM provider: '{name}'")]
    UnsupportedProvider {
        /// Provider name as configured.
        name: String,
    },

    /// A request to the language-model backend failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Backend error description.
        message: String,
        /// HTTP status, when the backend reported one.
        status: Option<u16>,
    },

    /// The incremental token stream failed mid-flight.
    #[error("stream error: {message}")]
    Stream {
        /// Backend error description.
        message: String,
    },

    /// A model response could not be parsed or validated.
    #[error("failed to parse response: {message}")]
    ResponseParse {
        /// What went wrong.
        message: String,
        /// The offending response text.
        content: String,
    },

    /// The model returned no text.
    #[error("{stage} returned an empty response")]
    EmptyResponse {
        /// Stage that received the empty response.
        stage: &'static str,
    },

    /// The query cannot be analyzed.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Reason the query was rejected.
        message: String,
    },

    /// Invalid configuration value.
    #[error("configuration error: {message}")]
    Config {
        /// What is wrong with the configuration.
        message: String,
    },
}

/// Errors raised while loading a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document path does not exist.
    #[error("document not found: {}", path.display())]
    NotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The file extension has no loader.
    #[error("unsupported document format: '{extension}' (supported: txt, md, json)")]
    UnsupportedFormat {
        /// File extension, lower-cased.
        extension: String,
    },

    /// Reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A pre-parsed JSON document handle was malformed.
    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by CLI command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not complete.
    #[error("command failed: {0}")]
    ExecutionFailed(String),

    /// Rendering output failed.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_display() {
        let err = AgentError::UnsupportedProvider {
            name: "acme".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported LLM provider: 'acme'");

        let err = AgentError::EmptyResponse { stage: "planner" };
        assert_eq!(err.to_string(), "planner returned an empty response");
    }

    #[test]
    fn test_error_from_conversions() {
        let err: Error = AgentError::ApiKeyMissing.into();
        assert!(matches!(err, Error::Agent(AgentError::ApiKeyMissing)));

        let err: Error = DocumentError::UnsupportedFormat {
            extension: "pdf".to_string(),
        }
        .into();
        assert!(err.to_string().contains("'pdf'"));
    }
}
