//! Synthesis stage.
//!
//! Turns the collected tool results into the user-facing answer. The
//! model-backed path streams tokens to an attached [`EventSink`]; the
//! fallback assembles summaries plus targeted yes/no lines and never
//! fails.

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::{debug, info};

use super::config::AgentConfig;
use super::events::{EventSink, GraphEvent, Node};
use super::prompt::build_synthesis_prompt;
use super::provider::LlmProvider;
use super::retry::{ModelBackend, Resolved, Source, retry_then_fallback};
use super::state::{AgentState, Status, ToolOutputs, trace};
use super::traits::Agent;
use crate::core::ToolStatus;
use crate::error::AgentError;
use crate::tools::ToolId;

/// Stage name used in logs and notes.
const STAGE: &str = "synthesis";

/// Query words that make the fallback report on visuals.
const DIAGRAM_KEYWORDS: [&str; 4] = ["diagram", "figure", "flow", "use case"];

/// Agent that writes the final answer.
pub struct SynthesizerAgent {
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
    log_prompts: bool,
    log_responses: bool,
}

impl SynthesizerAgent {
    /// Creates a synthesizer with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.synthesizer_temperature,
            max_tokens: config.synthesizer_max_tokens,
            system_prompt,
            log_prompts: config.log_prompts,
            log_responses: config.log_responses,
        }
    }

    /// Asks the model for an answer.
    ///
    /// When `sink` has a consumer the completion is streamed and every
    /// delta is forwarded as a [`GraphEvent::Token`]; otherwise a single
    /// blocking completion is made. A streamed attempt that fails after
    /// emitting tokens is followed by [`GraphEvent::TokensDiscarded`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on API or stream failure, and
    /// [`AgentError::EmptyResponse`] when the model returns only whitespace.
    pub async fn answer(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
        sink: &EventSink,
    ) -> Result<String, AgentError> {
        if self.log_prompts {
            debug!(stage = STAGE, prompt = user_msg, "LLM prompt");
        }

        let mut emitted = false;
        let completion = if sink.is_attached() {
            self.stream_completion(provider, user_msg, sink, &mut emitted)
                .await
        } else {
            self.execute(provider, user_msg)
                .await
                .map(|response| response.content)
        };

        let result = completion.and_then(|content| {
            if self.log_responses {
                debug!(stage = STAGE, response = %content, "LLM response");
            }
            match content.trim() {
                "" => Err(AgentError::EmptyResponse {
                    stage: "synthesizer",
                }),
                text => Ok(text.to_string()),
            }
        });

        if emitted && let Err(e) = &result {
            sink.emit(GraphEvent::TokensDiscarded {
                node: Node::Synthesis,
                reason: e.to_string(),
            });
        }
        result
    }

    async fn stream_completion(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
        sink: &EventSink,
        emitted: &mut bool,
    ) -> Result<String, AgentError> {
        let mut stream = self.execute_stream(provider, user_msg).await?;
        let mut content = String::new();
        while let Some(delta) = stream.next().await {
            let delta = delta?;
            if delta.is_empty() {
                continue;
            }
            *emitted = true;
            sink.emit(GraphEvent::Token {
                node: Node::Synthesis,
                text: delta.clone(),
            });
            content.push_str(&delta);
        }
        Ok(content)
    }
}

impl std::fmt::Debug for SynthesizerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesizerAgent")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Agent for SynthesizerAgent {
    fn name(&self) -> &'static str {
        "synthesizer"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Deterministic answer built from tool summaries.
///
/// Lists every summary in execution order, then appends yes/no lines for
/// overview, diagram and conclusion questions when the matching tool ran.
#[must_use]
pub fn fallback_synthesis(query: &str, outputs: &ToolOutputs) -> String {
    let query_lower = query.to_lowercase();
    let mut parts = vec![format!("Based on analyzing the document for: '{query}'\n")];

    for (_, output) in outputs.iter() {
        parts.push(format!("• {}", output.summary));
    }

    let headings = outputs.get(ToolId::HeadingSearch);
    let has_section = |name: &str| {
        headings.is_some_and(|result| {
            result
                .detail_strings("sections")
                .iter()
                .any(|s| s.to_lowercase().contains(name))
        })
    };

    if query_lower.contains("overview") && headings.is_some() {
        parts.push(if has_section("overview") {
            "\n✅ YES - Document has an Overview section".to_string()
        } else {
            "\n❌ NO - No Overview section found".to_string()
        });
    }

    if DIAGRAM_KEYWORDS.iter().any(|k| query_lower.contains(k))
        && let Some(diagrams) = outputs.get(ToolId::DiagramChecker)
    {
        parts.push(if diagrams.status == ToolStatus::Found {
            "\n✅ YES - Diagrams/figures found in document".to_string()
        } else {
            "\n❌ NO - No diagrams found".to_string()
        });
    }

    if query_lower.contains("conclusion") && headings.is_some() {
        parts.push(if has_section("conclusion") {
            "\n✅ YES - Document has a Conclusion section".to_string()
        } else {
            "\n❌ NO - No Conclusion section found".to_string()
        });
    }

    parts.join("\n")
}

/// Synthesis node: writes `final_answer` and completes the run.
pub async fn synthesize(
    state: &mut AgentState,
    agent: &SynthesizerAgent,
    backend: Option<ModelBackend<'_>>,
    sink: &EventSink,
) {
    let resolved = match backend {
        Some(backend) => {
            let user_msg = build_synthesis_prompt(&state.query, &state.goal, &state.tool_outputs);
            let user_msg = user_msg.as_str();
            let provider = backend.provider;
            let (query, outputs) = (state.query.as_str(), &state.tool_outputs);
            retry_then_fallback(
                STAGE,
                backend.attempts,
                move |_| agent.answer(provider, user_msg, sink),
                || fallback_synthesis(query, outputs),
            )
            .await
        }
        None => Resolved {
            value: fallback_synthesis(&state.query, &state.tool_outputs),
            source: Source::Fallback,
            notes: Vec::new(),
        },
    };

    state.internal_notes.extend(resolved.notes);
    let note = match resolved.source {
        Source::Model { .. } => "LLM synthesized final answer",
        Source::Fallback => "Synthesized final answer from tool summaries",
    };
    state.note(note);
    info!(source = ?resolved.source, chars = resolved.value.len(), "Final answer ready");

    state.final_answer = resolved.value;
    state.status = Status::Completed;
    state
        .actions_taken
        .push(trace::SYNTHESIS_COMPLETE.to_string());
}
