//! Planning stage.
//!
//! Turns the query and document metadata into a goal, an ordered plan of
//! tool names and a rationale. The model-backed path asks for a JSON
//! object; the keyword-rule fallback never fails.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::config::AgentConfig;
use super::prompt::build_planning_prompt;
use super::provider::LlmProvider;
use super::retry::{ModelBackend, Resolved, Source, retry_then_fallback};
use super::state::{AgentState, Status, trace};
use super::traits::Agent;
use crate::error::AgentError;
use crate::tools::ToolId;

/// Stage name used in logs and notes.
const STAGE: &str = "planning";

/// A goal, a plan and the reasoning behind it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanDraft {
    /// What the user wants to accomplish.
    pub goal: String,
    /// Tool names, in execution order.
    #[serde(rename = "plan")]
    pub actions: Vec<String>,
    /// Why these tools in this order.
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Agent that plans which tools to run.
pub struct PlannerAgent {
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
    log_prompts: bool,
    log_responses: bool,
}

impl PlannerAgent {
    /// Creates a planner with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.planner_temperature,
            max_tokens: config.planner_max_tokens,
            system_prompt,
            log_prompts: config.log_prompts,
            log_responses: config.log_responses,
        }
    }

    /// Asks the model for a plan and validates the answer.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on API failure or when the response is not a
    /// JSON object with string `goal` and string-array `plan`.
    pub async fn draft(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<PlanDraft, AgentError> {
        if self.log_prompts {
            debug!(stage = STAGE, prompt = user_msg, "LLM prompt");
        }
        let response = self.execute(provider, user_msg).await?;
        if self.log_responses {
            debug!(stage = STAGE, response = %response.content, "LLM response");
        }
        parse_plan(&response.content)
    }
}

impl std::fmt::Debug for PlannerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerAgent")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Agent for PlannerAgent {
    fn name(&self) -> &'static str {
        "planner"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn json_mode(&self) -> bool {
        true
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Strips code fences and surrounding prose from a model response.
///
/// Takes the body of the first ```` ```json ```` (or plain ```` ``` ````)
/// fence, then slices from the first `{` to the last `}`.
#[must_use]
pub fn sanitize_response(text: &str) -> &str {
    let mut body = text.trim();

    if let Some((_, rest)) = body.split_once("```json") {
        body = rest.split("```").next().unwrap_or(rest).trim();
    } else if let Some((_, rest)) = body.split_once("```") {
        body = rest.split("```").next().unwrap_or(rest).trim();
    }

    if let Some(start) = body.find('{') {
        let end = body
            .rfind('}')
            .filter(|&end| end >= start)
            .map_or(body.len(), |end| end + 1);
        body = &body[start..end];
    }

    body
}

/// Parses a model response into a [`PlanDraft`].
///
/// # Errors
///
/// Returns [`AgentError::ResponseParse`] when the sanitized text is not
/// valid JSON or lacks `goal`/`plan`, and [`AgentError::EmptyResponse`]
/// for blank responses.
pub fn parse_plan(content: &str) -> Result<PlanDraft, AgentError> {
    if content.trim().is_empty() {
        return Err(AgentError::EmptyResponse { stage: "planner" });
    }
    serde_json::from_str(sanitize_response(content)).map_err(|e| AgentError::ResponseParse {
        message: format!("invalid plan: {e}"),
        content: content.to_string(),
    })
}

/// What triggers a fallback rule.
#[derive(Debug, Clone, Copy)]
enum Trigger {
    /// "overview" together with "diagram" or "figure".
    OverviewWithVisuals,
    /// Any of the listed substrings.
    AnyOf(&'static [&'static str]),
}

impl Trigger {
    fn matches(self, query: &str) -> bool {
        match self {
            Self::OverviewWithVisuals => {
                query.contains("overview")
                    && (query.contains("diagram") || query.contains("figure"))
            }
            Self::AnyOf(words) => words.iter().any(|w| query.contains(w)),
        }
    }
}

/// A keyword rule of the fallback planner.
#[derive(Debug)]
struct FallbackRule {
    trigger: Trigger,
    goal: &'static str,
    plan: &'static [ToolId],
    reasoning: &'static str,
}

/// Rules in priority order; the first match wins.
const FALLBACK_RULES: [FallbackRule; 6] = [
    FallbackRule {
        trigger: Trigger::OverviewWithVisuals,
        goal: "Check for overview and diagrams",
        plan: &[ToolId::HeadingSearch, ToolId::DiagramChecker],
        reasoning: "Query asks for both overview and diagrams",
    },
    FallbackRule {
        trigger: Trigger::AnyOf(&["overview", "summary", "about", "summarize"]),
        goal: "Find and summarize document overview/summary",
        plan: &[ToolId::HeadingSearch, ToolId::Summarizer],
        reasoning: "Query asks for overview/summary",
    },
    FallbackRule {
        trigger: Trigger::AnyOf(&["diagram", "figure", "chart", "image", "flow", "use case"]),
        goal: "Locate and analyze diagrams/figures",
        plan: &[ToolId::DiagramChecker, ToolId::HeadingSearch],
        reasoning: "Query asks about diagrams",
    },
    FallbackRule {
        trigger: Trigger::AnyOf(&["format", "structure", "organized", "layout"]),
        goal: "Check document format and structure",
        plan: &[ToolId::FormatChecker, ToolId::HeadingSearch],
        reasoning: "Query asks about format",
    },
    FallbackRule {
        trigger: Trigger::AnyOf(&["conclusion", "ending", "final"]),
        goal: "Find and analyze conclusion section",
        plan: &[ToolId::HeadingSearch, ToolId::Summarizer],
        reasoning: "Query asks about conclusion",
    },
    FallbackRule {
        trigger: Trigger::AnyOf(&["complete", "missing", "validate", "check"]),
        goal: "Validate document completeness",
        plan: &[ToolId::FormatChecker, ToolId::HeadingSearch, ToolId::DiagramChecker],
        reasoning: "Query asks for validation",
    },
];

/// Plan used when no rule matches.
const DEFAULT_RULE: FallbackRule = FallbackRule {
    trigger: Trigger::AnyOf(&[]),
    goal: "Comprehensive document analysis",
    plan: &[ToolId::HeadingSearch, ToolId::FormatChecker, ToolId::Summarizer],
    reasoning: "General query - comprehensive analysis",
};

/// Deterministic keyword-rule planner.
#[must_use]
pub fn fallback_plan(query: &str) -> PlanDraft {
    let query = query.to_lowercase();
    let rule = FALLBACK_RULES
        .iter()
        .find(|rule| rule.trigger.matches(&query))
        .unwrap_or(&DEFAULT_RULE);

    PlanDraft {
        goal: rule.goal.to_string(),
        actions: rule.plan.iter().map(|id| id.as_str().to_string()).collect(),
        reasoning: Some(rule.reasoning.to_string()),
    }
}

/// Planning node: fills goal, plan, work queue and reasoning.
///
/// Never fails. Model failures end in the fallback plan, and any query,
/// blank included, matches at least the default rule.
pub async fn plan(
    state: &mut AgentState,
    agent: &PlannerAgent,
    backend: Option<ModelBackend<'_>>,
) {
    let resolved = match backend {
        Some(backend) => {
            let user_msg = build_planning_prompt(&state.query, &state.document);
            let user_msg = user_msg.as_str();
            let provider = backend.provider;
            let query = state.query.as_str();
            retry_then_fallback(
                STAGE,
                backend.attempts,
                move |_| agent.draft(provider, user_msg),
                || fallback_plan(query),
            )
            .await
        }
        None => Resolved {
            value: fallback_plan(&state.query),
            source: Source::Fallback,
            notes: Vec::new(),
        },
    };

    state.internal_notes.extend(resolved.notes);
    let draft = resolved.value;
    let note = match resolved.source {
        Source::Model { .. } => format!("LLM created plan: {:?}", draft.actions),
        Source::Fallback => format!("Created plan: {:?}", draft.actions),
    };
    state.note(note);

    info!(goal = %draft.goal, plan = ?draft.actions, "Plan created");
    state.set_plan(
        draft.goal,
        draft.actions,
        draft.reasoning.unwrap_or_else(|| "Plan created".to_string()),
    );
    state.status = Status::Executing;
    state.actions_taken.push(trace::PLANNING_COMPLETE.to_string());
}
