//! Serializable record of a finished run.

use std::time::Duration;

use serde::Serialize;

use super::state::{AgentState, Status, ToolOutputs};

/// Outcome of one agent run, as written by `--format json` and `--save`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// The user's question.
    pub query: String,
    /// File name of the analyzed document, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    /// Planned goal.
    pub goal: String,
    /// Planned tool names.
    pub plan: Vec<String>,
    /// One line per executed tool or input event.
    pub observations: Vec<String>,
    /// Tool results, in execution order.
    pub tool_outputs: ToolOutputs,
    /// Answer for the user.
    pub final_answer: String,
    /// Terminal status.
    pub status: Status,
    /// Failure description when `status` is `error`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    /// Reasoning cycles used.
    pub loop_counter: u32,
    /// Wall-clock time in milliseconds.
    pub elapsed_ms: u64,
}

impl RunReport {
    /// Builds a report from a final state.
    #[must_use]
    pub fn new(state: &AgentState, elapsed: Duration) -> Self {
        let document = state.document.metadata.filename.clone().or_else(|| {
            state
                .document
                .file_path
                .as_ref()
                .map(|p| p.display().to_string())
        });

        Self {
            query: state.query.clone(),
            document,
            goal: state.goal.clone(),
            plan: state.plan.clone(),
            observations: state.observations.clone(),
            tool_outputs: state.tool_outputs.clone(),
            final_answer: state.final_answer.clone(),
            status: state.status,
            error_message: state.error_message.clone(),
            loop_counter: state.loop_counter,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
