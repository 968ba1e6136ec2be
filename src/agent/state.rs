//! The per-run state record threaded through every graph node.
//!
//! [`AgentState`] is created once per run, owned by the scheduler and
//! lent to exactly one node at a time as `&mut`. Nothing persists across
//! runs.

use std::collections::VecDeque;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::core::{Document, ToolResult};
use crate::tools::ToolId;

/// Routing status of a run.
///
/// Written by the planner (`Executing`), the synthesizer (`Completed`) and
/// otherwise only by the critic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Initial status before the planner has run.
    #[default]
    Planning,
    /// Actions remain to be executed.
    Executing,
    /// The run is suspended waiting for external input.
    AwaitingInput,
    /// All planned actions have run.
    ReadyForSynthesis,
    /// A final answer has been produced.
    Completed,
    /// A node failed; see `error_message`.
    Error,
    /// The reasoning-cycle ceiling was hit.
    MaxIterationsReached,
}

impl Status {
    /// Returns the status name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Executing => "executing",
            Self::AwaitingInput => "awaiting_input",
            Self::ReadyForSynthesis => "ready_for_synthesis",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::MaxIterationsReached => "max_iterations_reached",
        }
    }

    /// Returns `true` for statuses that end the run.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Error | Self::MaxIterationsReached
        )
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool results keyed by tool, in first-execution order.
///
/// Re-executing a tool replaces its result in place, keeping the original
/// position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutputs {
    entries: Vec<(ToolId, ToolResult)>,
}

impl ToolOutputs {
    /// Stores `result` for `id`, overwriting any earlier result.
    pub fn insert(&mut self, id: ToolId, result: ToolResult) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == id) {
            slot.1 = result;
        } else {
            self.entries.push((id, result));
        }
    }

    /// Returns the result stored for `id`.
    #[must_use]
    pub fn get(&self, id: ToolId) -> Option<&ToolResult> {
        self.entries.iter().find(|(k, _)| *k == id).map(|(_, r)| r)
    }

    /// Returns `true` if `id` has a stored result.
    #[must_use]
    pub fn contains(&self, id: ToolId) -> bool {
        self.get(id).is_some()
    }

    /// Iterates results in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (ToolId, &ToolResult)> {
        self.entries.iter().map(|(k, r)| (*k, r))
    }

    /// Number of stored results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no tool has run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ToolOutputs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, result) in &self.entries {
            map.serialize_entry(id.as_str(), result)?;
        }
        map.end()
    }
}

/// Entries appended to [`AgentState::actions_taken`].
pub mod trace {
    use crate::tools::ToolId;

    /// The planner produced a plan.
    pub const PLANNING_COMPLETE: &str = "planning:complete";
    /// The reasoner found nothing left to execute.
    pub const REASONING_SYNTHESIS: &str = "reasoning:synthesis";
    /// The synthesizer produced a final answer.
    pub const SYNTHESIS_COMPLETE: &str = "synthesis:complete";
    /// The user-input node consumed a response.
    pub const USER_INPUT_COLLECTED: &str = "user_input:collected";

    /// A tool ran.
    #[must_use]
    pub fn tool_executed(id: ToolId) -> String {
        format!("tool_executed:{id}")
    }

    /// The reasoner selected `action` as the next step.
    #[must_use]
    pub fn plan_to_execute(action: &str) -> String {
        format!("reasoning:plan_to_execute:{action}")
    }
}

/// Mutable record of one agent run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentState {
    /// The user's question.
    pub query: String,
    /// Document under analysis.
    #[serde(skip)]
    pub document: Document,
    /// What the planner decided the user wants.
    pub goal: String,
    /// Planned tool names, fixed once the planner has run.
    pub plan: Vec<String>,
    /// Working queue of tool names still to run.
    pub pending_actions: VecDeque<String>,
    /// Append-only transition log.
    pub actions_taken: Vec<String>,
    /// Tool results, in execution order.
    pub tool_outputs: ToolOutputs,
    /// One human-readable line per executed tool or input event.
    pub observations: Vec<String>,
    /// Latest reasoning text (planner rationale, then per-cycle decisions).
    pub reasoning: String,
    /// Debug trail, never shown to the end user.
    pub internal_notes: Vec<String>,
    /// Routing status.
    pub status: Status,
    /// Set when the run needs external input.
    pub awaiting_user_input: bool,
    /// Most recent external input.
    pub user_response: String,
    /// Reasoning cycles so far.
    pub loop_counter: u32,
    /// Reasoning-cycle ceiling.
    pub max_iterations: u32,
    /// Answer for the user.
    pub final_answer: String,
    /// Set when a node fails.
    pub error_message: String,
}

impl AgentState {
    /// Creates the initial state for a run.
    #[must_use]
    pub fn new(query: impl Into<String>, document: Document, max_iterations: u32) -> Self {
        Self {
            query: query.into(),
            document,
            goal: String::new(),
            plan: Vec::new(),
            pending_actions: VecDeque::new(),
            actions_taken: Vec::new(),
            tool_outputs: ToolOutputs::default(),
            observations: Vec::new(),
            reasoning: String::new(),
            internal_notes: Vec::new(),
            status: Status::Planning,
            awaiting_user_input: false,
            user_response: String::new(),
            loop_counter: 0,
            max_iterations,
            final_answer: String::new(),
            error_message: String::new(),
        }
    }

    /// Installs a plan, resetting the work queue to an independent copy.
    pub fn set_plan(&mut self, goal: String, plan: Vec<String>, reasoning: String) {
        self.pending_actions = plan.iter().cloned().collect();
        self.goal = goal;
        self.plan = plan;
        self.reasoning = reasoning;
    }

    /// Appends to the debug trail.
    pub fn note(&mut self, note: impl Into<String>) {
        self.internal_notes.push(note.into());
    }

    /// Returns `true` if `tool` has been executed in this run.
    #[must_use]
    pub fn has_executed(&self, tool: ToolId) -> bool {
        let entry = trace::tool_executed(tool);
        self.actions_taken.iter().any(|a| *a == entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolStatus;
    use serde_json::Map;

    fn result(summary: &str) -> ToolResult {
        ToolResult::new(ToolStatus::Success, summary, Map::new())
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = AgentState::new("q", Document::default(), 20);
        assert_eq!(state.status, Status::Planning);
        assert!(state.plan.is_empty());
        assert!(state.pending_actions.is_empty());
        assert!(state.tool_outputs.is_empty());
        assert_eq!(state.loop_counter, 0);
        assert_eq!(state.max_iterations, 20);
    }

    #[test]
    fn test_set_plan_copies_queue() {
        let mut state = AgentState::new("q", Document::default(), 20);
        state.set_plan(
            "goal".to_string(),
            vec!["heading_search".to_string()],
            "why".to_string(),
        );
        state.pending_actions.push_back("summarizer".to_string());
        assert_eq!(state.plan, vec!["heading_search"]);
        assert_eq!(state.pending_actions.len(), 2);
    }

    #[test]
    fn test_tool_outputs_overwrite_keeps_position() {
        let mut outputs = ToolOutputs::default();
        outputs.insert(ToolId::HeadingSearch, result("first"));
        outputs.insert(ToolId::Summarizer, result("second"));
        outputs.insert(ToolId::HeadingSearch, result("again"));

        let order: Vec<ToolId> = outputs.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![ToolId::HeadingSearch, ToolId::Summarizer]);
        assert_eq!(
            outputs.get(ToolId::HeadingSearch).map(|r| r.summary.as_str()),
            Some("again")
        );
    }

    #[test]
    fn test_tool_outputs_serialize_as_ordered_map() {
        let mut outputs = ToolOutputs::default();
        outputs.insert(ToolId::Summarizer, result("s"));
        outputs.insert(ToolId::DiagramChecker, result("d"));
        let json = serde_json::to_string(&outputs).unwrap_or_default();
        let summarizer = json.find("summarizer").unwrap_or(usize::MAX);
        let diagram = json.find("diagram_checker").unwrap_or(0);
        assert!(summarizer < diagram);
    }

    #[test]
    fn test_status_terminal() {
        assert!(Status::Completed.is_terminal());
        assert!(Status::Error.is_terminal());
        assert!(Status::MaxIterationsReached.is_terminal());
        assert!(!Status::ReadyForSynthesis.is_terminal());
        assert_eq!(Status::AwaitingInput.to_string(), "awaiting_input");
    }

    #[test]
    fn test_has_executed_matches_trace_entries() {
        let mut state = AgentState::new("q", Document::default(), 20);
        state.actions_taken.push(trace::plan_to_execute("summarizer"));
        assert!(!state.has_executed(ToolId::Summarizer));
        state
            .actions_taken
            .push(trace::tool_executed(ToolId::Summarizer));
        assert!(state.has_executed(ToolId::Summarizer));
    }
}
