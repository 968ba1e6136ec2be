//! Per-cycle decision step.

use tracing::debug;

use super::state::{AgentState, trace};
use crate::tools::ToolId;

/// Note left when the reasoner queues a recovery step.
pub const RECOVERY_NOTE: &str = "Added summarizer to get more context";

/// Reasoning node.
///
/// Counts the cycle, applies the recovery rule and records which action
/// comes next. The next action stays at the head of the queue; the
/// executor removes it.
pub fn reason(state: &mut AgentState) {
    state.loop_counter += 1;

    if needs_recovery(state) {
        state
            .pending_actions
            .push_back(ToolId::Summarizer.as_str().to_string());
        state.note(RECOVERY_NOTE);
        debug!("Heading search came up empty, queued summarizer");
    }

    match state.pending_actions.front() {
        Some(next) => {
            state.reasoning = format!("Will execute: {next}");
            let entry = trace::plan_to_execute(next);
            state.actions_taken.push(entry);
        }
        None => {
            state.reasoning = "All actions completed, will synthesize results".to_string();
            state
                .actions_taken
                .push(trace::REASONING_SYNTHESIS.to_string());
        }
    }

    debug!(
        loop_counter = state.loop_counter,
        reasoning = %state.reasoning,
        "Reasoning step"
    );
}

/// A missed heading search triggers one summarizer run, unless a
/// summarizer is already queued or has already run.
///
/// Both "has run" checks match the executed-tool trace entry
/// (`tool_executed:heading_search`), not the planned action.
fn needs_recovery(state: &AgentState) -> bool {
    let Some(last) = state.observations.last() else {
        return false;
    };
    let summarizer = ToolId::Summarizer.as_str();

    last.to_lowercase().contains("not found")
        && state.has_executed(ToolId::HeadingSearch)
        && !state.pending_actions.iter().any(|a| a == summarizer)
        && !state.has_executed(ToolId::Summarizer)
}
