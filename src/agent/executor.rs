//! Tool execution node.

use tracing::{debug, warn};

use super::state::{AgentState, trace};
use crate::tools::ToolRegistry;

/// Executor node: pops the next planned action and runs it.
///
/// Does nothing when the queue is empty. An unknown tool name is logged
/// and recorded as an error observation; the run continues.
pub fn execute(state: &mut AgentState, registry: &ToolRegistry) {
    let Some(name) = state.pending_actions.pop_front() else {
        return;
    };

    let tool = match registry.resolve(&name) {
        Ok(tool) => tool,
        Err(unknown) => {
            warn!(tool = %name, "Planned tool is not registered");
            state.note(unknown.to_string());
            state.observations.push(format!("Error: Tool {name} not found"));
            return;
        }
    };

    let id = tool.id();
    let output = tool.run(&state.document);
    debug!(tool = %id, status = %output.status, summary = %output.summary, "Tool executed");

    state.observations.push(format!("{id}: {}", output.summary));
    state.tool_outputs.insert(id, output);
    state.actions_taken.push(trace::tool_executed(id));
}
