//! The critic: classifies state and picks the next node.
//!
//! [`classify`] is a pure function evaluated in strict priority order;
//! [`route`] maps the resulting status to the scheduler's next node.

use tracing::debug;

use super::events::Node;
use super::state::{AgentState, Status};

/// Classifies the state. The first matching rule wins:
///
/// 1. an error message is set → [`Status::Error`]
/// 2. the cycle ceiling is reached → [`Status::MaxIterationsReached`]
/// 3. external input is awaited → [`Status::AwaitingInput`]
/// 4. nothing is left to run → [`Status::ReadyForSynthesis`]
/// 5. otherwise → [`Status::Executing`]
#[must_use]
pub fn classify(state: &AgentState) -> Status {
    if !state.error_message.is_empty() {
        Status::Error
    } else if state.loop_counter >= state.max_iterations {
        Status::MaxIterationsReached
    } else if state.awaiting_user_input {
        Status::AwaitingInput
    } else if state.pending_actions.is_empty() {
        Status::ReadyForSynthesis
    } else {
        Status::Executing
    }
}

/// Critic node: writes the classified status and returns it.
pub fn critique(state: &mut AgentState) -> Status {
    let status = classify(state);
    state.status = status;
    debug!(%status, loop_counter = state.loop_counter, "Critic classified state");
    status
}

/// Next node for a status; `None` ends the run.
#[must_use]
pub const fn route(status: Status) -> Option<Node> {
    match status {
        Status::AwaitingInput => Some(Node::UserInput),
        Status::ReadyForSynthesis => Some(Node::Synthesis),
        Status::Completed | Status::Error | Status::MaxIterationsReached => None,
        Status::Planning | Status::Executing => Some(Node::Reasoning),
    }
}
