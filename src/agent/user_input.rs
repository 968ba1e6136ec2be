//! External-input suspend point.

use tracing::info;

use super::state::{AgentState, trace};

/// Response substituted for interactive input.
pub const CANNED_RESPONSE: &str = "Continue with the analysis.";

/// User-input node.
///
/// When input is awaited, consumes a response, records it and clears the
/// flag so the reasoner can continue. Otherwise does nothing.
pub fn collect(state: &mut AgentState) {
    if !state.awaiting_user_input {
        return;
    }

    info!("Agent is waiting for user input, continuing with canned response");
    state.user_response = CANNED_RESPONSE.to_string();
    state.observations.push("User input received".to_string());
    state.awaiting_user_input = false;
    state
        .actions_taken
        .push(trace::USER_INPUT_COLLECTED.to_string());
}
