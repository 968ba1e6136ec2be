//! Node identifiers and the raw event feed of a running graph.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use super::state::Status;

/// A node of the agent graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Produces goal and plan.
    Planning,
    /// Per-cycle decision step.
    Reasoning,
    /// Runs the next planned tool.
    ToolExecution,
    /// Classifies state and routes.
    Critic,
    /// Consumes external input.
    UserInput,
    /// Produces the final answer.
    Synthesis,
}

impl Node {
    /// Returns the node name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Reasoning => "reasoning",
            Self::ToolExecution => "tool_execution",
            Self::Critic => "critic",
            Self::UserInput => "user_input",
            Self::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of a finished node.
///
/// Carries already-parsed fields so consumers never re-parse model output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeOutput {
    /// Planner result.
    Planning {
        /// Planned goal.
        goal: String,
        /// Planner rationale.
        reasoning: String,
        /// Planned tool names.
        plan: Vec<String>,
    },
    /// Reasoner decision.
    Reasoning {
        /// Decision text.
        reasoning: String,
        /// Cycle count after this step.
        loop_counter: u32,
    },
    /// Tool execution result.
    ToolExecution {
        /// Observation appended by this step, if a tool was popped.
        observation: Option<String>,
    },
    /// Critic classification.
    Critic {
        /// Assigned status.
        status: Status,
    },
    /// External input consumed.
    UserInput {
        /// The input that was consumed.
        response: String,
    },
    /// Synthesizer result.
    Synthesis {
        /// The final answer.
        final_answer: String,
    },
}

/// One event in a run's feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GraphEvent {
    /// A node is about to run.
    NodeStarted {
        /// The node.
        node: Node,
    },
    /// A node completed.
    NodeFinished {
        /// The node.
        node: Node,
        /// What it produced.
        output: NodeOutput,
    },
    /// An incremental model token.
    Token {
        /// Node that requested the completion.
        node: Node,
        /// Token text.
        text: String,
    },
    /// A streamed completion failed after emitting tokens.
    ///
    /// Every `Token` of `node` since the previous discard belongs to the
    /// failed attempt and is void.
    TokensDiscarded {
        /// The node whose attempt failed.
        node: Node,
        /// Failure description.
        reason: String,
    },
    /// A node failed; the run is ending with an error.
    NodeFailed {
        /// The node.
        node: Node,
        /// Failure description.
        error: String,
    },
}

/// Write side of the event feed.
///
/// A detached sink discards events. Send failures (the consumer went
/// away) are ignored so a run always completes.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<GraphEvent>>,
}

impl EventSink {
    /// A sink that discards everything.
    #[must_use]
    pub const fn detached() -> Self {
        Self { tx: None }
    }

    /// A sink feeding `tx`.
    #[must_use]
    pub const fn new(tx: UnboundedSender<GraphEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Returns `true` if events reach a consumer.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Emits an event.
    pub fn emit(&self, event: GraphEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_detached_sink_discards() {
        let sink = EventSink::detached();
        assert!(!sink.is_attached());
        sink.emit(GraphEvent::NodeStarted {
            node: Node::Planning,
        });
    }

    #[test]
    fn test_sink_survives_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx);
        assert!(sink.is_attached());
        drop(rx);
        assert!(!sink.is_attached());
        sink.emit(GraphEvent::NodeStarted {
            node: Node::Critic,
        });
    }

    #[test]
    fn test_discard_serialization() {
        let event = GraphEvent::TokensDiscarded {
            node: Node::Synthesis,
            reason: "stream error: reset".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["event"], "tokens_discarded");
        assert_eq!(json["node"], "synthesis");
    }

    #[test]
    fn test_event_serialization() {
        let event = GraphEvent::NodeFinished {
            node: Node::Critic,
            output: NodeOutput::Critic {
                status: Status::ReadyForSynthesis,
            },
        };
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["event"], "node_finished");
        assert_eq!(json["output"]["status"], "ready_for_synthesis");
    }
}
