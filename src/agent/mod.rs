//! Document-analysis agent loop.
//!
//! A query and a parsed document flow through a fixed graph of nodes that
//! share one mutable [`AgentState`]:
//!
//! ```text
//! query + document → Planner
//!   └── Reasoner ⇄ Executor ⇄ Critic   (one tool per cycle, capped)
//!         ├── User input               (suspend point)
//!         └── Synthesizer → final answer
//! ```
//!
//! Planning and synthesis use a language model when one is configured and
//! fall back to deterministic keyword rules otherwise. A streaming run
//! exposes the node events and a [`StreamClassifier`] projection of them.

pub mod client;
pub mod config;
pub mod critic;
pub mod events;
pub mod executor;
pub mod graph;
pub mod message;
pub mod planner;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod reasoner;
pub mod report;
pub mod retry;
pub mod state;
pub mod stream;
pub mod synthesizer;
pub mod traits;
pub mod user_input;

// Re-export key types
pub use config::AgentConfig;
pub use events::{EventSink, GraphEvent, Node, NodeOutput};
pub use graph::{Graph, RunHandle};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use planner::{PlanDraft, PlannerAgent};
pub use prompt::PromptSet;
pub use provider::{LlmProvider, TokenStream};
pub use report::RunReport;
pub use state::{AgentState, Status, ToolOutputs};
pub use stream::{AnswerTranscript, ChunkKind, ChunkOrigin, ClassifiedChunk, StreamClassifier};
pub use synthesizer::SynthesizerAgent;
pub use traits::Agent;
