//! Graph scheduler for the agent loop.
//!
//! Drives one [`AgentState`] through the node graph:
//!
//! ```text
//! planning → reasoning → tool_execution → critic ─┬─ executing ──────→ reasoning
//!                ↑                                ├─ awaiting_input ─→ user_input ─┐
//!                └────────────────────────────────┼────────────────────────────────┘
//!                                                 ├─ ready ──────────→ synthesis → end
//!                                                 └─ terminal ───────→ end
//! ```
//!
//! Exactly one node holds the state at a time. A failing node writes its
//! error to `error_message` and hands over to the critic, which ends the
//! run.

use std::sync::Arc;

use futures_util::{Stream, StreamExt, stream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

use super::client::create_provider;
use super::config::AgentConfig;
use super::critic;
use super::events::{EventSink, GraphEvent, Node, NodeOutput};
use super::executor;
use super::planner::{self, PlannerAgent};
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::reasoner;
use super::retry::ModelBackend;
use super::state::AgentState;
use super::stream::{ClassifiedChunk, StreamClassifier};
use super::synthesizer::{self, SynthesizerAgent};
use super::user_input;
use crate::core::Document;
use crate::error::AgentError;
use crate::tools::ToolRegistry;

/// A compiled agent graph.
///
/// Cheap to clone; clones share the provider, registry and agents.
#[derive(Clone)]
pub struct Graph {
    config: AgentConfig,
    provider: Option<Arc<dyn LlmProvider>>,
    registry: Arc<ToolRegistry>,
    planner: Arc<PlannerAgent>,
    synthesizer: Arc<SynthesizerAgent>,
}

/// A run in progress, observed through its event feed.
#[derive(Debug)]
pub struct RunHandle {
    /// Events in the order the run produces them; ends with the run.
    pub events: UnboundedReceiverStream<GraphEvent>,
    /// Resolves to the final state.
    pub state: JoinHandle<AgentState>,
}

impl Graph {
    /// Builds a graph from configuration.
    ///
    /// Connects to the configured provider when the model path is enabled
    /// and loads prompt templates from [`AgentConfig::prompt_dir`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnsupportedProvider`] for an unknown provider
    /// or a client construction error.
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        let provider = if config.llm_enabled {
            Some(create_provider(&config)?)
        } else {
            None
        };
        Ok(Self::assemble(config, provider))
    }

    /// Builds a graph that only uses the deterministic fallbacks.
    #[must_use]
    pub fn offline() -> Self {
        Self::assemble(AgentConfig::offline(), None)
    }

    /// Builds a graph around an existing provider.
    #[must_use]
    pub fn with_provider(config: AgentConfig, provider: Arc<dyn LlmProvider>) -> Self {
        Self::assemble(config, Some(provider))
    }

    /// Replaces the tool registry.
    #[must_use]
    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    fn assemble(config: AgentConfig, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self {
            planner: Arc::new(PlannerAgent::new(&config, prompts.planner)),
            synthesizer: Arc::new(SynthesizerAgent::new(&config, prompts.synthesizer)),
            registry: Arc::new(ToolRegistry::standard()),
            provider,
            config,
        }
    }

    /// The configuration this graph was built with.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The tool registry.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Runs the graph to completion and returns the final state.
    pub async fn run(&self, query: impl Into<String>, document: Document) -> AgentState {
        let mut state = AgentState::new(query, document, self.config.max_iterations);
        self.drive(&mut state, &EventSink::detached()).await;
        state
    }

    /// Starts a run on the Tokio runtime and returns its event feed.
    ///
    /// Must be called from within a Tokio runtime. Dropping the feed does
    /// not cancel the run.
    pub fn run_events(&self, query: impl Into<String>, document: Document) -> RunHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let graph = self.clone();
        let mut state = AgentState::new(query, document, self.config.max_iterations);

        let handle = tokio::spawn(async move {
            graph.drive(&mut state, &EventSink::new(tx)).await;
            state
        });

        RunHandle {
            events: UnboundedReceiverStream::new(rx),
            state: handle,
        }
    }

    /// Starts a run and returns its classified output.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run_stream(
        &self,
        query: impl Into<String>,
        document: Document,
    ) -> impl Stream<Item = ClassifiedChunk> + Send + Unpin + 'static {
        let RunHandle { events, .. } = self.run_events(query, document);
        let mut classifier = StreamClassifier::new();
        events.flat_map(move |event| stream::iter(classifier.classify(event)))
    }

    fn backend(&self) -> Option<ModelBackend<'_>> {
        self.provider.as_deref().map(|provider| ModelBackend {
            provider,
            attempts: self.config.retry_attempts,
        })
    }

    async fn drive(&self, state: &mut AgentState, sink: &EventSink) {
        info!(
            query = %state.query,
            model_backed = self.provider.is_some(),
            max_iterations = state.max_iterations,
            "Starting agent run"
        );

        let mut next = Some(Node::Planning);
        while let Some(node) = next {
            sink.emit(GraphEvent::NodeStarted { node });
            debug!(%node, "Entering node");

            next = match self.step(node, state, sink).await {
                Ok(output) => {
                    sink.emit(GraphEvent::NodeFinished { node, output });
                    successor(node, state)
                }
                Err(e) => fail(node, &e, state, sink),
            };
        }

        info!(
            status = %state.status,
            loop_counter = state.loop_counter,
            tools_run = state.tool_outputs.len(),
            "Agent run finished"
        );
    }

    async fn step(
        &self,
        node: Node,
        state: &mut AgentState,
        sink: &EventSink,
    ) -> Result<NodeOutput, AgentError> {
        let output = match node {
            Node::Planning => {
                planner::plan(state, &self.planner, self.backend()).await;
                NodeOutput::Planning {
                    goal: state.goal.clone(),
                    reasoning: state.reasoning.clone(),
                    plan: state.plan.clone(),
                }
            }
            Node::Reasoning => {
                reasoner::reason(state);
                NodeOutput::Reasoning {
                    reasoning: state.reasoning.clone(),
                    loop_counter: state.loop_counter,
                }
            }
            Node::ToolExecution => {
                let before = state.observations.len();
                executor::execute(state, &self.registry);
                NodeOutput::ToolExecution {
                    observation: state.observations.get(before).cloned(),
                }
            }
            Node::Critic => NodeOutput::Critic {
                status: critic::critique(state),
            },
            Node::UserInput => {
                user_input::collect(state);
                NodeOutput::UserInput {
                    response: state.user_response.clone(),
                }
            }
            Node::Synthesis => {
                synthesizer::synthesize(state, &self.synthesizer, self.backend(), sink).await;
                NodeOutput::Synthesis {
                    final_answer: state.final_answer.clone(),
                }
            }
        };
        Ok(output)
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("tools", &self.registry.len())
            .field("max_iterations", &self.config.max_iterations)
            .finish_non_exhaustive()
    }
}

/// Records a fatal node error and hands the run to the critic, which ends it.
fn fail(node: Node, err: &AgentError, state: &mut AgentState, sink: &EventSink) -> Option<Node> {
    warn!(%node, error = %err, "Node failed");
    state.error_message = err.to_string();
    sink.emit(GraphEvent::NodeFailed {
        node,
        error: state.error_message.clone(),
    });
    Some(Node::Critic)
}

/// Fixed edges, with the critic's edge taken from the routing table.
fn successor(node: Node, state: &AgentState) -> Option<Node> {
    match node {
        Node::Planning | Node::UserInput => Some(Node::Reasoning),
        Node::Reasoning => Some(Node::ToolExecution),
        Node::ToolExecution => Some(Node::Critic),
        Node::Critic => {
            let next = critic::route(state.status);
            debug!(status = %state.status, next = ?next, "Critic routed");
            next
        }
        Node::Synthesis => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse};
    use crate::agent::provider::TokenStream;
    use crate::agent::state::Status;
    use crate::agent::stream::{AnswerTranscript, ChunkKind, ChunkOrigin};
    use crate::tools::ToolId;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Answers planner requests (JSON mode) and synthesizer requests
    /// with separate scripts.
    struct MockProvider {
        plan: String,
        answer: String,
        calls: AtomicU32,
    }

    impl MockProvider {
        fn new(plan: &str, answer: &str) -> Self {
            Self {
                plan: plan.to_string(),
                answer: answer.to_string(),
                calls: AtomicU32::new(0),
            }
        }

        fn reply(&self, request: &ChatRequest) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.json_mode {
                self.plan.clone()
            } else {
                self.answer.clone()
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            Ok(ChatResponse {
                content: self.reply(request),
                ..ChatResponse::default()
            })
        }

        async fn chat_stream(&self, request: &ChatRequest) -> Result<TokenStream, AgentError> {
            let tokens: Vec<Result<String, AgentError>> = self
                .reply(request)
                .split_inclusive(' ')
                .map(|t| Ok(t.to_string()))
                .collect();
            Ok(Box::pin(stream::iter(tokens)))
        }
    }

    /// Plans via `chat`; the first synthesis stream breaks after one token.
    struct FlakyStreamProvider {
        streams: AtomicU32,
    }

    #[async_trait]
    impl LlmProvider for FlakyStreamProvider {
        fn name(&self) -> &'static str {
            "flaky-stream"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            Ok(ChatResponse {
                content: r#"{"goal": "g", "plan": ["heading_search"], "reasoning": "r"}"#
                    .to_string(),
                ..ChatResponse::default()
            })
        }

        async fn chat_stream(&self, _request: &ChatRequest) -> Result<TokenStream, AgentError> {
            let first = self.streams.fetch_add(1, Ordering::SeqCst) == 0;
            let mut items = vec![Ok("Yes, ".to_string())];
            if first {
                items.push(Err(AgentError::Stream {
                    message: "connection reset".to_string(),
                }));
            } else {
                items.push(Ok("it has one.".to_string()));
            }
            Ok(Box::pin(stream::iter(items)))
        }
    }

    fn document() -> Document {
        Document::new(
            "INTRODUCTION\nThis report covers the rollout.\n\nCONCLUSION\nIt went well.",
            "txt",
            vec![
                "Introduction".to_string(),
                "Conclusion".to_string(),
                "References".to_string(),
            ],
        )
    }

    fn config() -> AgentConfig {
        AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn test_offline_run_completes() {
        let state = Graph::offline()
            .run("Is there a conclusion? summarize it", document())
            .await;
        assert_eq!(state.status, Status::Completed);
        assert_eq!(state.plan, vec!["heading_search", "summarizer"]);
        assert!(
            state
                .final_answer
                .contains("YES - Document has a Conclusion section")
        );
        assert_eq!(
            state.actions_taken.first().map(String::as_str),
            Some("planning:complete")
        );
        assert_eq!(
            state.actions_taken.last().map(String::as_str),
            Some("synthesis:complete")
        );
    }

    #[tokio::test]
    async fn test_model_backed_run() {
        let provider = Arc::new(MockProvider::new(
            r#"{"goal": "Find conclusion", "plan": ["heading_search"], "reasoning": "look at headings"}"#,
            "Yes. The document ends with a Conclusion section.",
        ));
        let graph = Graph::with_provider(config(), provider.clone());
        let state = graph.run("Is there a conclusion?", document()).await;

        assert_eq!(state.goal, "Find conclusion");
        assert_eq!(state.plan, vec!["heading_search"]);
        assert_eq!(
            state.final_answer,
            "Yes. The document ends with a Conclusion section."
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_plan_falls_back() {
        let provider = Arc::new(MockProvider::new("not json at all", "Answer."));
        let graph = Graph::with_provider(config(), provider.clone());
        let state = graph.run("Is there a diagram?", document()).await;

        assert_eq!(state.plan, vec!["diagram_checker", "heading_search"]);
        assert!(
            state
                .internal_notes
                .iter()
                .any(|n| n == "All LLM planning attempts failed, using fallback planning")
        );
        // Two planner attempts, one synthesis call.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(state.status, Status::Completed);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_fatal() {
        let provider = Arc::new(MockProvider::new(
            r#"{"goal": "g", "plan": ["spell_checker", "heading_search"]}"#,
            "Done.",
        ));
        let graph = Graph::with_provider(config(), provider);
        let state = graph.run("Check spelling", document()).await;

        assert_eq!(state.status, Status::Completed);
        assert!(state.error_message.is_empty());
        let unknown: Vec<&String> = state
            .internal_notes
            .iter()
            .filter(|n| n.starts_with("Unknown tool:"))
            .collect();
        assert_eq!(unknown, vec!["Unknown tool: spell_checker"]);
        assert!(state.tool_outputs.contains(ToolId::HeadingSearch));
    }

    #[tokio::test]
    async fn test_unknown_tool_after_heading_search_queues_summarizer() {
        let provider = Arc::new(MockProvider::new(
            r#"{"goal": "g", "plan": ["heading_search", "spell_checker", "diagram_checker"]}"#,
            "Done.",
        ));
        let graph = Graph::with_provider(config(), provider);
        let state = graph.run("Check spelling", document()).await;

        assert_eq!(state.status, Status::Completed);
        let order: Vec<ToolId> = state.tool_outputs.iter().map(|(id, _)| id).collect();
        assert_eq!(
            order,
            vec![
                ToolId::HeadingSearch,
                ToolId::DiagramChecker,
                ToolId::Summarizer,
            ]
        );
        assert!(
            state
                .internal_notes
                .iter()
                .any(|n| n == reasoner::RECOVERY_NOTE)
        );
        assert_eq!(state.plan.len(), 3);
    }

    #[tokio::test]
    async fn test_blank_query_runs_default_plan() {
        let state = Graph::offline().run("   ", document()).await;
        assert_eq!(state.status, Status::Completed);
        assert_eq!(state.plan, vec!["heading_search", "format_checker", "summarizer"]);
        assert!(state.error_message.is_empty());
        assert!(!state.final_answer.is_empty());
    }

    #[test]
    fn test_failed_node_ends_run_through_critic() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx);
        let mut state = AgentState::new("q", document(), 20);
        let err = AgentError::Config {
            message: "bad prompt dir".to_string(),
        };

        assert_eq!(fail(Node::Reasoning, &err, &mut state, &sink), Some(Node::Critic));
        assert!(state.error_message.contains("bad prompt dir"));
        assert!(matches!(
            rx.try_recv(),
            Ok(GraphEvent::NodeFailed { node: Node::Reasoning, .. })
        ));

        assert_eq!(critic::critique(&mut state), Status::Error);
        assert_eq!(successor(Node::Critic, &state), None);
        assert!(state.final_answer.is_empty());
    }

    #[tokio::test]
    async fn test_iteration_cap_stops_run() {
        let mut config = AgentConfig::offline();
        config.max_iterations = 1;
        let graph = Graph::assemble(config, None);
        let state = graph.run("Give me an overview", document()).await;
        assert_eq!(state.status, Status::MaxIterationsReached);
        assert_eq!(state.loop_counter, 1);
        assert!(state.final_answer.is_empty());
        assert_eq!(state.tool_outputs.len(), 1);
    }

    #[tokio::test]
    async fn test_event_order() {
        let RunHandle { events, state } =
            Graph::offline().run_events("Is there a figure?", document());
        let events: Vec<GraphEvent> = events.collect().await;
        let final_state = state.await.unwrap_or_else(|_| unreachable!());

        assert_eq!(
            events.first(),
            Some(&GraphEvent::NodeStarted {
                node: Node::Planning
            })
        );
        let finished: Vec<Node> = events
            .iter()
            .filter_map(|e| match e {
                GraphEvent::NodeFinished { node, .. } => Some(*node),
                _ => None,
            })
            .collect();
        assert_eq!(finished.first(), Some(&Node::Planning));
        assert_eq!(finished.last(), Some(&Node::Synthesis));
        assert_eq!(final_state.status, Status::Completed);
    }

    #[tokio::test]
    async fn test_run_stream_streams_answer_tokens() {
        let provider = Arc::new(MockProvider::new(
            r#"{"goal": "Find conclusion", "plan": ["heading_search"], "reasoning": "headings"}"#,
            "Yes, there is a conclusion.",
        ));
        let graph = Graph::with_provider(config(), provider);
        let chunks: Vec<ClassifiedChunk> = graph
            .run_stream("Is there a conclusion?", document())
            .collect()
            .await;

        let thoughts = chunks.iter().filter(|c| c.kind == ChunkKind::Thought).count();
        assert_eq!(thoughts, 3);
        let streamed: String = chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::Answer && c.origin == ChunkOrigin::Token)
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(streamed, "Yes, there is a conclusion.");
        assert_eq!(
            chunks.last().map(ClassifiedChunk::to_wire),
            Some("ANSWER:Yes, there is a conclusion.".to_string())
        );
    }

    #[tokio::test]
    async fn test_run_stream_marks_retried_tokens_void() {
        let provider = Arc::new(FlakyStreamProvider {
            streams: AtomicU32::new(0),
        });
        let graph = Graph::with_provider(config(), provider);
        let chunks: Vec<ClassifiedChunk> = graph
            .run_stream("Is there a conclusion?", document())
            .collect()
            .await;

        let discard = chunks
            .iter()
            .position(|c| c.origin == ChunkOrigin::Discarded)
            .unwrap_or_else(|| unreachable!());
        let surviving: String = chunks[discard..]
            .iter()
            .filter(|c| c.origin == ChunkOrigin::Token)
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(surviving, "Yes, it has one.");

        let mut transcript = AnswerTranscript::new();
        let shown: Vec<&ClassifiedChunk> =
            chunks.iter().filter(|c| transcript.admit(c)).collect();
        assert!(shown.iter().all(|c| c.origin != ChunkOrigin::FinalAnswer));
    }
}
