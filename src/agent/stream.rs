//! Stream classification.
//!
//! Projects a run's [`GraphEvent`] feed into user-facing chunks, each
//! labelled as internal reasoning ([`ChunkKind::Thought`]) or answer text
//! ([`ChunkKind::Answer`]).

use serde::Serialize;

use super::events::{GraphEvent, Node, NodeOutput};

/// Wire prefix for reasoning chunks.
pub const THOUGHT_PREFIX: &str = "THOUGHT:";
/// Wire prefix for answer chunks.
pub const ANSWER_PREFIX: &str = "ANSWER:";

/// Label of a streamed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Internal reasoning: plan, strategy, structured fragments.
    Thought,
    /// Text meant for the user.
    Answer,
}

impl ChunkKind {
    /// Wire prefix for this kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Thought => THOUGHT_PREFIX,
            Self::Answer => ANSWER_PREFIX,
        }
    }
}

/// Which event produced a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkOrigin {
    /// The planner's completion.
    Planning,
    /// An incremental synthesis token.
    Token,
    /// The complete answer, re-sent when synthesis finishes.
    FinalAnswer,
    /// Notice that the preceding streamed tokens were void.
    Discarded,
}

/// One classified unit of streamed output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedChunk {
    /// Thought or answer.
    pub kind: ChunkKind,
    /// Chunk text, without a wire prefix.
    pub text: String,
    /// Producing event.
    pub origin: ChunkOrigin,
}

impl ClassifiedChunk {
    fn new(kind: ChunkKind, text: impl Into<String>, origin: ChunkOrigin) -> Self {
        Self {
            kind,
            text: text.into(),
            origin,
        }
    }

    /// Classifies a raw token.
    ///
    /// Text already carrying a `THOUGHT:` or `ANSWER:` prefix keeps its
    /// label; anything else goes through [`classify_token`].
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        if let Some(rest) = token.strip_prefix(THOUGHT_PREFIX) {
            Self::new(ChunkKind::Thought, rest, ChunkOrigin::Token)
        } else if let Some(rest) = token.strip_prefix(ANSWER_PREFIX) {
            Self::new(ChunkKind::Answer, rest, ChunkOrigin::Token)
        } else {
            Self::new(classify_token(token), token, ChunkOrigin::Token)
        }
    }

    /// Renders the `THOUGHT:<text>` / `ANSWER:<text>` line protocol.
    #[must_use]
    pub fn to_wire(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.text)
    }
}

/// Keys whose quoted form marks a structured-data fragment.
const STRUCTURED_KEYS: [&str; 5] = [
    "\"goal\":",
    "\"plan\":",
    "\"reasoning\":",
    "\"action\":",
    "\"tool\":",
];

/// Words that, next to a quote and a colon, mark a fragment.
const FRAGMENT_WORDS: [&str; 4] = ["goal", "plan", "reasoning", "action"];

/// A rule that marks a token as reasoning rather than answer text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThoughtRule {
    /// Trimmed text opens an object or array.
    OpensStructure,
    /// Trimmed text closes an object.
    ClosesObject,
    /// Text contains a quoted planner key followed by a colon.
    StructuredKey,
    /// Text has a quote, a colon and a planner keyword anywhere.
    KeywordFragment,
}

impl ThoughtRule {
    /// All rules, in evaluation order.
    pub const ALL: [Self; 4] = [
        Self::OpensStructure,
        Self::ClosesObject,
        Self::StructuredKey,
        Self::KeywordFragment,
    ];

    /// Returns `true` if `token` matches this rule.
    #[must_use]
    pub fn matches(self, token: &str) -> bool {
        let trimmed = token.trim();
        match self {
            Self::OpensStructure => trimmed.starts_with('{') || trimmed.starts_with('['),
            Self::ClosesObject => trimmed.ends_with('}'),
            Self::StructuredKey => STRUCTURED_KEYS.iter().any(|k| token.contains(k)),
            Self::KeywordFragment => {
                token.contains('"')
                    && token.contains(':')
                    && FRAGMENT_WORDS.iter().any(|w| token.contains(w))
            }
        }
    }
}

/// Labels an unprefixed token.
#[must_use]
pub fn classify_token(token: &str) -> ChunkKind {
    if ThoughtRule::ALL.iter().any(|rule| rule.matches(token)) {
        ChunkKind::Thought
    } else {
        ChunkKind::Answer
    }
}

/// Returns `true` if trimmed text starts with `{`.
#[must_use]
pub fn looks_like_json(text: &str) -> bool {
    text.trim_start().starts_with('{')
}

/// Thought shown when a partially streamed answer is abandoned.
pub const DISCARD_NOTICE: &str = "\n⚠️ Answer attempt failed, partial text discarded\n\n";

/// Stateful projection of one run's events.
///
/// Only the first planning completion is shown. Everything else is
/// stateless and order-preserving.
#[derive(Debug, Default)]
pub struct StreamClassifier {
    planning_shown: bool,
}

impl StreamClassifier {
    /// Creates a classifier for a new run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts one event into zero or more chunks.
    pub fn classify(&mut self, event: GraphEvent) -> Vec<ClassifiedChunk> {
        match event {
            GraphEvent::NodeFinished {
                output:
                    NodeOutput::Planning {
                        goal,
                        reasoning,
                        plan,
                    },
                ..
            } if !self.planning_shown => {
                self.planning_shown = true;
                planning_thoughts(&goal, &reasoning, &plan)
            }
            GraphEvent::Token {
                node: Node::Synthesis,
                text,
            } if !text.is_empty() => vec![ClassifiedChunk::from_token(&text)],
            GraphEvent::TokensDiscarded {
                node: Node::Synthesis,
                ..
            } => vec![ClassifiedChunk::new(
                ChunkKind::Thought,
                DISCARD_NOTICE,
                ChunkOrigin::Discarded,
            )],
            GraphEvent::NodeFinished {
                output: NodeOutput::Synthesis { final_answer },
                ..
            } if !final_answer.is_empty() && !looks_like_json(&final_answer) => {
                vec![ClassifiedChunk::new(
                    ChunkKind::Answer,
                    final_answer,
                    ChunkOrigin::FinalAnswer,
                )]
            }
            _ => Vec::new(),
        }
    }
}

/// Tracks the live answer text a consumer has already shown.
///
/// Token chunks accumulate, a [`ChunkOrigin::Discarded`] chunk resets the
/// transcript, and the re-sent final answer is admitted only when the
/// surviving tokens do not already spell it out.
#[derive(Debug, Default)]
pub struct AnswerTranscript {
    streamed: String,
}

impl AnswerTranscript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text streamed since the last discard.
    #[must_use]
    pub fn streamed(&self) -> &str {
        &self.streamed
    }

    /// Records `chunk` and returns `false` if it should not be shown.
    pub fn admit(&mut self, chunk: &ClassifiedChunk) -> bool {
        match chunk.origin {
            ChunkOrigin::Token => {
                self.streamed.push_str(&chunk.text);
                true
            }
            ChunkOrigin::Discarded => {
                self.streamed.clear();
                true
            }
            ChunkOrigin::FinalAnswer => self.streamed.trim() != chunk.text.trim(),
            ChunkOrigin::Planning => true,
        }
    }
}

fn planning_thoughts(goal: &str, reasoning: &str, plan: &[String]) -> Vec<ClassifiedChunk> {
    let mut chunks = Vec::with_capacity(3);
    let mut thought = |text: String| {
        chunks.push(ClassifiedChunk::new(
            ChunkKind::Thought,
            text,
            ChunkOrigin::Planning,
        ));
    };

    if !goal.is_empty() && !looks_like_json(goal) {
        thought(format!("\n### 🎯 Goal\n{goal}\n\n"));
    }
    if !reasoning.is_empty() && !looks_like_json(reasoning) {
        thought(format!("### 🧠 Strategy\n{reasoning}\n\n"));
    }
    if !plan.is_empty() {
        thought(format!("### 🔧 Action Plan\n`{}`\n\n---\n", plan.join(" → ")));
    }
    chunks
}
