//! # docent
//!
//! An autonomous document-analysis agent.
//!
//! Given a question and a parsed document, docent plans which analysis
//! tools to run, executes them one per reasoning cycle, lets a critic
//! decide whether to continue, and synthesizes an answer. Planning and
//! synthesis use a language model when one is configured and fall back to
//! deterministic keyword rules when it is disabled or fails.
//!
//! ## Quick start
//!
//! ```no_run
//! use docent::agent::Graph;
//! use docent::io::load_document;
//!
//! # async fn demo() -> docent::Result<()> {
//! let document = load_document(std::path::Path::new("report.md"))?;
//! let state = Graph::offline()
//!     .run("Is there a conclusion? summarize it", document)
//!     .await;
//! assert!(!state.final_answer.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`agent`]: the planner, reasoner, executor, critic and synthesizer
//!   graph, its streaming feed and the language-model backend
//! - [`tools`]: the four analysis tools and their registry
//! - [`core`]: document and tool-result value types
//! - [`io`]: the document provider
//! - [`cli`]: the `docent` command line

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;
pub mod io;
pub mod tools;

pub use crate::agent::{AgentConfig, AgentState, Graph, Status};
pub use crate::core::{Document, DocumentMetadata, ToolResult, ToolStatus};
pub use crate::error::{AgentError, CommandError, DocumentError, Error, Result};
pub use crate::tools::{AnalysisTool, ToolId, ToolRegistry};
