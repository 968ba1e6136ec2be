//! Core value types shared by the agent loop, the analysis tools and the
//! document provider.

pub mod document;
pub mod tool_result;

pub use document::{Document, DocumentMetadata};
pub use tool_result::{ToolResult, ToolStatus};
