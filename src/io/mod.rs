//! Document provider.
//!
//! Turns files on disk into the [`Document`](crate::core::Document) shape
//! the agent reads. Plain text and markdown are loaded directly; binary
//! formats are expected to arrive as pre-extracted JSON handles.

pub mod reader;
pub mod sections;

pub use reader::{load_document, read_file, write_file};
pub use sections::extract_sections;
