//! CLI layer for docent.
//!
//! Provides the command-line interface using clap, with commands for
//! analyzing documents, listing tools and scaffolding prompts.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
