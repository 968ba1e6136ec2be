//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Docent: ask questions about a document.
///
/// Plans which analysis tools to run, runs them, and writes an answer.
/// Uses a language model when one is configured and deterministic rules
/// otherwise.
#[derive(Parser, Debug)]
#[command(name = "docent")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a document with the agent.
    ///
    /// Loads the document, plans which tools to run, runs them and prints
    /// the plan, the observations and the final answer.
    #[command(after_help = r#"Examples:
  docent analyze report.md "Is there a conclusion? summarize it"
  docent analyze report.md "Any flow diagrams?" --no-llm
  docent analyze extracted.json "Check the format" --stream
  docent --format json analyze notes.txt "Give me an overview" | jq .final_answer
  docent analyze report.md "Validate it" --save run.json
"#)]
    Analyze {
        /// Document to analyze (.txt, .md, or a pre-extracted .json handle).
        file: PathBuf,

        /// The question to answer.
        query: String,

        /// Skip the language model and use deterministic planning and synthesis.
        #[arg(long)]
        no_llm: bool,

        /// Print reasoning and answer text as it is produced.
        #[arg(long)]
        stream: bool,

        /// Reasoning-cycle ceiling.
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Model identifier for planning and synthesis.
        #[arg(long)]
        model: Option<String>,

        /// Directory containing prompt template files.
        ///
        /// Overrides `DOCENT_PROMPT_DIR` and the default
        /// `~/.config/docent/prompts/`.
        #[arg(long)]
        prompt_dir: Option<PathBuf>,

        /// Write the JSON run record to this file.
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// List the analysis tools the planner can choose from.
    Tools,

    /// Write default prompt templates to a directory.
    ///
    /// Creates `planner.md` and `synthesizer.md`. Existing files are
    /// never overwritten.
    #[command(name = "init-prompts")]
    #[command(after_help = r#"Examples:
  docent init-prompts                      # Write to ~/.config/docent/prompts/
  docent init-prompts --dir ./my-prompts   # Write to custom directory
"#)]
    InitPrompts {
        /// Target directory for prompt templates.
        ///
        /// Defaults to `~/.config/docent/prompts/`.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
