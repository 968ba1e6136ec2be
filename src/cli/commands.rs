//! Command implementations.
//!
//! Each command returns its output as a string; the binary prints it.
//! Streaming analysis is the exception: chunks are written as they arrive.

use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures_util::StreamExt;

use crate::agent::config::AgentConfig;
use crate::agent::graph::{Graph, RunHandle};
use crate::agent::prompt::PromptSet;
use crate::agent::report::RunReport;
use crate::agent::state::{AgentState, Status};
use crate::agent::stream::{
    AnswerTranscript, ChunkKind, ChunkOrigin, ClassifiedChunk, StreamClassifier,
};
use crate::cli::output::{OutputFormat, format_execution_summary, format_tool_list};
use crate::cli::parser::{Cli, Commands};
use crate::core::Document;
use crate::error::{AgentError, CommandError, Result};
use crate::io::{load_document, write_file};
use crate::tools::ToolRegistry;

/// Parameters for the analyze command.
#[derive(Debug, Clone)]
pub struct AnalyzeParams<'a> {
    /// Document path.
    pub file: &'a Path,
    /// The question to answer.
    pub query: &'a str,
    /// Disable the model-backed paths.
    pub no_llm: bool,
    /// Write classified chunks as they arrive.
    pub stream: bool,
    /// Reasoning-cycle ceiling override.
    pub max_iterations: Option<u32>,
    /// Model override.
    pub model: Option<&'a str>,
    /// Prompt template directory override.
    pub prompt_dir: Option<&'a Path>,
    /// Where to write the JSON run record.
    pub save: Option<&'a Path>,
}

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the document cannot be loaded, the agent cannot be
/// configured, or the run ends in an error status.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Analyze {
            file,
            query,
            no_llm,
            stream,
            max_iterations,
            model,
            prompt_dir,
            save,
        } => {
            let params = AnalyzeParams {
                file,
                query,
                no_llm: *no_llm,
                stream: *stream,
                max_iterations: *max_iterations,
                model: model.as_deref(),
                prompt_dir: prompt_dir.as_deref(),
                save: save.as_deref(),
            };
            cmd_analyze(&params, format)
        }
        Commands::Tools => Ok(format_tool_list(&ToolRegistry::standard(), format)),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

fn agent_config(params: &AnalyzeParams<'_>) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder();
    if params.no_llm {
        builder = builder.llm_enabled(false);
    }
    if let Some(n) = params.max_iterations {
        builder = builder.max_iterations(n);
    }
    if let Some(model) = params.model {
        builder = builder.model(model);
    }
    if let Some(dir) = params.prompt_dir {
        builder = builder.prompt_dir(dir);
    }

    builder.from_env().build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent configuration error: {e}")).into()
    })
}

fn cmd_analyze(params: &AnalyzeParams<'_>, format: OutputFormat) -> Result<String> {
    check_query(params.query)?;
    let document = load_document(params.file)?;
    let config = agent_config(params)?;
    let graph = Graph::new(config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;

    // Create tokio runtime as sync/async bridge
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;

    let start = Instant::now();
    let state = if params.stream {
        rt.block_on(stream_run(&graph, params.query, document, format))?
    } else {
        rt.block_on(graph.run(params.query, document))
    };
    let report = RunReport::new(&state, start.elapsed());

    if let Some(path) = params.save {
        write_file(path, &format.to_json(&report))?;
    }

    if state.status == Status::Error {
        return Err(CommandError::ExecutionFailed(format!(
            "Analysis failed: {}",
            state.error_message
        ))
        .into());
    }

    match (format, params.stream) {
        (OutputFormat::Json, false) => Ok(format.to_json(&report)),
        (OutputFormat::Json, true) => Ok(String::new()),
        (OutputFormat::Text, false) => Ok(format_execution_summary(&state)),
        (OutputFormat::Text, true) if state.status == Status::Completed => Ok("\n".to_string()),
        (OutputFormat::Text, true) => Ok(format!("\nStatus: {}\n", state.status)),
    }
}

/// Longest query the command line accepts, in bytes.
///
/// An input limit of this front end. The agent itself plans any query.
pub const MAX_QUERY_LEN: usize = 10_000;

fn check_query(query: &str) -> std::result::Result<(), AgentError> {
    if query.trim().is_empty() {
        return Err(AgentError::InvalidQuery {
            message: "query is empty".to_string(),
        });
    }
    if query.len() > MAX_QUERY_LEN {
        return Err(AgentError::InvalidQuery {
            message: format!("query is {} bytes, limit is {MAX_QUERY_LEN}", query.len()),
        });
    }
    Ok(())
}

/// Runs the graph, writing classified chunks as they arrive.
///
/// Text format sends answers to stdout and thoughts to stderr; JSON
/// format writes one chunk object per line to stdout.
async fn stream_run(
    graph: &Graph,
    query: &str,
    document: Document,
    format: OutputFormat,
) -> Result<AgentState> {
    let RunHandle { mut events, state } = graph.run_events(query, document);
    let mut classifier = StreamClassifier::new();
    let mut transcript = AnswerTranscript::new();
    let stdout = io::stdout();
    let stderr = io::stderr();

    while let Some(event) = events.next().await {
        for chunk in classifier.classify(event) {
            render_chunk(
                &chunk,
                &mut transcript,
                format,
                &mut stdout.lock(),
                &mut stderr.lock(),
            )
            .map_err(|e| CommandError::OutputFormat(format!("Failed to write output: {e}")))?;
        }
    }

    state.await.map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent task failed: {e}")).into()
    })
}

/// Writes one chunk unless the transcript already covers it.
///
/// The re-sent final answer is skipped when the surviving streamed tokens
/// already spell it out. A discarded attempt ends the partial answer line
/// so the next attempt or the fallback starts fresh.
fn render_chunk(
    chunk: &ClassifiedChunk,
    transcript: &mut AnswerTranscript,
    format: OutputFormat,
    out: &mut dyn IoWrite,
    err: &mut dyn IoWrite,
) -> io::Result<()> {
    if chunk.origin == ChunkOrigin::Discarded
        && format == OutputFormat::Text
        && !transcript.streamed().is_empty()
    {
        writeln!(out)?;
    }
    if transcript.admit(chunk) {
        write_chunk(chunk, format, out, err)?;
    }
    Ok(())
}

fn write_chunk(
    chunk: &ClassifiedChunk,
    format: OutputFormat,
    out: &mut dyn IoWrite,
    err: &mut dyn IoWrite,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let line = serde_json::to_string(chunk).map_err(io::Error::other)?;
            writeln!(out, "{line}")?;
            out.flush()
        }
        OutputFormat::Text => match chunk.kind {
            ChunkKind::Thought => {
                write!(err, "{}", chunk.to_wire())?;
                err.flush()
            }
            ChunkKind::Answer => {
                write!(out, "{}", chunk.text)?;
                out.flush()
            }
        },
    }
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown");
                output.push_str("  ");
                output.push_str(name);
                output.push('\n');
            }
            Ok(output)
        }
        OutputFormat::Json => {
            let files: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
            Ok(format.to_json(&serde_json::json!({
                "directory": target_dir.display().to_string(),
                "written": files,
            })))
        }
    }
}
