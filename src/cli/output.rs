//! Output formatting for CLI commands.

use std::fmt::Write;

use serde::Serialize;

use crate::agent::state::{AgentState, Status};
use crate::tools::ToolRegistry;

/// Width of the rules in the execution summary.
const RULE_WIDTH: usize = 70;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; anything but `json` is text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes a value as pretty JSON.
    #[must_use]
    pub fn to_json<T: Serialize>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
    }
}

/// Renders the plan, observations and final answer of a run.
#[must_use]
pub fn format_execution_summary(state: &AgentState) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "\n{rule}\n📋 AGENT PLAN\n{rule}");
    let _ = writeln!(out, "Goal: {}", state.goal);
    let _ = writeln!(out, "Plan: {}", state.plan.join(" → "));

    let _ = writeln!(out, "\n{rule}\n🔍 OBSERVATIONS\n{rule}");
    for obs in &state.observations {
        let _ = writeln!(out, "  • {obs}");
    }

    let _ = writeln!(out, "\n{rule}\n✨ FINAL ANSWER\n{rule}");
    if state.final_answer.is_empty() {
        let _ = writeln!(out, "(no answer produced)");
    } else {
        let _ = writeln!(out, "{}", state.final_answer);
    }
    let _ = writeln!(out, "{rule}");

    if state.status != Status::Completed {
        let _ = writeln!(out, "Status: {}", state.status);
    }
    out
}

#[derive(Serialize)]
struct ToolEntry<'a> {
    id: &'a str,
    description: &'a str,
}

/// Renders the registry's tools.
#[must_use]
pub fn format_tool_list(registry: &ToolRegistry, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let width = registry
                .iter()
                .map(|t| t.id().as_str().len())
                .max()
                .unwrap_or(0);
            let mut out = String::from("Available tools:\n");
            for tool in registry.iter() {
                let _ = writeln!(
                    out,
                    "  {:<width$}  {}",
                    tool.id().as_str(),
                    tool.description()
                );
            }
            out
        }
        OutputFormat::Json => {
            let entries: Vec<ToolEntry<'_>> = registry
                .iter()
                .map(|t| ToolEntry {
                    id: t.id().as_str(),
                    description: t.description(),
                })
                .collect();
            format.to_json(&entries)
        }
    }
}
