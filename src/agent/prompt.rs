//! System prompts and template builders for the planner and synthesizer.
//!
//! System prompts define each agent's role. Template builders format the
//! user message with the query, document metadata and tool results.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::agent::state::ToolOutputs;
use crate::core::Document;

/// System prompt for the planner.
pub const PLANNER_SYSTEM_PROMPT: &str = r#"You are an intelligent document analysis agent. Analyze the user's query and create an action plan.

Available tools:
1. heading_search - Search for specific sections/headings in the document
2. format_checker - Check document format, structure, and completeness
3. diagram_checker - Find and analyze diagrams, figures, charts, or images
4. summarizer - Summarize document content or specific sections

Respond with a JSON object containing:
- goal: What the user wants to accomplish
- plan: Array of tools to use in order
- reasoning: Why these tools in this order

Example responses:

Query: "Is there an overview section?"
{
    "goal": "Check if document contains overview section",
    "plan": ["heading_search"],
    "reasoning": "Need to search document structure for overview heading"
}

Query: "check if document has overview, flow diagram and use case diagram"
{
    "goal": "Verify presence of overview section and multiple diagram types",
    "plan": ["heading_search", "diagram_checker"],
    "reasoning": "First check for overview in headings, then search for flow and use case diagrams"
}

Query: "Is there a conclusion? If yes, summarize it"
{
    "goal": "Find and summarize conclusion section",
    "plan": ["heading_search", "summarizer"],
    "reasoning": "First locate conclusion section, then summarize its content"
}

Query: "check if properly formatted"
{
    "goal": "Validate document format and structure",
    "plan": ["format_checker", "heading_search"],
    "reasoning": "Check format compliance and document structure"
}

Use only the tool names listed above. Respond ONLY with valid JSON, no additional text."#;

/// System prompt for the synthesizer.
pub const SYNTHESIZER_SYSTEM_PROMPT: &str = r#"You are analyzing a document based on a user's query. Analysis tools have already gathered information about the document; your job is to turn their results into a clear, direct answer.

Guidelines:
- Answer the specific question asked
- Be concise but complete
- If the query asks "is there X?", clearly say YES or NO first
- If asked to summarize, provide the actual summary from the tool results
- Reference specific findings from the tools
- If something wasn't found, say so clearly
- Use natural, conversational language

Do not output JSON. Respond with the answer text only."#;

/// Default prompt directory relative to the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/docent/prompts";

/// File name of the planner template.
const PLANNER_FILENAME: &str = "planner.md";
/// File name of the synthesizer template.
const SYNTHESIZER_FILENAME: &str = "synthesizer.md";

/// Sections listed in the planning prompt.
const PLANNING_SECTION_LIMIT: usize = 10;

/// Resolved system prompts.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults. Use [`PromptSet::load`] to resolve the prompt
/// directory from CLI flags, environment variables, or the default path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// System prompt for the planner.
    pub planner: String,
    /// System prompt for the synthesizer.
    pub synthesizer: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument (from `--prompt-dir` or config)
    /// 2. `DOCENT_PROMPT_DIR` environment variable
    /// 3. `~/.config/docent/prompts/`
    ///
    /// Each file is loaded independently; a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("DOCENT_PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .filter(|content| !content.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            planner: load_file(PLANNER_FILENAME, PLANNER_SYSTEM_PROMPT),
            synthesizer: load_file(SYNTHESIZER_FILENAME, SYNTHESIZER_SYSTEM_PROMPT),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            planner: PLANNER_SYSTEM_PROMPT.to_string(),
            synthesizer: SYNTHESIZER_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten; use this for initial scaffolding only.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let templates = [
            (PLANNER_FILENAME, PLANNER_SYSTEM_PROMPT),
            (SYNTHESIZER_FILENAME, SYNTHESIZER_SYSTEM_PROMPT),
        ];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Builds the user message for the planner.
#[must_use]
pub fn build_planning_prompt(query: &str, document: &Document) -> String {
    let sections = document.sections();
    let section_list = if sections.is_empty() {
        "None detected".to_string()
    } else {
        sections
            .iter()
            .take(PLANNING_SECTION_LIMIT)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let file_type = match document.format() {
        "" => "unknown",
        other => other,
    };

    format!(
        "Document Info:\n\
         - Sections found: {section_list}\n\
         - File type: {file_type}\n\n\
         User Query: \"{query}\"\n\n\
         Now analyze: \"{query}\"\n\n\
         Respond ONLY with valid JSON, no additional text."
    )
}

/// Builds the user message for the synthesizer.
///
/// Every tool result is rendered with its status, summary and
/// pretty-printed details, in execution order.
#[must_use]
pub fn build_synthesis_prompt(query: &str, goal: &str, outputs: &ToolOutputs) -> String {
    let mut results = String::new();
    for (id, output) in outputs.iter() {
        let details =
            serde_json::to_string_pretty(&output.details).unwrap_or_else(|_| "{}".to_string());
        let _ = write!(
            results,
            "{id}:\n  Status: {}\n  Summary: {}\n  Details: {details}\n",
            output.status, output.summary
        );
    }

    format!(
        "Original Query: \"{query}\"\n\
         Goal: {goal}\n\n\
         Tool Results:\n{results}\n\
         Based on these tool results, provide a clear, direct answer to the user's query.\n\n\
         Provide your answer now:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ToolResult, ToolStatus};
    use crate::tools::ToolId;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_build_planning_prompt() {
        let doc = Document::new(
            "",
            "md",
            vec!["Introduction".to_string(), "Conclusion".to_string()],
        );
        let prompt = build_planning_prompt("Is there a conclusion?", &doc);
        assert!(prompt.contains("Sections found: Introduction, Conclusion"));
        assert!(prompt.contains("File type: md"));
        assert!(prompt.contains("User Query: \"Is there a conclusion?\""));
    }

    #[test]
    fn test_build_planning_prompt_without_metadata() {
        let prompt = build_planning_prompt("q", &Document::default());
        assert!(prompt.contains("Sections found: None detected"));
        assert!(prompt.contains("File type: unknown"));
    }

    #[test]
    fn test_build_planning_prompt_limits_sections() {
        let sections: Vec<String> = (0..15).map(|i| format!("S{i}")).collect();
        let doc = Document::new("", "txt", sections);
        let prompt = build_planning_prompt("q", &doc);
        assert!(prompt.contains("S9"));
        assert!(!prompt.contains("S10"));
    }

    #[test]
    fn test_build_synthesis_prompt() {
        let mut outputs = ToolOutputs::default();
        outputs.insert(
            ToolId::HeadingSearch,
            ToolResult::new(
                ToolStatus::Found,
                "Found 1 sections/headings",
                json!({"sections": ["Conclusion"]})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            ),
        );
        let prompt = build_synthesis_prompt("Is there a conclusion?", "Find conclusion", &outputs);
        assert!(prompt.contains("Original Query: \"Is there a conclusion?\""));
        assert!(prompt.contains("Goal: Find conclusion"));
        assert!(prompt.contains("heading_search:\n  Status: found"));
        assert!(prompt.contains("\"Conclusion\""));
    }

    #[test]
    fn test_load_falls_back_per_file() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("planner.md"), "custom planner")
            .unwrap_or_else(|_| unreachable!());
        let prompts = PromptSet::load(Some(dir.path()));
        assert_eq!(prompts.planner, "custom planner");
        assert_eq!(prompts.synthesizer, SYNTHESIZER_SYSTEM_PROMPT);
    }

    #[test]
    fn test_write_defaults_does_not_overwrite() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("synthesizer.md"), "mine")
            .unwrap_or_else(|_| unreachable!());
        let written = PromptSet::write_defaults(dir.path()).unwrap_or_default();
        assert_eq!(written, vec![dir.path().join("planner.md")]);
        let kept = std::fs::read_to_string(dir.path().join("synthesizer.md")).unwrap_or_default();
        assert_eq!(kept, "mine");
    }

    #[test]
    fn test_prompts_not_empty() {
        assert!(!PLANNER_SYSTEM_PROMPT.is_empty());
        assert!(!SYNTHESIZER_SYSTEM_PROMPT.is_empty());
        assert_eq!(PromptSet::default(), PromptSet::defaults());
    }
}
