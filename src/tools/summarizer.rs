//! Structural summary of a document.

use serde_json::{Map, json};
use unicode_segmentation::UnicodeSegmentation;

use super::{AnalysisTool, ToolId, into_details};
use crate::core::{Document, ToolResult, ToolStatus};

/// Maximum preview length, in grapheme clusters.
const PREVIEW_LEN: usize = 500;
/// Number of section names listed in the structure line.
const LISTED_SECTIONS: usize = 5;

/// Summarizes document structure and previews its opening paragraph.
#[derive(Debug, Clone, Copy, Default)]
pub struct Summarizer;

impl AnalysisTool for Summarizer {
    fn id(&self) -> ToolId {
        ToolId::Summarizer
    }

    fn description(&self) -> &'static str {
        "Summarize document content or specific sections"
    }

    fn run(&self, document: &Document) -> ToolResult {
        let paragraphs: Vec<&str> = document
            .content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let Some(first) = paragraphs.first() else {
            return ToolResult::new(
                ToolStatus::Error,
                "Unable to summarize - no content found",
                Map::new(),
            );
        };

        let sections = document.sections();
        let mut structure = Vec::new();
        if !sections.is_empty() {
            structure.push(format!("Document has {} main sections", sections.len()));
            let listed: Vec<&str> = sections
                .iter()
                .take(LISTED_SECTIONS)
                .map(String::as_str)
                .collect();
            structure.push(format!("Sections include: {}", listed.join(", ")));
        }

        let preview: String = first.graphemes(true).take(PREVIEW_LEN).collect();
        let word_count = document.content.split_whitespace().count();

        ToolResult::new(
            ToolStatus::Success,
            format!("Document summary generated ({word_count} words total)"),
            into_details(json!({
                "structure": structure.join(", "),
                "preview": preview,
                "word_count": word_count,
                "paragraph_count": paragraphs.len(),
            })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_is_error() {
        let doc = Document::new("  \n\n  ", "txt", Vec::new());
        let result = Summarizer.run(&doc);
        assert_eq!(result.status, ToolStatus::Error);
        assert_eq!(result.summary, "Unable to summarize - no content found");
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_summary_details() {
        let doc = Document::new(
            "First paragraph here.\n\nSecond one.",
            "md",
            vec!["Intro".to_string(), "Body".to_string()],
        );
        let result = Summarizer.run(&doc);
        assert_eq!(result.status, ToolStatus::Success);
        assert_eq!(result.summary, "Document summary generated (5 words total)");
        assert_eq!(
            result.details.get("structure"),
            Some(&json!("Document has 2 main sections, Sections include: Intro, Body"))
        );
        assert_eq!(result.details.get("preview"), Some(&json!("First paragraph here.")));
        assert_eq!(result.details.get("paragraph_count"), Some(&json!(2)));
    }

    #[test]
    fn test_preview_truncates_on_grapheme_boundary() {
        let long = "é".repeat(PREVIEW_LEN + 20);
        let doc = Document::new(long, "txt", Vec::new());
        let result = Summarizer.run(&doc);
        let preview = result
            .details
            .get("preview")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        assert_eq!(preview.graphemes(true).count(), PREVIEW_LEN);
    }
}
