//! Diagram, figure and table detection.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde_json::json;

use super::{AnalysisTool, ToolId, into_details};
use crate::core::{Document, ToolResult, ToolStatus};

/// Textual reference patterns, checked in this order.
const REFERENCE_PATTERNS: [(&str, &str); 3] = [
    ("Figure", r"Fig(?:ure|[\.])?\s*\d+"),
    ("Diagram", r"Diagram\s*\d+"),
    ("Table", r"Table\s*\d+"),
];

static REFERENCES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    REFERENCE_PATTERNS
        .iter()
        .filter_map(|(label, pattern)| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .ok()
                .map(|re| (*label, re))
        })
        .collect()
});

/// Detects visuals from extractor metadata and textual references.
///
/// Metadata counts are reliable for word-processor and paged formats;
/// textual references ("Figure 3", "Table 2") cover plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagramChecker;

impl AnalysisTool for DiagramChecker {
    fn id(&self) -> ToolId {
        ToolId::DiagramChecker
    }

    fn description(&self) -> &'static str {
        "Find and analyze diagrams, figures, charts, or images"
    }

    fn run(&self, document: &Document) -> ToolResult {
        let meta = &document.metadata;
        let mut found: Vec<String> = Vec::new();

        if meta.num_images > 0 {
            found.push(format!("{} images", meta.num_images));
        }
        if meta.num_tables > 0 {
            found.push(format!("{} tables", meta.num_tables));
        }
        if meta.has_vector_graphics {
            found.push("vector-based diagrams/charts".to_string());
        }

        for (label, re) in REFERENCES.iter() {
            let unique: HashSet<&str> = re
                .find_iter(&document.content)
                .map(|m| m.as_str())
                .collect();
            if !unique.is_empty() {
                found.push(format!("{} text references to {label}s", unique.len()));
            }
        }

        if found.is_empty() {
            return ToolResult::new(
                ToolStatus::NotFound,
                "No diagrams or tables detected.",
                into_details(json!({ "found_types": [] })),
            );
        }

        ToolResult::new(
            ToolStatus::Found,
            format!("Visuals detected: {}", found.join(", ")),
            into_details(json!({ "found_types": found })),
        )
    }
}
