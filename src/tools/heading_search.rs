//! Section heading search.

use serde_json::json;

use super::{AnalysisTool, ToolId, into_details};
use crate::core::{Document, ToolResult, ToolStatus};

/// Number of leading content lines scanned when metadata has no sections.
const SCAN_LINES: usize = 100;

/// Finds the document's section headings.
///
/// Uses the extractor's `metadata.sections` when present; otherwise scans
/// the first lines of content for ALL-CAPS headings.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingSearch;

impl AnalysisTool for HeadingSearch {
    fn id(&self) -> ToolId {
        ToolId::HeadingSearch
    }

    fn description(&self) -> &'static str {
        "Search for specific sections/headings in the document"
    }

    fn run(&self, document: &Document) -> ToolResult {
        let sections = if document.sections().is_empty() {
            scan_caps_headings(&document.content)
        } else {
            document.sections().to_vec()
        };

        if sections.is_empty() {
            return ToolResult::new(
                ToolStatus::NotFound,
                "No clear sections/headings found",
                into_details(json!({ "sections": [], "count": 0 })),
            );
        }

        let count = sections.len();
        ToolResult::new(
            ToolStatus::Found,
            format!("Found {count} sections/headings"),
            into_details(json!({ "sections": sections, "count": count })),
        )
    }
}

/// Collects ALL-CAPS lines of 6 to 99 characters from the head of `content`.
fn scan_caps_headings(content: &str) -> Vec<String> {
    content
        .split('\n')
        .take(SCAN_LINES)
        .map(str::trim)
        .filter(|line| {
            let len = line.chars().count();
            len > 5 && len < 100 && is_all_caps(line)
        })
        .map(ToString::to_string)
        .collect()
}

/// `true` when the text has at least one cased character and no lowercase ones.
pub(crate) fn is_all_caps(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_metadata_sections() {
        let doc = Document::new(
            "body",
            "md",
            vec!["Introduction".to_string(), "Conclusion".to_string()],
        );
        let result = HeadingSearch.run(&doc);
        assert_eq!(result.status, ToolStatus::Found);
        assert_eq!(result.summary, "Found 2 sections/headings");
        assert_eq!(result.detail_strings("sections"), vec!["Introduction", "Conclusion"]);
        assert_eq!(result.details.get("count"), Some(&json!(2)));
    }

    #[test]
    fn test_scans_caps_lines_when_metadata_empty() {
        let doc = Document::new(
            "EXECUTIVE OVERVIEW\nsome prose here\nRESULTS 2024\nTOC\n",
            "txt",
            Vec::new(),
        );
        let result = HeadingSearch.run(&doc);
        assert_eq!(result.status, ToolStatus::Found);
        // "TOC" is too short to count as a heading.
        assert_eq!(
            result.detail_strings("sections"),
            vec!["EXECUTIVE OVERVIEW", "RESULTS 2024"]
        );
    }

    #[test]
    fn test_not_found_keeps_details() {
        let doc = Document::new("nothing to see here", "txt", Vec::new());
        let result = HeadingSearch.run(&doc);
        assert_eq!(result.status, ToolStatus::NotFound);
        assert_eq!(result.summary, "No clear sections/headings found");
        assert_eq!(result.details.get("count"), Some(&json!(0)));
    }

    #[test]
    fn test_is_all_caps() {
        assert!(is_all_caps("SECTION 1"));
        assert!(!is_all_caps("Section 1"));
        assert!(!is_all_caps("1234 ---"));
    }
}
