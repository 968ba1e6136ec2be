//! Heading detection for plain text and markdown.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::tools::heading_search::is_all_caps;

/// Maximum number of sections reported for one document.
pub const MAX_SECTIONS: usize = 20;

/// Lines shorter than this that mention a section keyword count as headings.
const MAX_HEADING_LEN: usize = 100;

const SECTION_KEYWORDS: [&str; 8] = [
    "overview",
    "introduction",
    "abstract",
    "summary",
    "methodology",
    "results",
    "conclusion",
    "references",
];

static MARKDOWN_HEADING: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^#+[ \t]+(.+?)[ \t]*$").ok());

/// Extracts likely section headings from text.
///
/// Three passes, in order: ALL-CAPS lines, markdown `#` headings, and
/// short non-markdown lines mentioning a common section keyword. Results are
/// de-duplicated case-insensitively, keep first-seen order and are
/// capped at [`MAX_SECTIONS`].
#[must_use]
pub fn extract_sections(text: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    for line in text.lines().map(str::trim) {
        let len = line.chars().count();
        if len > 3 && len < MAX_HEADING_LEN && is_all_caps(line) {
            candidates.push(line.to_string());
        }
    }

    if let Some(re) = MARKDOWN_HEADING.as_ref() {
        candidates.extend(
            re.captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
        );
    }

    for line in text.lines().map(str::trim) {
        if line.starts_with('#') {
            continue;
        }
        let lower = line.to_lowercase();
        if line.chars().count() < MAX_HEADING_LEN
            && SECTION_KEYWORDS.iter().any(|kw| lower.contains(kw))
        {
            candidates.push(line.to_string());
        }
    }

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(MAX_SECTIONS)
        .collect()
}
