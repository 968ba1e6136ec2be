//! Result record returned by every analysis tool.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome classification reported by a tool.
///
/// Each tool uses the subset that fits it: `heading_search` and
/// `diagram_checker` report `Found`/`NotFound`, `format_checker` reports
/// `Valid`/`Invalid`/`NeedsImprovement`, `summarizer` reports
/// `Success`/`Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// The searched-for element exists.
    Found,
    /// The searched-for element is absent.
    NotFound,
    /// Validation passed.
    Valid,
    /// Validation failed with errors.
    Invalid,
    /// Validation passed with many warnings.
    NeedsImprovement,
    /// The tool produced its output.
    Success,
    /// The tool could not run against this document.
    Error,
}

impl ToolStatus {
    /// Parses a status string (case-insensitive). Unknown values map to `Error`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "found" => Self::Found,
            "not_found" => Self::NotFound,
            "valid" => Self::Valid,
            "invalid" => Self::Invalid,
            "needs_improvement" => Self::NeedsImprovement,
            "success" => Self::Success,
            _ => Self::Error,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::NeedsImprovement => "needs_improvement",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value returned by every tool.
///
/// `summary` and `details` are mandatory: the executor, the synthesizer
/// and the fallback answer builder read both without checking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool-defined outcome.
    pub status: ToolStatus,
    /// One-line human-readable summary.
    pub summary: String,
    /// Structured findings.
    pub details: Map<String, Value>,
}

impl ToolResult {
    /// Creates a result.
    pub fn new(status: ToolStatus, summary: impl Into<String>, details: Map<String, Value>) -> Self {
        Self {
            status,
            summary: summary.into(),
            details,
        }
    }

    /// Returns the string entries of an array-valued detail.
    ///
    /// Missing keys and non-string entries are skipped.
    #[must_use]
    pub fn detail_strings(&self, key: &str) -> Vec<&str> {
        self.details
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [
            ToolStatus::Found,
            ToolStatus::NotFound,
            ToolStatus::Valid,
            ToolStatus::Invalid,
            ToolStatus::NeedsImprovement,
            ToolStatus::Success,
            ToolStatus::Error,
        ] {
            assert_eq!(ToolStatus::parse(status.as_str()), status);
        }
        assert_eq!(ToolStatus::parse("NOT_FOUND"), ToolStatus::NotFound);
        assert_eq!(ToolStatus::parse("bogus"), ToolStatus::Error);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ToolStatus::NeedsImprovement).unwrap_or_default();
        assert_eq!(json, "\"needs_improvement\"");
    }

    #[test]
    fn test_detail_strings() {
        let mut details = Map::new();
        details.insert("sections".to_string(), json!(["Overview", 3, "Conclusion"]));
        let result = ToolResult::new(ToolStatus::Found, "Found 2 sections/headings", details);
        assert_eq!(result.detail_strings("sections"), vec!["Overview", "Conclusion"]);
        assert!(result.detail_strings("missing").is_empty());
    }

    #[test]
    fn test_result_requires_summary_and_details() {
        let parsed = serde_json::from_str::<ToolResult>(r#"{"status": "found"}"#);
        assert!(parsed.is_err());
    }
}
