//! Parsed document handle consumed by the agent and its tools.
//!
//! The agent never parses raw files. A document provider (see
//! [`crate::io`]) or an external extractor produces this shape; it is
//! read-only for the duration of a run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A parsed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Extracted plain text.
    #[serde(default)]
    pub content: String,
    /// Source format (`txt`, `md`, `pdf`, `docx`, ...).
    #[serde(default)]
    pub file_type: String,
    /// Path the document was loaded from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    /// Structural metadata detected by the extractor.
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

/// Structural metadata attached to a [`Document`].
///
/// Counters default to zero when the extractor did not report them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Detected section headings, in document order.
    #[serde(default)]
    pub sections: Vec<String>,
    /// Source format as reported by the extractor.
    #[serde(default)]
    pub file_type: String,
    /// File name without directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Page count (paged formats).
    #[serde(default)]
    pub num_pages: u64,
    /// Embedded image count.
    #[serde(default)]
    pub num_images: u64,
    /// Table count.
    #[serde(default)]
    pub num_tables: u64,
    /// Paragraph count (word-processor formats).
    #[serde(default)]
    pub num_paragraphs: u64,
    /// Line count (text formats).
    #[serde(default)]
    pub num_lines: u64,
    /// Whether pages contain dense line/rectangle drawings.
    #[serde(default)]
    pub has_vector_graphics: bool,
    /// File size in bytes.
    #[serde(default)]
    pub file_size: u64,
    /// Extractor-specific fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Creates a document from text content and detected sections.
    pub fn new(content: impl Into<String>, file_type: impl Into<String>, sections: Vec<String>) -> Self {
        let file_type = file_type.into();
        Self {
            content: content.into(),
            file_type: file_type.clone(),
            file_path: None,
            metadata: DocumentMetadata {
                sections,
                file_type,
                ..DocumentMetadata::default()
            },
        }
    }

    /// Returns the document format, preferring the top-level field and
    /// falling back to the metadata copy. Empty when neither is set.
    #[must_use]
    pub fn format(&self) -> &str {
        if self.file_type.is_empty() {
            &self.metadata.file_type
        } else {
            &self.file_type
        }
    }

    /// Returns the detected section headings.
    #[must_use]
    pub fn sections(&self) -> &[String] {
        &self.metadata.sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_both_file_types() {
        let doc = Document::new("text", "md", vec!["Intro".to_string()]);
        assert_eq!(doc.file_type, "md");
        assert_eq!(doc.metadata.file_type, "md");
        assert_eq!(doc.sections(), ["Intro".to_string()]);
    }

    #[test]
    fn test_format_falls_back_to_metadata() {
        let mut doc = Document::new("", "pdf", Vec::new());
        doc.file_type.clear();
        assert_eq!(doc.format(), "pdf");
    }

    #[test]
    fn test_deserialize_external_handle() {
        let json = r#"{
            "content": "Figure 1 shows the flow",
            "file_type": "pdf",
            "metadata": {
                "sections": ["Overview", "Results"],
                "file_type": "pdf",
                "num_pages": 4,
                "num_images": 2,
                "producer": "extractor-x"
            }
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap_or_default();
        assert_eq!(doc.metadata.num_pages, 4);
        assert_eq!(doc.metadata.num_images, 2);
        assert_eq!(doc.metadata.num_tables, 0);
        assert_eq!(doc.sections().len(), 2);
        assert_eq!(
            doc.metadata.extra.get("producer").and_then(Value::as_str),
            Some("extractor-x")
        );
    }
}
