//! Analysis tools and the registry the executor dispatches through.
//!
//! Every tool is a pure function of the document: it reads
//! [`Document`] and returns a [`ToolResult`], encoding its own failures
//! as [`ToolStatus::Error`](crate::core::ToolStatus::Error) instead of
//! propagating them.

pub mod diagram_checker;
pub mod format_checker;
pub mod heading_search;
pub mod summarizer;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::{Document, ToolResult};

pub use diagram_checker::DiagramChecker;
pub use format_checker::FormatChecker;
pub use heading_search::HeadingSearch;
pub use summarizer::Summarizer;

/// Identifier of an analysis tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    /// Locates section headings.
    HeadingSearch,
    /// Validates structure, required sections and formatting.
    FormatChecker,
    /// Detects diagrams, figures, charts and tables.
    DiagramChecker,
    /// Produces a structural summary and content preview.
    Summarizer,
}

impl ToolId {
    /// All tool identifiers, in the order they are presented to the planner.
    pub const ALL: [Self; 4] = [
        Self::HeadingSearch,
        Self::FormatChecker,
        Self::DiagramChecker,
        Self::Summarizer,
    ];

    /// Parses a tool name. Matching is exact; planners must emit the
    /// canonical snake-case names.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "heading_search" => Some(Self::HeadingSearch),
            "format_checker" => Some(Self::FormatChecker),
            "diagram_checker" => Some(Self::DiagramChecker),
            "summarizer" => Some(Self::Summarizer),
            _ => None,
        }
    }

    /// Returns the canonical tool name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HeadingSearch => "heading_search",
            Self::FormatChecker => "format_checker",
            Self::DiagramChecker => "diagram_checker",
            Self::Summarizer => "summarizer",
        }
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document analysis tool.
pub trait AnalysisTool: Send + Sync {
    /// Identifier this tool is registered under.
    fn id(&self) -> ToolId;

    /// One-line description shown to the planner and in `docent tools`.
    fn description(&self) -> &'static str;

    /// Runs the tool against a document. Must not panic.
    fn run(&self, document: &Document) -> ToolResult;
}

/// Lookup failure for a planned tool name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tool: {name}")]
pub struct UnknownTool {
    /// The name that could not be resolved.
    pub name: String,
}

/// Closed mapping from [`ToolId`] to an implementation.
///
/// Built once at startup; planned action names are resolved through
/// [`ToolRegistry::resolve`].
pub struct ToolRegistry {
    tools: HashMap<ToolId, Box<dyn AnalysisTool>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Creates a registry holding the four standard tools.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(HeadingSearch);
        registry.register(FormatChecker);
        registry.register(DiagramChecker);
        registry.register(Summarizer);
        registry
    }

    /// Registers a tool under its own identifier, replacing any previous one.
    pub fn register<T: AnalysisTool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.id(), Box::new(tool));
    }

    /// Returns the tool registered for `id`.
    #[must_use]
    pub fn get(&self, id: ToolId) -> Option<&dyn AnalysisTool> {
        self.tools.get(&id).map(AsRef::as_ref)
    }

    /// Resolves a planned action name to a registered tool.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownTool`] when the name is not a known identifier or
    /// no implementation is registered for it.
    pub fn resolve(&self, name: &str) -> Result<&dyn AnalysisTool, UnknownTool> {
        ToolId::parse(name)
            .and_then(|id| self.get(id))
            .ok_or_else(|| UnknownTool {
                name: name.to_string(),
            })
    }

    /// Registered tools in planner order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn AnalysisTool> {
        ToolId::ALL.into_iter().filter_map(|id| self.get(id))
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.iter().map(|t| t.id()).collect::<Vec<_>>())
            .finish()
    }
}

/// Converts a `json!` object literal into a details map.
pub(crate) fn into_details(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolStatus;

    struct Canned;

    impl AnalysisTool for Canned {
        fn id(&self) -> ToolId {
            ToolId::Summarizer
        }

        fn description(&self) -> &'static str {
            "canned"
        }

        fn run(&self, _document: &Document) -> ToolResult {
            ToolResult::new(ToolStatus::Success, "canned summary", Map::new())
        }
    }

    #[test]
    fn test_tool_id_parse_roundtrip() {
        for id in ToolId::ALL {
            assert_eq!(ToolId::parse(id.as_str()), Some(id));
        }
        assert_eq!(ToolId::parse("Heading_Search"), None);
        assert_eq!(ToolId::parse("spell_checker"), None);
    }

    #[test]
    fn test_standard_registry_has_all_tools() {
        let registry = ToolRegistry::standard();
        assert_eq!(registry.len(), 4);
        let ids: Vec<ToolId> = registry.iter().map(|t| t.id()).collect();
        assert_eq!(ids, ToolId::ALL.to_vec());
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = ToolRegistry::standard();
        let err = registry.resolve("spell_checker").err();
        assert_eq!(
            err.map(|e| e.to_string()),
            Some("Unknown tool: spell_checker".to_string())
        );
    }

    #[test]
    fn test_resolve_known_but_unregistered() {
        let registry = ToolRegistry::empty();
        assert!(registry.resolve("summarizer").is_err());
    }

    #[test]
    fn test_register_replaces_implementation() {
        let mut registry = ToolRegistry::standard();
        registry.register(Canned);
        let tool = registry
            .resolve("summarizer")
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(tool.description(), "canned");
        assert_eq!(registry.len(), 4);
    }
}
