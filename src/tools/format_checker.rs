//! Document format and structure validation.
//!
//! Runs a fixed battery of checks and sorts each outcome into one of three
//! buckets: validations (passed), warnings and errors. The bucket sizes
//! decide the status and the completeness score.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value, json};

use super::{AnalysisTool, ToolId, into_details};
use crate::core::{Document, ToolResult, ToolStatus};

/// Required section categories with the keywords that satisfy them, in
/// the order a well-structured document presents them.
const REQUIRED_SECTIONS: [(&str, &[&str]); 5] = [
    ("overview", &["overview", "executive summary", "abstract"]),
    ("introduction", &["introduction", "background"]),
    ("methodology", &["methodology", "approach", "methods", "implementation"]),
    ("results", &["results", "findings", "outcomes"]),
    ("conclusion", &["conclusion", "summary", "closing"]),
];

/// Placeholder markers that indicate unfinished text.
const PLACEHOLDERS: [&str; 6] = ["lorem ipsum", "todo", "tbd", "xxx", "[insert", "placeholder"];

/// Headings outside this character range count as inconsistent.
const HEADING_LEN_RANGE: std::ops::RangeInclusive<usize> = 10..=100;

static NUMBERED_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.").unwrap_or_else(|_| unreachable!()));

/// Validates document structure, required sections and formatting.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatChecker;

/// Accumulates check outcomes.
#[derive(Debug, Default)]
struct Findings {
    validations: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl Findings {
    fn pass(&mut self, msg: impl Into<String>) {
        self.validations.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn fail(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn total(&self) -> usize {
        self.validations.len() + self.warnings.len() + self.errors.len()
    }
}

impl AnalysisTool for FormatChecker {
    fn id(&self) -> ToolId {
        ToolId::FormatChecker
    }

    fn description(&self) -> &'static str {
        "Check document format, structure, and completeness"
    }

    #[allow(clippy::cast_precision_loss)]
    fn run(&self, document: &Document) -> ToolResult {
        let content = &document.content;
        let sections = document.sections();
        let file_type = document.format();
        let mut f = Findings::default();

        let word_count = content.split_whitespace().count();
        check_length(&mut f, word_count);
        check_section_count(&mut f, sections.len());

        let sections_lower: Vec<String> = sections.iter().map(|s| s.to_lowercase()).collect();
        let required_found = check_required_sections(&mut f, &sections_lower);
        check_section_order(&mut f, &sections_lower);
        check_heading_style(&mut f, sections);
        check_file_type(&mut f, document, file_type);
        check_content_quality(&mut f, content);

        let total_checks = f.total();
        let completeness = if total_checks > 0 {
            f.validations.len() as f64 / total_checks as f64 * 100.0
        } else {
            0.0
        };

        let (status, summary) = if !f.errors.is_empty() {
            (
                ToolStatus::Invalid,
                format!(
                    "Format validation failed: {} error(s), {} warning(s)",
                    f.errors.len(),
                    f.warnings.len()
                ),
            )
        } else if f.warnings.len() > 3 {
            (
                ToolStatus::NeedsImprovement,
                format!(
                    "Format acceptable but has {} warning(s) - completeness: {completeness:.0}%",
                    f.warnings.len()
                ),
            )
        } else {
            (
                ToolStatus::Valid,
                format!("Format validation passed - completeness: {completeness:.0}%"),
            )
        };

        ToolResult::new(
            status,
            summary,
            into_details(json!({
                "validations": f.validations,
                "warnings": f.warnings,
                "errors": f.errors,
                "file_type": file_type,
                "word_count": word_count,
                "section_count": sections.len(),
                "required_sections_found": Value::Object(required_found),
                "completeness_score": (completeness * 10.0).round() / 10.0,
                "total_checks": total_checks,
            })),
        )
    }
}

fn check_length(f: &mut Findings, word_count: usize) {
    if word_count < 50 {
        f.fail(format!("Document is too short ({word_count} words)"));
    } else if word_count < 200 {
        f.warn(format!("Document is relatively short ({word_count} words)"));
    } else {
        f.pass(format!("Document has sufficient content ({word_count} words)"));
    }
}

fn check_section_count(f: &mut Findings, count: usize) {
    if count == 0 {
        f.fail("No clear document structure/sections found");
    } else if count < 3 {
        f.warn(format!(
            "Only {count} sections found - document may lack structure"
        ));
    } else {
        f.pass(format!("Document has {count} sections/headings"));
    }
}

fn check_required_sections(f: &mut Findings, sections_lower: &[String]) -> Map<String, Value> {
    let mut found_required = Map::new();
    for (category, keywords) in REQUIRED_SECTIONS {
        let found = keywords
            .iter()
            .any(|kw| sections_lower.iter().any(|s| s.contains(kw)));
        if found {
            f.pass(format!("Found {category} section"));
        } else {
            f.warn(format!("Missing {category} section"));
        }
        found_required.insert(category.to_string(), Value::Bool(found));
    }
    found_required
}

/// Each section is assigned the first category whose keywords it contains;
/// a later section of the same category moves that category's position.
fn check_section_order(f: &mut Findings, sections_lower: &[String]) {
    let mut positions: [Option<usize>; REQUIRED_SECTIONS.len()] = [None; REQUIRED_SECTIONS.len()];
    for (i, section) in sections_lower.iter().enumerate() {
        if let Some(cat) = REQUIRED_SECTIONS
            .iter()
            .position(|(_, kws)| kws.iter().any(|kw| section.contains(kw)))
        {
            positions[cat] = Some(i);
        }
    }

    let ordered: Vec<usize> = positions.iter().flatten().copied().collect();
    if ordered.len() >= 2 {
        if ordered.windows(2).all(|w| w[0] <= w[1]) {
            f.pass("Sections follow logical order");
        } else {
            f.warn("Sections may not be in standard order");
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn check_heading_style(f: &mut Findings, sections: &[String]) {
    if !sections.is_empty() {
        if sections
            .iter()
            .all(|s| HEADING_LEN_RANGE.contains(&s.chars().count()))
        {
            f.pass("Heading lengths are consistent");
        } else {
            f.warn("Some headings are unusually long or short");
        }
    }

    let numbered = sections
        .iter()
        .filter(|s| NUMBERED_SECTION.is_match(s.trim()))
        .count();
    if numbered as f64 > sections.len() as f64 / 2.0 {
        f.pass("Document uses numbered sections");
    }
}

fn check_file_type(f: &mut Findings, document: &Document, file_type: &str) {
    let meta = &document.metadata;
    match file_type {
        "pdf" => match meta.num_pages {
            0 => f.fail("PDF has no pages"),
            1 => f.warn("PDF has only 1 page - may be incomplete"),
            n => f.pass(format!("PDF has {n} pages")),
        },
        "docx" => {
            if meta.num_tables > 0 {
                f.pass(format!("Document contains {} table(s)", meta.num_tables));
            }
            if meta.num_images > 0 {
                f.pass(format!("Document contains {} image(s)", meta.num_images));
            }
            if meta.num_paragraphs < 5 {
                f.warn("Document has very few paragraphs");
            } else {
                f.pass(format!("Document has {} paragraphs", meta.num_paragraphs));
            }
        }
        _ => {}
    }
}

fn check_content_quality(f: &mut Findings, content: &str) {
    let lower = content.to_lowercase();
    let placeholders: Vec<&str> = PLACEHOLDERS
        .iter()
        .copied()
        .filter(|p| lower.contains(p))
        .collect();
    if !placeholders.is_empty() {
        f.warn(format!("Found placeholder text: {}", placeholders.join(", ")));
    }

    let empty_sections = content.matches("\n\n\n\n").count();
    if empty_sections > 3 {
        f.warn(format!(
            "Document has {empty_sections} potentially empty sections"
        ));
    }
}
