//! File loading and writing.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::sections::extract_sections;
use crate::core::{Document, DocumentMetadata};
use crate::error::DocumentError;

/// Reads a UTF-8 file to a string.
///
/// # Errors
///
/// Returns [`DocumentError::NotFound`] if the path does not exist and
/// [`DocumentError::Io`] if reading fails.
pub fn read_file(path: &Path) -> Result<String, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(fs::read_to_string(path)?)
}

/// Writes `content` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`DocumentError::Io`] if a directory or the file cannot be written.
pub fn write_file(path: &Path, content: &str) -> Result<(), DocumentError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Loads a document from disk.
///
/// `.txt` and `.md` files are read as text and their headings extracted.
/// `.json` files are parsed as an already-extracted document handle, the
/// output of an external PDF or DOCX extractor.
///
/// # Errors
///
/// Returns [`DocumentError::UnsupportedFormat`] for any other extension,
/// and propagates read and JSON parse failures.
pub fn load_document(path: &Path) -> Result<Document, DocumentError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let document = match extension.as_str() {
        "txt" | "md" => load_text(path, &extension)?,
        "json" => load_json(path)?,
        _ => return Err(DocumentError::UnsupportedFormat { extension }),
    };

    debug!(
        path = %path.display(),
        file_type = document.format(),
        sections = document.sections().len(),
        "Loaded document"
    );
    Ok(document)
}

fn load_text(path: &Path, extension: &str) -> Result<Document, DocumentError> {
    let content = read_file(path)?;
    let file_size = fs::metadata(path)?.len();
    let metadata = DocumentMetadata {
        sections: extract_sections(&content),
        file_type: extension.to_string(),
        filename: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        num_lines: content.split('\n').count() as u64,
        file_size,
        ..DocumentMetadata::default()
    };
    Ok(Document {
        content,
        file_type: extension.to_string(),
        file_path: Some(path.to_path_buf()),
        metadata,
    })
}

fn load_json(path: &Path) -> Result<Document, DocumentError> {
    let raw = read_file(path)?;
    let mut document: Document = serde_json::from_str(&raw)?;
    if document.file_path.is_none() {
        document.file_path = Some(path.to_path_buf());
    }
    Ok(document)
}
