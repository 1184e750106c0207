//! DOCX export of the final content.

use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::rewrite::strip_markers;
use crate::utils::mime::DOCX_MIME;

/// Default name of the exported file.
pub const DEFAULT_EXPORT_FILENAME: &str = "Enhanced_Content.docx";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export")]
    NothingToExport,

    #[error("Failed to write DOCX: {0}")]
    Pack(String),
}

/// Export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// File name offered for the exported document
    #[serde(default = "default_filename")]
    pub filename: String,
}

fn default_filename() -> String {
    DEFAULT_EXPORT_FILENAME.to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename: default_filename(),
        }
    }
}

/// An in-memory DOCX file.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub paragraph_count: usize,
}

/// Split content into paragraphs on blank lines.
///
/// Only the literal `"\n\n"` boundary separates paragraphs; parts are trimmed
/// and empty ones dropped.
pub fn split_paragraphs(content: &str) -> Vec<&str> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Build a DOCX document from `content`, one paragraph per blank-line block.
///
/// Blank content yields a valid document with no paragraphs; refusing to
/// export nothing is the session's call.
pub fn export_docx(
    content: &str,
    strip_chars: &[char],
    config: &ExportConfig,
) -> Result<ExportedDocument, ExportError> {
    let cleaned = strip_markers(content, strip_chars);
    let paragraphs = split_paragraphs(&cleaned);
    let docx = paragraphs
        .iter()
        .fold(Docx::new(), |docx, text| docx.add_paragraph(paragraph(text)));

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ExportError::Pack(e.to_string()))?;

    debug!(
        "Packed {} paragraphs into {}",
        paragraphs.len(),
        config.filename
    );
    Ok(ExportedDocument {
        filename: config.filename.clone(),
        mime_type: DOCX_MIME.to_string(),
        bytes: buf.into_inner(),
        paragraph_count: paragraphs.len(),
    })
}

/// One DOCX paragraph; single newlines inside it become line breaks.
fn paragraph(text: &str) -> Paragraph {
    let mut run = Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    Paragraph::new().add_run(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::docx_paragraphs;

    #[test]
    fn test_two_paragraphs_in_order() {
        let doc = export_docx("Para one.\n\nPara two.", &['*'], &ExportConfig::default()).unwrap();

        assert_eq!(doc.paragraph_count, 2);
        assert_eq!(doc.filename, "Enhanced_Content.docx");
        assert_eq!(doc.mime_type, DOCX_MIME);
        assert_eq!(docx_paragraphs(&doc.bytes).unwrap(), vec!["Para one.", "Para two."]);
    }

    #[test]
    fn test_markers_stripped_and_single_newlines_kept() {
        let doc = export_docx(
            "**Heading**\n\n  line a\nline b  \n\n\n\n*end*",
            &['*'],
            &ExportConfig::default(),
        )
        .unwrap();

        assert_eq!(
            docx_paragraphs(&doc.bytes).unwrap(),
            vec!["Heading", "line a\nline b", "end"]
        );
    }

    #[test]
    fn test_split_paragraphs_blank_parts() {
        assert!(split_paragraphs("\n\n \n\n\t").is_empty());
        assert_eq!(split_paragraphs("a\n\n\n\nb"), vec!["a", "b"]);
    }

    #[test]
    fn test_blank_content_has_no_paragraphs() {
        let doc = export_docx("\n\n  \n\n", &['*'], &ExportConfig::default()).unwrap();
        assert_eq!(doc.paragraph_count, 0);
        assert!(docx_paragraphs(&doc.bytes).unwrap().is_empty());

        let doc = export_docx("***", &['*'], &ExportConfig::default()).unwrap();
        assert_eq!(doc.paragraph_count, 0);
    }

    #[test]
    fn test_custom_filename() {
        let config = ExportConfig {
            filename: "out.docx".to_string(),
        };
        assert_eq!(export_docx("x", &[], &config).unwrap().filename, "out.docx");
    }
}
