//! Shared helper functions for CLI commands.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};

use crate::export::ExportedDocument;
use crate::extract::ExtractionResult;
use crate::models::UploadedDocument;
use crate::session::{Session, SessionError};
use crate::utils::mime::mime_icon;

pub fn success() -> StyledObject<&'static str> {
    style("✓").green()
}

pub fn warning() -> StyledObject<&'static str> {
    style("!").yellow()
}

pub fn error() -> StyledObject<&'static str> {
    style("✗").red()
}

/// Spinner on stderr for a step of unknown length.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Read a document from disk, reporting what was loaded.
pub fn load_document(path: &Path, mime: Option<&str>) -> anyhow::Result<UploadedDocument> {
    let doc = UploadedDocument::from_path(path, mime)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    eprintln!(
        "{} {} {} ({}, {} bytes)",
        style("→").dim(),
        mime_icon(doc.mime_type()),
        doc.filename(),
        doc.mime_type(),
        doc.len()
    );
    Ok(doc)
}

/// Run [`Session::upload`] on the blocking thread pool, handing the session
/// back with the outcome. Extraction shells out to Poppler and Tesseract.
pub async fn upload_blocking(
    mut session: Session,
    doc: UploadedDocument,
) -> anyhow::Result<(Session, Result<ExtractionResult, SessionError>)> {
    tokio::task::spawn_blocking(move || {
        let result = session.upload(doc).cloned();
        (session, result)
    })
    .await
    .context("Extraction task failed")
}

/// Write an exported document; `output` overrides its own file name.
pub fn write_export(doc: &ExportedDocument, output: Option<&Path>) -> anyhow::Result<()> {
    let path = output.unwrap_or_else(|| Path::new(&doc.filename));
    std::fs::write(path, &doc.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!(
        "{} Wrote {} ({} paragraphs)",
        success(),
        path.display(),
        doc.paragraph_count
    );
    Ok(())
}

/// First `max_chars` characters of `text`, marking the cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::extract::{ExtractionMethod, TextExtractor};
    use crate::ocr::{OcrBackendType, OcrConfig, OcrSlot};
    use crate::session::SessionState;

    fn plain_session() -> Session {
        Session::new(
            TextExtractor::default(),
            OcrSlot::for_backend(OcrBackendType::Tesseract, OcrConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_upload_blocking_returns_session() {
        let doc = UploadedDocument::new("notes.txt", "text/plain", b"some notes".to_vec());

        let (session, result) = upload_blocking(plain_session(), doc).await.unwrap();
        let extraction = result.unwrap();
        assert_eq!(extraction.text, "some notes");
        assert_eq!(extraction.method, ExtractionMethod::Direct);
        assert_eq!(session.state(), SessionState::Extracted);
        assert_eq!(session.extracted_text(), "some notes");
    }

    #[tokio::test]
    async fn test_upload_blocking_keeps_session_on_failure() {
        let doc = UploadedDocument::new("data.csv", "text/csv", b"a,b".to_vec());

        let (session, result) = upload_blocking(plain_session(), doc).await.unwrap();
        assert!(result.unwrap_err().is_warning());
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.document().map(|d| d.filename()), Some("data.csv"));
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("héllo world", 5), "héllo…");
    }
}
