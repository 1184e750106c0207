//! One user's document session.
//!
//! A session walks a single uploaded document through extraction, the
//! baseline rewrite, any number of instruction rewrites or direct edits, and
//! export. Every step is an explicit transition:
//!
//! | trigger             | from                        | to        |
//! |---------------------|-----------------------------|-----------|
//! | `upload`            | any                         | Extracted |
//! | `ensure_baseline`   | Extracted                   | Rewritten |
//! | `apply_instruction` | Rewritten, Edited, Exported | Rewritten |
//! | `edit`              | Rewritten, Edited, Exported | Edited    |
//! | `export`            | Rewritten, Edited, Exported | Exported  |
//! | `reset`             | any                         | Empty     |
//!
//! A failed step leaves state and content as they were, except a failed
//! upload, which leaves the session `Empty`.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::export::{export_docx, ExportConfig, ExportError, ExportedDocument};
use crate::extract::{ExtractionError, ExtractionResult, TextExtractor};
use crate::llm::LlmError;
use crate::models::UploadedDocument;
use crate::ocr::OcrSlot;
use crate::rewrite::{self, RewriteConfig, Rewriter};

/// Where a session is in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Empty,
    Extracted,
    Rewritten,
    Edited,
    Exported,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Extracted => "extracted",
            Self::Rewritten => "rewritten",
            Self::Edited => "edited",
            Self::Exported => "exported",
        }
    }

    /// Whether editable content exists.
    pub fn has_baseline(&self) -> bool {
        matches!(self, Self::Rewritten | Self::Edited | Self::Exported)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Rewrite failed: {0}")]
    Rewrite(#[from] LlmError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Cannot {action} while session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },

    #[error("Instruction is empty")]
    EmptyInstruction,
}

impl SessionError {
    /// Whether this should be shown as a warning instead of an error.
    pub fn is_warning(&self) -> bool {
        match self {
            Self::Extraction(e) => e.is_warning(),
            _ => false,
        }
    }
}

/// A single-document session.
#[derive(Debug)]
pub struct Session {
    extractor: TextExtractor,
    ocr: OcrSlot,
    rewrite: RewriteConfig,
    export: ExportConfig,
    state: SessionState,
    document: Option<UploadedDocument>,
    extraction: Option<ExtractionResult>,
    content: String,
}

impl Session {
    pub fn new(extractor: TextExtractor, ocr: OcrSlot) -> Self {
        Self {
            extractor,
            ocr,
            rewrite: RewriteConfig::default(),
            export: ExportConfig::default(),
            state: SessionState::Empty,
            document: None,
            extraction: None,
            content: String::new(),
        }
    }

    /// Build a session with extractor, OCR engine and settings from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.extraction.extractor(), config.extraction.ocr_slot())
            .with_rewrite_config(config.rewrite.clone())
            .with_export_config(config.export.clone())
    }

    pub fn with_rewrite_config(mut self, config: RewriteConfig) -> Self {
        self.rewrite = config;
        self
    }

    pub fn with_export_config(mut self, config: ExportConfig) -> Self {
        self.export = config;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn document(&self) -> Option<&UploadedDocument> {
        self.document.as_ref()
    }

    pub fn extraction(&self) -> Option<&ExtractionResult> {
        self.extraction.as_ref()
    }

    /// Text produced by extraction; empty when nothing was extracted.
    pub fn extracted_text(&self) -> &str {
        self.extraction
            .as_ref()
            .map(|e| e.text.as_str())
            .unwrap_or_default()
    }

    /// Current editable content; empty until the baseline exists.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn ocr(&self) -> &OcrSlot {
        &self.ocr
    }

    /// Replace the session's document and extract its text.
    ///
    /// Previous content is dropped and the OCR engine released before
    /// extraction starts. On failure the document is kept but the session
    /// stays `Empty`.
    pub fn upload(&mut self, doc: UploadedDocument) -> Result<&ExtractionResult, SessionError> {
        self.reset();
        info!("Uploaded {} ({})", doc.filename(), doc.mime_type());

        let result = self.extractor.extract(&doc, &mut self.ocr);
        self.document = Some(doc);

        match result {
            Ok(extraction) => {
                info!(
                    "Extracted {} chars via {}",
                    extraction.char_count(),
                    extraction.method
                );
                self.state = SessionState::Extracted;
                Ok(&*self.extraction.insert(extraction))
            }
            Err(e) => {
                if e.is_warning() {
                    warn!("{}", e);
                }
                Err(e.into())
            }
        }
    }

    /// Compute the baseline rewrite if it has not been computed yet.
    ///
    /// Returns `Ok(true)` when a remote call was made. Outside `Extracted`,
    /// or with nothing extracted, this is a no-op returning `Ok(false)`.
    pub async fn ensure_baseline(&mut self, rewriter: &dyn Rewriter) -> Result<bool, SessionError> {
        if self.state != SessionState::Extracted || self.extracted_text().trim().is_empty() {
            return Ok(false);
        }

        let content = rewrite::baseline(rewriter, &self.rewrite, self.extracted_text()).await?;
        self.content = content;
        self.state = SessionState::Rewritten;
        Ok(true)
    }

    /// Rewrite the current content according to `instructions`.
    pub async fn apply_instruction(
        &mut self,
        rewriter: &dyn Rewriter,
        instructions: &str,
    ) -> Result<(), SessionError> {
        let instructions = instructions.trim();
        if instructions.is_empty() {
            return Err(SessionError::EmptyInstruction);
        }
        self.require_baseline("apply instructions")?;

        let content = rewrite::refine(rewriter, &self.rewrite, &self.content, instructions).await?;
        self.content = content;
        self.state = SessionState::Rewritten;
        Ok(())
    }

    /// Replace the content with the user's own text.
    pub fn edit(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.require_baseline("edit")?;
        self.content = text.into();
        self.state = SessionState::Edited;
        Ok(())
    }

    /// Render the current content as a DOCX document.
    pub fn export(&mut self) -> Result<ExportedDocument, SessionError> {
        self.require_baseline("export")?;
        if self.rewrite.strip_markers(&self.content).trim().is_empty() {
            return Err(ExportError::NothingToExport.into());
        }

        let exported = export_docx(&self.content, &self.rewrite.strip_chars, &self.export)?;
        info!(
            "Exported {} paragraphs to {}",
            exported.paragraph_count, exported.filename
        );
        self.state = SessionState::Exported;
        Ok(exported)
    }

    /// Forget the document and everything derived from it.
    pub fn reset(&mut self) {
        self.ocr.release();
        self.document = None;
        self.extraction = None;
        self.content.clear();
        self.state = SessionState::Empty;
    }

    fn require_baseline(&self, action: &'static str) -> Result<(), SessionError> {
        if self.state.has_baseline() {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }
}
