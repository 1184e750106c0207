//! Uploaded document model.
//!
//! An upload is immutable once received: the raw bytes, the declared MIME
//! type and the original filename. The declared type decides which
//! extraction path runs.

use std::path::Path;

use image::ImageFormat;

use crate::utils::mime::{detect_mime_type, DOCX_MIME};

/// How the extraction dispatcher treats a declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    Docx,
    Image(ImageFormat),
    Unsupported,
}

impl DocumentKind {
    /// Classify a declared MIME type. Parameters such as `; charset=utf-8`
    /// are ignored.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/plain" => Self::PlainText,
            "application/pdf" => Self::Pdf,
            DOCX_MIME => Self::Docx,
            "image/png" => Self::Image(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Self::Image(ImageFormat::Jpeg),
            _ => Self::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Image(_) => "image",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file handed to the tool, with its declared type.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    filename: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a document from disk.
    ///
    /// The declared type is `mime_override` when given, otherwise guessed
    /// from the file name and then from the content.
    pub fn from_path(path: &Path, mime_override: Option<&str>) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime_type = match mime_override {
            Some(mime) => mime.to_string(),
            None => detect_mime_type(path, &bytes),
        };
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(filename, mime_type, bytes))
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_mime(&self.mime_type)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
