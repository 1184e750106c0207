//! OCR backend abstraction.
//!
//! Supports multiple OCR backends:
//! - Tesseract: Traditional OCR via command-line (CPU)
//! - Ocrs: Pure Rust OCR engine (CPU, feature `ocr-ocrs`)
//!
//! Backends receive an already-decoded RGB pixel buffer. Decoding uploads and
//! rasterizing PDF pages happens in the extraction layer.

use std::path::PathBuf;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(String),
}

/// Result of OCR processing.
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Raw recognized text, as the engine produced it.
    pub text: String,
    /// Confidence score (0.0 - 1.0), if available.
    pub confidence: Option<f32>,
    /// Which backend produced this result.
    pub backend: OcrBackendType,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Available OCR backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendType {
    /// Tesseract OCR via command-line.
    #[default]
    Tesseract,
    /// Pure Rust OCR engine (ocrs crate).
    Ocrs,
}

impl OcrBackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrBackendType::Tesseract => "tesseract",
            OcrBackendType::Ocrs => "ocrs",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tesseract" => Some(OcrBackendType::Tesseract),
            "ocrs" => Some(OcrBackendType::Ocrs),
            _ => None,
        }
    }
}

impl std::fmt::Display for OcrBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for OCR backends.
pub trait OcrBackend: Send + Sync {
    /// Get the backend type.
    fn backend_type(&self) -> OcrBackendType;

    /// Check if this backend is available (dependencies installed, models present).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Recognize text in an RGB image.
    fn recognize(&self, image: &RgbImage) -> Result<OcrResult, OcrError>;
}

/// Configuration for OCR backends.
///
/// Recognition is English-only and CPU-only; `language` exists so the
/// Tesseract traineddata name is not hard-coded in several places.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Language for OCR (Tesseract naming, e.g. "eng").
    pub language: String,
    /// Path to model files (for backends that need them).
    pub model_path: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            model_path: None,
        }
    }
}

/// Construct a backend of the requested type.
///
/// This is where engine initialization happens (model loading for OCRS), so
/// errors here are initialization failures.
pub fn create_backend(
    backend_type: OcrBackendType,
    config: &OcrConfig,
) -> Result<Box<dyn OcrBackend>, OcrError> {
    match backend_type {
        OcrBackendType::Tesseract => Ok(Box::new(super::TesseractBackend::with_config(
            config.clone(),
        ))),
        #[cfg(feature = "ocr-ocrs")]
        OcrBackendType::Ocrs => Ok(Box::new(super::OcrsBackend::try_new(config.clone())?)),
        #[cfg(not(feature = "ocr-ocrs"))]
        OcrBackendType::Ocrs => Err(OcrError::BackendNotAvailable(
            "OCRS support not compiled in (rebuild with --features ocr-ocrs)".to_string(),
        )),
    }
}
