//! OCR engines.
//!
//! Recognizes text in decoded raster images using:
//! - Tesseract OCR via the command line (default)
//! - OCRS for pure-Rust OCR (feature: ocr-ocrs)
//!
//! Engines are heavyweight, so callers hold them through an [`OcrSlot`],
//! which builds one on first use and drops it when the owning scope resets.

mod backend;
mod model_utils;
mod slot;
mod tesseract;
pub mod text;

#[cfg(feature = "ocr-ocrs")]
mod ocrs_backend;

pub use backend::{create_backend, OcrBackend, OcrBackendType, OcrConfig, OcrError, OcrResult};
pub use model_utils::check_binary;
pub use slot::OcrSlot;
pub use tesseract::TesseractBackend;

#[cfg(feature = "ocr-ocrs")]
pub use ocrs_backend::OcrsBackend;
