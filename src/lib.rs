//! docwash - document text extraction and AI-assisted rewriting.
//!
//! Takes a single uploaded document (plain text, PDF, DOCX or image), extracts
//! its text, sends it to an OpenAI-compatible chat model for a formal rewrite,
//! lets the user refine the result with free-text instructions, and exports
//! the final text as a DOCX file.
//!
//! Text extraction uses:
//! - pdftotext (Poppler) for the PDF text layer
//! - pdftoppm + OCR for scanned PDFs whose text layer is too thin
//! - OCR directly for PNG/JPEG images
//! - docx-rs for Word documents

pub mod cli;
pub mod config;
pub mod export;
pub mod extract;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod rewrite;
pub mod session;
pub mod utils;
