//! Data models for uploaded documents.

mod document;

pub use document::{DocumentKind, UploadedDocument};
