//! Shared utilities for OCR backends.
//!
//! Provides common functionality for:
//! - Checking for CLI tool availability
//! - Downloading and locating OCR models (OCRS backend)

// Model helpers are only used when the ocr-ocrs feature is enabled
#![cfg_attr(not(feature = "ocr-ocrs"), allow(dead_code))]

use std::path::{Path, PathBuf};

#[cfg(feature = "ocr-ocrs")]
use super::backend::OcrError;

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Model file specification for downloading.
pub struct ModelSpec {
    /// URL to download from.
    pub url: &'static str,
    /// Filename to save as.
    pub filename: &'static str,
    /// Human-readable size for progress messages.
    pub size_hint: &'static str,
}

/// Configuration for model directory management.
pub struct ModelDirConfig {
    /// Subdirectory name under the docwash data dir (e.g., "ocrs").
    pub subdir: &'static str,
    /// Required model files to check for presence.
    pub required_files: &'static [&'static str],
}

impl ModelDirConfig {
    /// Get the default model directory for this backend.
    pub fn default_dir(&self) -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("docwash")
            .join(self.subdir)
    }

    /// Get standard candidate directories to search for models.
    pub fn candidate_dirs(&self) -> Vec<PathBuf> {
        [
            Some(self.default_dir()),
            dirs::home_dir().map(|d| d.join(format!(".{}", self.subdir)).join("models")),
            Some(PathBuf::from(format!("/usr/share/{}/models", self.subdir))),
            Some(PathBuf::from(format!("./models/{}", self.subdir))),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Find the first directory containing all required files, preferring `explicit`.
    pub fn locate(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .into_iter()
            .chain(self.candidate_dirs())
            .find(|dir| self.has_required_files(dir))
    }

    /// Check if a directory contains all required model files.
    pub fn has_required_files(&self, dir: &Path) -> bool {
        self.required_files
            .iter()
            .all(|file| dir.join(file).exists())
    }
}

/// Download a file from a URL to a local path using curl or wget.
#[cfg(feature = "ocr-ocrs")]
pub fn download_file(url: &str, dest: &Path) -> Result<(), OcrError> {
    use std::process::Command;

    let tools: [(&str, &[&str]); 2] = [("curl", &["-fsSL", "-o"]), ("wget", &["-q", "-O"])];

    for (tool, args) in tools {
        if !check_binary(tool) {
            continue;
        }
        let status = Command::new(tool).args(args).arg(dest).arg(url).status()?;
        if status.success() {
            return Ok(());
        }
        let _ = std::fs::remove_file(dest);
        return Err(OcrError::OcrFailed(format!("Failed to download {}", url)));
    }

    Err(OcrError::BackendNotAvailable(
        "Neither curl nor wget found. Install one to download models.".to_string(),
    ))
}

/// Download a model file if it doesn't exist.
#[cfg(feature = "ocr-ocrs")]
pub fn ensure_model_file(spec: &ModelSpec, model_dir: &Path) -> Result<(), OcrError> {
    let dest = model_dir.join(spec.filename);
    if !dest.exists() {
        tracing::info!("Downloading {} (~{})", spec.filename, spec.size_hint);
        download_file(spec.url, &dest)?;
    }
    Ok(())
}
