//! Configuration management for docwash using the prefer crate.
//!
//! Config files are discovered by prefer (`docwash.toml`, `docwash.yaml`,
//! `docwash.json`, ... in the standard locations) and parsed with serde. Every
//! field has a default, so a missing file is not an error. The API key is
//! only ever taken from the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::export::ExportConfig;
use crate::extract::{PopplerBackend, TextExtractor, DEFAULT_OCR_FALLBACK_MIN_CHARS};
use crate::llm::LlmConfig;
use crate::ocr::{OcrBackendType, OcrConfig, OcrSlot};
use crate::rewrite::RewriteConfig;

/// Name used for config file discovery.
pub const CONFIG_NAME: &str = "docwash";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Text extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// PDFs whose text layer has fewer characters than this are OCR'd
    #[serde(default = "default_ocr_fallback_min_chars")]
    pub ocr_fallback_min_chars: usize,
    /// Tesseract language
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    /// OCR engine (tesseract or ocrs)
    #[serde(default)]
    pub ocr_backend: OcrBackendType,
    /// Resolution for rasterizing PDF pages
    #[serde(default = "default_render_dpi")]
    pub render_dpi: u32,
    /// Directory holding OCR model files (ocrs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_model_path: Option<PathBuf>,
}

fn default_ocr_fallback_min_chars() -> usize {
    DEFAULT_OCR_FALLBACK_MIN_CHARS
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

fn default_render_dpi() -> u32 {
    300
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_fallback_min_chars: default_ocr_fallback_min_chars(),
            ocr_language: default_ocr_language(),
            ocr_backend: OcrBackendType::default(),
            render_dpi: default_render_dpi(),
            ocr_model_path: None,
        }
    }
}

impl ExtractionConfig {
    pub fn ocr_config(&self) -> OcrConfig {
        OcrConfig {
            language: self.ocr_language.clone(),
            model_path: self.ocr_model_path.clone(),
        }
    }

    /// Extractor using Poppler for PDFs.
    pub fn extractor(&self) -> TextExtractor {
        TextExtractor::new(Box::new(PopplerBackend::new(self.render_dpi)))
            .with_ocr_fallback_min_chars(self.ocr_fallback_min_chars)
    }

    /// Empty OCR slot for the configured backend.
    pub fn ocr_slot(&self) -> OcrSlot {
        OcrSlot::for_backend(self.ocr_backend, self.ocr_config())
    }
}

/// docwash configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub rewrite: RewriteConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// File this config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no file is found or the file is invalid.
    pub async fn load() -> Self {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        warn!("Ignoring config {}: {}", path.display(), e);
                        Self::default_with_env()
                    }
                },
                None => Self::default_with_env(),
            },
            Err(e) => {
                debug!("No config file found: {}", e);
                Self::default_with_env()
            }
        }
    }

    /// Load from an explicit path when given, otherwise discover one.
    pub async fn load_or_discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path).await,
            None => Ok(Self::load().await),
        }
    }

    /// Defaults with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        self.llm = self.llm.with_env_overrides();
        self
    }

    /// Load configuration from a specific file path.
    /// TOML and YAML are chosen by extension; anything else is read as JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        if let Some(model_path) = config.extraction.ocr_model_path.take() {
            let base_dir = config.base_dir().unwrap_or_else(|| PathBuf::from("."));
            config.extraction.ocr_model_path =
                Some(resolve_path(&model_path.to_string_lossy(), &base_dir));
        }

        debug!("Loaded config from {}", path.display());
        Ok(config.with_env_overrides())
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, ConfigError> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| ConfigError::Parse(format!("TOML: {}", e))),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| ConfigError::Parse(format!("YAML: {}", e))),
            _ => serde_json::from_str(contents)
                .map_err(|e| ConfigError::Parse(format!("JSON: {}", e))),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }
}

/// Resolve a path that may be relative to the config file.
/// - Absolute paths are returned as-is
/// - Paths starting with ~ are expanded
/// - Relative paths are resolved relative to `base_dir`
pub fn resolve_path(path_str: &str, base_dir: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(path_str);
    let path = Path::new(expanded.as_ref());

    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
