//! OCRS OCR backend implementation.
//!
//! Uses the ocrs crate for pure-Rust OCR without external binaries.
//! This is a lightweight, CPU-based OCR engine that only reads Latin script,
//! which matches the English-only recognition this tool performs.
//!
//! Models are automatically downloaded on first use from:
//! https://ocrs-models.s3-accelerate.amazonaws.com/

use std::path::PathBuf;
use std::time::Instant;

use image::RgbImage;
use tracing::debug;

use super::backend::{OcrBackend, OcrBackendType, OcrConfig, OcrError, OcrResult};
use super::model_utils::{ensure_model_file, ModelDirConfig, ModelSpec};

/// Model directory configuration for OCRS.
const MODEL_CONFIG: ModelDirConfig = ModelDirConfig {
    subdir: "ocrs",
    required_files: &["text-detection.rten", "text-recognition.rten"],
};

const DETECTION_MODEL: ModelSpec = ModelSpec {
    url: "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten",
    filename: "text-detection.rten",
    size_hint: "2.5 MB",
};

const RECOGNITION_MODEL: ModelSpec = ModelSpec {
    url: "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten",
    filename: "text-recognition.rten",
    size_hint: "10 MB",
};

/// OCRS OCR backend (pure Rust).
///
/// Owns its engine; constructing the backend loads both models, so a value
/// of this type is always ready to recognize.
pub struct OcrsBackend {
    engine: ocrs::OcrEngine,
    model_dir: PathBuf,
}

impl OcrsBackend {
    /// Load models (downloading them if needed) and build the engine.
    pub fn try_new(config: OcrConfig) -> Result<Self, OcrError> {
        let model_dir = ensure_models(&config)?;

        let detection_model = rten::Model::load_file(model_dir.join(DETECTION_MODEL.filename))
            .map_err(|e| OcrError::OcrFailed(format!("Failed to load detection model: {}", e)))?;
        let recognition_model =
            rten::Model::load_file(model_dir.join(RECOGNITION_MODEL.filename)).map_err(|e| {
                OcrError::OcrFailed(format!("Failed to load recognition model: {}", e))
            })?;

        let engine = ocrs::OcrEngine::new(ocrs::OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| OcrError::OcrFailed(format!("Failed to create OCR engine: {}", e)))?;

        debug!("OCRS engine loaded from {:?}", model_dir);
        Ok(Self { engine, model_dir })
    }
}

/// Find the model directory, downloading models into the default one if absent.
fn ensure_models(config: &OcrConfig) -> Result<PathBuf, OcrError> {
    if let Some(dir) = MODEL_CONFIG.locate(config.model_path.as_deref()) {
        return Ok(dir);
    }

    let model_dir = MODEL_CONFIG.default_dir();
    std::fs::create_dir_all(&model_dir)?;

    ensure_model_file(&DETECTION_MODEL, &model_dir)?;
    ensure_model_file(&RECOGNITION_MODEL, &model_dir)?;

    if !MODEL_CONFIG.has_required_files(&model_dir) {
        return Err(OcrError::ModelNotFound(format!(
            "OCRS models missing from {:?}",
            model_dir
        )));
    }
    Ok(model_dir)
}

impl OcrBackend for OcrsBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Ocrs
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        format!("OCRS models loaded from {:?}", self.model_dir)
    }

    fn recognize(&self, image: &RgbImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();

        let img_source = ocrs::ImageSource::from_bytes(image.as_raw(), image.dimensions())
            .map_err(|e| OcrError::ImageError(format!("Failed to convert image: {}", e)))?;

        let input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to prepare input: {}", e)))?;

        let text = self
            .engine
            .get_text(&input)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to extract text: {}", e)))?;

        Ok(OcrResult {
            text,
            confidence: None,
            backend: OcrBackendType::Ocrs,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
