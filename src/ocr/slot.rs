//! Lazily-initialized OCR engine owned by a processing scope.
//!
//! The slot starts empty. The first OCR request builds the engine through the
//! factory; later requests in the same scope reuse it. `release` drops the
//! engine so the next document starts from a fresh one. A failed
//! initialization is reported to that caller and nothing is cached.

use tracing::{debug, info};

use super::backend::{create_backend, OcrBackend, OcrBackendType, OcrConfig, OcrError};

type Factory = Box<dyn Fn() -> Result<Box<dyn OcrBackend>, OcrError> + Send + Sync>;

/// Owner of at most one live OCR engine.
pub struct OcrSlot {
    factory: Factory,
    engine: Option<Box<dyn OcrBackend>>,
    initializations: usize,
}

impl OcrSlot {
    /// Create an empty slot that builds engines with `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn OcrBackend>, OcrError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            engine: None,
            initializations: 0,
        }
    }

    /// Create an empty slot for a configured backend type.
    pub fn for_backend(backend_type: OcrBackendType, config: OcrConfig) -> Self {
        Self::new(move || create_backend(backend_type, &config))
    }

    /// Get the engine, initializing it on first use.
    pub fn engine(&mut self) -> Result<&dyn OcrBackend, OcrError> {
        if self.engine.is_none() {
            let engine = (self.factory)()?;
            if !engine.is_available() {
                return Err(OcrError::BackendNotAvailable(engine.availability_hint()));
            }
            info!("Initialized {} OCR engine", engine.backend_type());
            self.initializations += 1;
            self.engine = Some(engine);
        }

        self.engine
            .as_deref()
            .ok_or_else(|| OcrError::BackendNotAvailable("OCR engine missing".to_string()))
    }

    /// Drop the live engine, if any.
    pub fn release(&mut self) {
        if let Some(engine) = self.engine.take() {
            debug!("Released {} OCR engine", engine.backend_type());
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// How many engines this slot has built over its lifetime.
    pub fn initializations(&self) -> usize {
        self.initializations
    }
}

impl std::fmt::Debug for OcrSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrSlot")
            .field("initialized", &self.is_initialized())
            .field("initializations", &self.initializations)
            .finish()
    }
}
