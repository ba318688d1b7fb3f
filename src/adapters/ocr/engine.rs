//! OCR model lifecycle
//!
//! The recognizer is loaded at most once and reused until released. Loading and
//! every recognition call go through the same lock, so one engine never runs
//! two recognitions at a time.

use super::recognizer::{OnnxLoader, RecognizerLoader, TextRecognizer};
use crate::config::OcrConfig;
use crate::domain::{ExtractionError, RedlineError, Result};
use image::DynamicImage;
use std::sync::{Mutex, MutexGuard};

type Slot = Option<Box<dyn TextRecognizer + Send>>;

/// Shared handle to a lazily loaded text recognizer
pub struct OcrEngine {
    loader: Box<dyn RecognizerLoader>,
    slot: Mutex<Slot>,
}

impl OcrEngine {
    pub fn new(loader: impl RecognizerLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            slot: Mutex::new(None),
        }
    }

    /// Engine over the configured ONNX model
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(OnnxLoader::new(config))
    }

    /// Whether the model can be loaded (or already is)
    pub fn is_available(&self) -> bool {
        self.is_loaded() || self.loader.is_available()
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Load the model if it is not loaded yet
    pub fn initialize(&self) -> Result<()> {
        let mut slot = self.lock()?;
        Self::ensure_loaded(&mut slot, self.loader.as_ref())?;
        Ok(())
    }

    /// Recognize the text of one image, loading the model first when needed
    pub fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let mut slot = self.lock()?;
        let recognizer = Self::ensure_loaded(&mut slot, self.loader.as_ref())?;
        recognizer.recognize(image)
    }

    /// Drop the loaded model; the next use loads it again
    pub fn release(&self) {
        if let Ok(mut slot) = self.lock() {
            if slot.take().is_some() {
                tracing::info!("OCR model released");
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Slot>> {
        self.slot
            .lock()
            .map_err(|_| RedlineError::Ocr("OCR engine lock poisoned".to_string()))
    }

    fn ensure_loaded<'s>(
        slot: &'s mut Slot,
        loader: &dyn RecognizerLoader,
    ) -> Result<&'s mut Box<dyn TextRecognizer + Send>> {
        if slot.is_none() {
            if !loader.is_available() {
                return Err(ExtractionError::OcrUnavailable(
                    "recognition model files not found".to_string(),
                )
                .into());
            }
            let recognizer = loader
                .load()
                .map_err(|e| ExtractionError::OcrUnavailable(e.to_string()))?;
            tracing::info!("OCR model initialized");
            *slot = Some(recognizer);
        }
        slot.as_mut()
            .ok_or_else(|| RedlineError::Ocr("OCR model not loaded".to_string()))
    }
}
