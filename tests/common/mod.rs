//! Shared fixtures for integration tests

#![allow(dead_code)]

use image::DynamicImage;
use redline::adapters::ocr::{OcrEngine, RecognizerLoader, TextRecognizer};
use redline::config::ParserConfig;
use redline::domain::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Recognizer answering every stripe with the same text
pub struct ScriptedRecognizer {
    text: String,
    calls: Arc<AtomicUsize>,
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&mut self, _image: &DynamicImage) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Loader for [`ScriptedRecognizer`]; `calls` counts recognitions
pub struct ScriptedLoader {
    pub text: String,
    pub calls: Arc<AtomicUsize>,
}

impl RecognizerLoader for ScriptedLoader {
    fn is_available(&self) -> bool {
        true
    }

    fn load(&self) -> Result<Box<dyn TextRecognizer + Send>> {
        Ok(Box::new(ScriptedRecognizer {
            text: self.text.clone(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

/// OCR engine returning `text` for every stripe, plus its call counter
pub fn scripted_ocr(text: &str) -> (Arc<OcrEngine>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = OcrEngine::new(ScriptedLoader {
        text: text.to_string(),
        calls: Arc::clone(&calls),
    });
    (Arc::new(engine), calls)
}

/// Parser configuration pointing at a test server, with short timeouts so the
/// derived container alias fails fast
pub fn parser_config(base_url: &str) -> ParserConfig {
    ParserConfig {
        base_url: base_url.to_string(),
        enable_timeouts: true,
        connect_timeout_seconds: 1.0,
        min_timeout_seconds: 5.0,
        max_timeout_seconds: 5.0,
        ..Default::default()
    }
}

/// JSON body of a parser answer with one text page per entry
pub fn pages_body(pages: &[&str]) -> String {
    serde_json::json!({ "pages": pages }).to_string()
}
