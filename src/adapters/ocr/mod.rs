//! Local OCR
//!
//! - [`recognizer`] - text recognition for a single stripe image
//! - [`engine`] - load-once model lifecycle
//! - [`stripes`] - stripe recognition and geometry of a rendered page

pub mod engine;
pub mod recognizer;
pub mod stripes;

pub use engine::OcrEngine;
pub use recognizer::{OnnxLineRecognizer, OnnxLoader, RecognizerLoader, TextRecognizer};
pub use stripes::recognize_page;
