//! Domain error types
//!
//! This module defines the error hierarchy for Redline.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Redline error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum RedlineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid caller input (unreadable document, malformed category rules)
    #[error("Invalid input: {0}")]
    Input(String),

    /// Text extraction errors
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Document backend errors (open, render, mark)
    #[error("Document error: {0}")]
    Document(String),

    /// Text recognition errors
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Writing the marked document failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Run was cancelled between pages
    #[error("Processing cancelled")]
    Cancelled,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Text extraction errors
///
/// Errors raised while obtaining page text from the remote parser or the
/// local OCR path. These errors don't expose the HTTP client types.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No parser candidate could be reached
    #[error("Parser service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Parser answered with a non-success status
    #[error("Parser returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Parser answered with a body that is not a page list
    #[error("Malformed parser response: {0}")]
    MalformedResponse(String),

    /// Extraction produced too little text to be trusted
    #[error("{method} extracted only {chars} non-whitespace characters")]
    InsufficientText { method: String, chars: usize },

    /// OCR model could not be loaded or is not installed
    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    /// Every method allowed by the requested mode failed
    #[error("No extraction method succeeded (mode: {mode}): {reason}")]
    NoMethodSucceeded { mode: String, reason: String },
}

impl From<std::io::Error> for RedlineError {
    fn from(err: std::io::Error) -> Self {
        RedlineError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RedlineError {
    fn from(err: serde_json::Error) -> Self {
        RedlineError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for RedlineError {
    fn from(err: toml::de::Error) -> Self {
        RedlineError::Configuration(format!("TOML parsing error: {err}"))
    }
}
