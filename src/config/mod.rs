//! Configuration management for Redline.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Redline uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `REDLINE_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use redline::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("redline.toml")?;
//!
//! println!("Parser: {}", config.parser.base_url);
//! println!("OCR model: {}", config.ocr.model_path);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`ParserConfig`] - Remote parser endpoints and timeouts
//! - [`OcrConfig`] - Recognition model and stripe geometry
//! - [`DetectionConfig`] - Context window and pattern library override
//! - [`LocalizationConfig`] - Line, word and fuzzy tolerances
//! - [`RedactionConfig`] - PDFium library and flattening resolution
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [parser]
//! base_url = "http://127.0.0.1:1000"
//! fallback_urls = ["${PARSER_BACKUP_URL}"]
//! enable_timeouts = true
//!
//! [ocr]
//! model_path = "models/rec.onnx"
//! charset_path = "models/charset.txt"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, load_from_env, load_or_default};
pub use schema::{
    ApplicationConfig, DetectionConfig, LocalizationConfig, LoggingConfig, OcrConfig,
    ParserConfig, RedactionConfig, RedlineConfig,
};
