// Redline - Sensitive Data Detection and PDF Redaction
// Copyright (c) 2025 Redline Contributors
// Licensed under the MIT License

//! # Redline - Sensitive Data Detection and PDF Redaction
//!
//! Redline finds personal and financial data in documents (bank accounts,
//! payment cards, Spanish identity numbers, emails, phone numbers, health and
//! credential mentions, ...) and either highlights it or removes it
//! permanently from the page.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Extracting** page text through a remote parser service, with local OCR as fallback
//! - **Detecting** sensitive spans with regex patterns, checksum validators and context scoring
//! - **Localizing** each span back to exact page rectangles
//! - **Marking** pages with highlight outlines or irreversible redaction
//!
//! ## Architecture
//!
//! Redline follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Detection, localization, extraction orchestration, pipeline, progress
//! - [`adapters`] - External integrations (parser service, OCR model, PDF backend)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redline::adapters::document::PdfiumBackend;
//! use redline::config::load_config;
//! use redline::core::pipeline::{ProcessRequest, RedactionPipeline};
//! use redline::domain::MarkAction;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("redline.toml")?;
//!     let backend = PdfiumBackend::from_config(&config.redaction)?;
//!     let pipeline = RedactionPipeline::from_config(&config, Box::new(backend))?;
//!
//!     let bytes = std::fs::read("contrato.pdf")?;
//!     let mut request = ProcessRequest::new(&bytes, "contrato.pdf");
//!     request.action = MarkAction::Redact;
//!
//!     let outcome = pipeline.process(request).await?;
//!     std::fs::write("contrato.redacted.pdf", &outcome.bytes)?;
//!
//!     println!("Redacted {} matches", outcome.stats.total_matches);
//!     Ok(())
//! }
//! ```
//!
//! ## Detection Only
//!
//! ```rust
//! use redline::core::detection::{DetectionEngine, PatternLibrary};
//! use redline::domain::{Category, CategorySelection, SensitivityLevel};
//! use std::sync::Arc;
//!
//! # fn example() -> anyhow::Result<()> {
//! let engine = DetectionEngine::new(Arc::new(PatternLibrary::default_patterns()?), 50);
//! let matches = engine.detect(
//!     "Escriba a ana.garcia@example.com",
//!     &CategorySelection::only([Category::Email]),
//!     SensitivityLevel::Normal,
//! );
//! assert_eq!(matches.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Redline uses the [`domain::RedlineError`] type for all errors:
//!
//! ```rust,no_run
//! use redline::domain::RedlineError;
//!
//! fn example() -> Result<(), RedlineError> {
//!     let config = redline::config::load_config("redline.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Redline uses structured logging with the `tracing` crate. Matched values
//! only ever appear masked:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(pages = 3, "Document opened");
//! warn!(category = "iban", preview = "ES******32", "Match could not be located");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
