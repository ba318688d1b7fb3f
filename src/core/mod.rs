//! Core logic for Redline.
//!
//! This module contains detection, localization and the orchestration that
//! ties them to extraction and document marking.
//!
//! # Modules
//!
//! - [`detection`] - normalization, validators, pattern library, scoring and the detection engine
//! - [`localize`] - mapping matches onto page rectangles
//! - [`extraction`] - choosing between the remote parser and local OCR
//! - [`pipeline`] - processing a whole document and reporting statistics
//! - [`progress`] - progress updates and the per-job progress table
//!
//! # Processing Workflow
//!
//! 1. **Open**: load the document bytes through a [`crate::adapters::document::DocumentLoader`]
//! 2. **Extract**: obtain page text from the parser service or OCR
//! 3. **Detect**: find sensitive spans per page
//! 4. **Localize**: map each span to rectangles on the page
//! 5. **Mark**: highlight or redact, one page at a time
//! 6. **Save**: serialize the marked document once every page is done
//!
//! # Example
//!
//! ```rust,no_run
//! use redline::adapters::document::MemoryLoader;
//! use redline::config::load_config;
//! use redline::core::pipeline::{ProcessRequest, RedactionPipeline};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("redline.toml")?;
//! let pipeline = RedactionPipeline::from_config(&config, Box::new(MemoryLoader))?;
//!
//! let bytes = std::fs::read("contrato.txt")?;
//! let outcome = pipeline
//!     .process(ProcessRequest::new(&bytes, "contrato.txt"))
//!     .await?;
//!
//! println!("Matches: {}", outcome.stats.total_matches);
//! # Ok(())
//! # }
//! ```

pub mod detection;
pub mod extraction;
pub mod localize;
pub mod pipeline;
pub mod progress;
