//! Text extraction
//!
//! Whatever path produced the text, the rest of the pipeline only sees
//! [`crate::domain::ExtractedPage`] records: page text plus optional line
//! geometry.

pub mod orchestrator;

pub use orchestrator::{ExtractionOrchestrator, ExtractionOutcome, MIN_CONTENT_CHARS};
