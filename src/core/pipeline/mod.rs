//! Pipeline coordination
//!
//! - [`coordinator`] - per-document run: open, extract, detect, localize, mark, save
//! - [`stats`] - counters reported for a run

pub mod coordinator;
pub mod stats;

pub use coordinator::{ProcessOutcome, ProcessRequest, RedactionPipeline};
pub use stats::ProcessingStats;
