//! Sensitive-data detection
//!
//! - [`normalize`] - text canonicalization shared with localization
//! - [`validators`] - checksum and structure validators
//! - [`patterns`] - category pattern library
//! - [`scoring`] - confidence scoring
//! - [`engine`] - detection and overlap resolution

pub mod engine;
pub mod normalize;
pub mod patterns;
pub mod scoring;
pub mod validators;

pub use engine::DetectionEngine;
pub use normalize::{normalize, normalize_for_search, normalize_for_validation};
pub use patterns::{CompiledPattern, PatternLibrary};
