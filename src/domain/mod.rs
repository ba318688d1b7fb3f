//! Domain models and types for Redline.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Categories and run options** ([`Category`], [`SensitivityLevel`], [`MarkAction`],
//!   [`ExtractionMode`], [`CategorySelection`])
//! - **Detection output** ([`Match`])
//! - **Extraction output** ([`ExtractedPage`], [`OcrLine`], [`ExtractionMethod`])
//! - **Geometry** ([`Rect`], [`Glyph`], [`PageSize`])
//! - **Error types** ([`RedlineError`], [`ExtractionError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, RedlineError>`]:
//!
//! ```rust
//! use redline::domain::{CategorySelection, Result};
//!
//! fn example() -> Result<()> {
//!     let rules = CategorySelection::from_json(r#"{"email": true}"#)?;
//!     assert!(rules.enabled().count() == 1);
//!     Ok(())
//! }
//! ```

pub mod category;
pub mod errors;
pub mod geometry;
pub mod matches;
pub mod page;
pub mod result;

// Re-export commonly used types for convenience
pub use category::{Category, CategorySelection, ExtractionMode, MarkAction, SensitivityLevel};
pub use errors::{ExtractionError, RedlineError};
pub use geometry::{Glyph, PageSize, Rect};
pub use matches::Match;
pub use page::{ExtractedPage, ExtractionMethod, OcrLine};
pub use result::Result;
