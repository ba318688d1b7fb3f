//! External system integrations for Redline.
//!
//! This module provides adapters for the systems the pipeline talks to:
//!
//! - [`parser`] - remote parser service (multipart upload, JSON page list)
//! - [`ocr`] - local text recognition over rendered pages
//! - [`document`] - document backends that expose glyphs and accept marks
//!
//! # Design Pattern
//!
//! Adapters isolate third-party crates behind small traits
//! ([`parser::DocumentParser`], [`ocr::TextRecognizer`],
//! [`document::MarkableDocument`]) so the core can be exercised with in-memory
//! implementations. Errors from the underlying crates are converted into
//! [`crate::domain::RedlineError`] before they leave an adapter.

pub mod document;
pub mod ocr;
pub mod parser;
