//! Remote parser service integration
//!
//! The service accepts a multipart upload at `POST {url}/parse` and answers
//! with a JSON page list. [`ParserClient`] walks the configured candidate
//! endpoints in order and stops at the first well-formed answer.

pub mod client;
pub mod models;
pub mod traits;

pub use client::{build_candidates, compute_read_timeout, ParsedDocument, ParserClient};
pub use models::ParseResponse;
pub use traits::DocumentParser;
