//! Remote extraction abstraction
//!
//! The extraction orchestrator depends on [`DocumentParser`] rather than on
//! [`ParserClient`] so that other transports (or test doubles) can stand in
//! for the HTTP service.

use super::client::ParserClient;
use crate::domain::{ExtractedPage, ExtractionError};
use async_trait::async_trait;

/// A service turning document bytes into page text
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Extract the text of every page
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint produced a well-formed page list.
    async fn extract_pages(
        &self,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<Vec<ExtractedPage>, ExtractionError>;
}

#[async_trait]
impl DocumentParser for ParserClient {
    async fn extract_pages(
        &self,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<Vec<ExtractedPage>, ExtractionError> {
        let parsed = self.parse(bytes, file_name).await?;
        Ok(parsed.pages)
    }
}
