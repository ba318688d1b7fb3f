//! HTTP client for the remote parser service

use super::models::ParseResponse;
use crate::config::ParserConfig;
use crate::domain::{ExtractedPage, ExtractionError, RedlineError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Used when neither a base URL nor fallbacks are configured
pub const DEFAULT_PARSER_URL: &str = "http://127.0.0.1:1000";

/// Hostname substituted for loopback addresses
pub const CONTAINER_HOST_ALIAS: &str = "host.docker.internal";

/// Files up to this size get the minimum read timeout
const TIMEOUT_FREE_MB: f64 = 5.0;

/// Longest response excerpt kept in an error
const ERROR_BODY_LIMIT: usize = 500;

/// Pages returned by one parser endpoint
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub pages: Vec<ExtractedPage>,
    /// Candidate that answered
    pub endpoint: String,
}

/// Parser client trying each candidate endpoint in order
#[derive(Debug, Clone)]
pub struct ParserClient {
    client: Client,
    config: ParserConfig,
    candidates: Vec<String>,
}

impl ParserClient {
    /// Create a new parser client
    ///
    /// Timeouts are only applied when `enable_timeouts` is set; otherwise a
    /// request waits for as long as the service needs.
    pub fn new(config: ParserConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if config.enable_timeouts {
            builder = builder.connect_timeout(Duration::from_secs_f64(
                config.connect_timeout_seconds,
            ));
        }

        let client = builder.build().map_err(|e| {
            RedlineError::Configuration(format!("Failed to build parser HTTP client: {e}"))
        })?;

        let candidates = build_candidates(&config);

        Ok(Self {
            client,
            config,
            candidates,
        })
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Read timeout for a file of `size_bytes`, `None` when timeouts are disabled
    pub fn read_timeout(&self, size_bytes: usize) -> Option<Duration> {
        self.config
            .enable_timeouts
            .then(|| compute_read_timeout(&self.config, size_bytes as f64 / (1024.0 * 1024.0)))
    }

    /// Upload the document to each candidate until one returns a page list
    pub async fn parse(
        &self,
        bytes: &[u8],
        file_name: &str,
    ) -> std::result::Result<ParsedDocument, ExtractionError> {
        let total = self.candidates.len();
        let timeout = self.read_timeout(bytes.len());

        match timeout {
            Some(t) => tracing::info!(read_timeout_secs = t.as_secs_f64(), "Parser timeouts enabled"),
            None => tracing::info!("Parser timeouts disabled; waiting for the full response"),
        }

        let mut last_error =
            ExtractionError::ServiceUnavailable("no parser candidates configured".to_string());

        for (idx, candidate) in self.candidates.iter().enumerate() {
            crate::log_candidate_attempt!(idx + 1, total, candidate);

            match self.parse_once(candidate, bytes, file_name, timeout).await {
                Ok(pages) => {
                    tracing::info!(
                        url = %candidate,
                        pages = pages.len(),
                        "Parser service answered"
                    );
                    return Ok(ParsedDocument {
                        pages,
                        endpoint: candidate.clone(),
                    });
                }
                Err(e) => {
                    tracing::warn!(url = %candidate, error = %e, "Parser candidate failed");
                    last_error = e;
                }
            }
        }

        tracing::warn!(attempts = total, error = %last_error, "All parser candidates failed");
        Err(last_error)
    }

    async fn parse_once(
        &self,
        candidate: &str,
        bytes: &[u8],
        file_name: &str,
        timeout: Option<Duration>,
    ) -> std::result::Result<Vec<ExtractedPage>, ExtractionError> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| ExtractionError::ServiceUnavailable(e.to_string()))?;
        let form = Form::new().part("file", part);

        let mut request = self
            .client
            .post(format!("{candidate}/parse"))
            .multipart(form);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ExtractionError::ServiceUnavailable(format!("timeout calling {candidate}"))
            } else {
                ExtractionError::ServiceUnavailable(format!("{candidate}: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::MalformedResponse(format!("unreadable body: {e}")))?;

        if !status.is_success() {
            return Err(ExtractionError::HttpStatus {
                status: status.as_u16(),
                message: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        Ok(ParseResponse::from_json(&body)?.into_pages())
    }
}

/// Ordered, de-duplicated endpoint list: base URL, fallbacks, then the
/// container alias of a loopback base URL
pub fn build_candidates(config: &ParserConfig) -> Vec<String> {
    let base = config.base_url.trim().trim_end_matches('/').to_string();

    let mut raw = Vec::new();
    if !base.is_empty() {
        raw.push(base.clone());
    }
    raw.extend(
        config
            .fallback_urls
            .iter()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty()),
    );

    if let Ok(parsed) = Url::parse(&base) {
        if let Some(host) = parsed.host_str() {
            if host == "127.0.0.1" || host == "localhost" {
                raw.push(base.replacen(host, CONTAINER_HOST_ALIAS, 1));
            }
        }
    }

    let mut candidates: Vec<String> = Vec::with_capacity(raw.len());
    for url in raw {
        if !candidates.contains(&url) {
            candidates.push(url);
        }
    }

    if candidates.is_empty() {
        candidates.push(DEFAULT_PARSER_URL.to_string());
    }
    candidates
}

/// `max(min, min + (size_mb - 5) * per_mb)` capped at the configured maximum
pub fn compute_read_timeout(config: &ParserConfig, size_mb: f64) -> Duration {
    let mut secs = config.min_timeout_seconds;
    if size_mb > TIMEOUT_FREE_MB {
        secs += (size_mb - TIMEOUT_FREE_MB) * config.timeout_per_mb_seconds;
    }
    secs = secs.min(config.max_timeout_seconds);
    Duration::from_secs_f64(secs.max(config.min_timeout_seconds))
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
