//! Processing statistics
//!
//! This module defines the counters a pipeline run reports to its caller.

use crate::domain::{Category, ExtractionMethod};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Summary of one processed document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStats {
    /// Matches retained by detection across all pages
    pub total_matches: usize,

    /// Retained matches per category
    pub by_category: BTreeMap<Category, usize>,

    /// Retained matches per 1-based page number
    pub by_page: BTreeMap<usize, usize>,

    /// Pages that went through detection and marking
    pub pages_processed: usize,

    /// Matches that could not be located on the page
    pub skipped_matches: usize,

    /// Rectangles committed to the document
    pub rects_marked: usize,

    /// Path that produced the text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<ExtractionMethod>,

    #[serde(skip)]
    pub duration: Duration,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one retained match
    pub fn record_match(&mut self, page_number: usize, category: Category) {
        self.total_matches += 1;
        *self.by_category.entry(category).or_insert(0) += 1;
        *self.by_page.entry(page_number).or_insert(0) += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped_matches += 1;
    }

    /// Count a page whose marks were committed
    pub fn record_page(&mut self, rects: usize) {
        self.pages_processed += 1;
        self.rects_marked += rects;
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Number of matches for one category
    pub fn count(&self, category: Category) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total_matches = self.total_matches,
            pages_processed = self.pages_processed,
            rects_marked = self.rects_marked,
            skipped = self.skipped_matches,
            method = ?self.extraction_method,
            duration_ms = self.duration.as_millis() as u64,
            "Document processed"
        );

        for (category, count) in &self.by_category {
            tracing::debug!(category = %category, count, "Matches by category");
        }

        if self.skipped_matches > 0 {
            tracing::warn!(
                skipped = self.skipped_matches,
                "Some matches could not be located and were left unmarked"
            );
        }
    }
}
