//! Extracted page text and OCR line geometry

use super::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which path produced a document's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Remote parser service
    Parser,
    /// Local OCR over rasterized pages
    Ocr,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::Parser => f.write_str("parser"),
            ExtractionMethod::Ocr => f.write_str("ocr"),
        }
    }
}

/// One recognized line of text with its box in page units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    pub rect: Rect,
    /// Index of the horizontal stripe the line came from, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_index: Option<usize>,
}

/// Text of one page, regardless of extraction path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    /// 1-based page number
    pub page_number: usize,
    pub text: String,
    /// Line geometry, present for OCR output and for parsers that report it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<OcrLine>>,
}

impl ExtractedPage {
    pub fn new(page_number: usize, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
            lines: None,
        }
    }

    pub fn with_lines(mut self, lines: Vec<OcrLine>) -> Self {
        self.lines = Some(lines);
        self
    }

    /// Count of non-whitespace characters on the page
    pub fn content_chars(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }

    /// OCR lines, empty when the page has no line geometry
    pub fn ocr_lines(&self) -> &[OcrLine] {
        self.lines.as_deref().unwrap_or(&[])
    }
}

/// Total non-whitespace characters across pages
pub fn total_content_chars(pages: &[ExtractedPage]) -> usize {
    pages.iter().map(ExtractedPage::content_chars).sum()
}
