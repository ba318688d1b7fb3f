//! Parser service response models
//!
//! The service returns `{"pages": [...]}` where each entry is either a bare
//! string or an object carrying the page text under one of several keys.
//! Everything is converted to [`ExtractedPage`] here so nothing downstream
//! sees the raw shapes.

use crate::domain::{ExtractedPage, ExtractionError, OcrLine, Rect};
use serde::Deserialize;

/// Top-level parser response
#[derive(Debug, Clone, Deserialize)]
pub struct ParseResponse {
    pub pages: Vec<RawPage>,
}

/// One page as returned by the service
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPage {
    Text(String),
    Object(RawPageObject),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPageObject {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub extracted_text: Option<String>,
    #[serde(default)]
    pub lines: Option<Vec<RawLine>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLine {
    #[serde(default)]
    pub text: String,
    /// `[x0, y0, x1, y1]` in page units, top-left origin
    pub bbox: [f32; 4],
    #[serde(default)]
    pub stripe_index: Option<usize>,
}

impl RawPageObject {
    /// First non-empty of `text`, `content`, `extracted_text`
    pub fn page_text(&self) -> &str {
        [&self.text, &self.content, &self.extracted_text]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|text| !text.is_empty())
            .unwrap_or("")
    }
}

impl RawPage {
    pub fn into_extracted(self, page_number: usize) -> ExtractedPage {
        match self {
            RawPage::Text(text) => ExtractedPage::new(page_number, text),
            RawPage::Object(object) => {
                let page = ExtractedPage::new(page_number, object.page_text());
                match object.lines {
                    Some(lines) if !lines.is_empty() => page.with_lines(
                        lines
                            .into_iter()
                            .map(|line| OcrLine {
                                text: line.text,
                                rect: Rect::new(
                                    line.bbox[0],
                                    line.bbox[1],
                                    line.bbox[2],
                                    line.bbox[3],
                                ),
                                stripe_index: line.stripe_index,
                            })
                            .collect(),
                    ),
                    _ => page,
                }
            }
        }
    }
}

impl ParseResponse {
    /// Decode a response body
    pub fn from_json(body: &str) -> Result<Self, ExtractionError> {
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| ExtractionError::MalformedResponse(format!("invalid JSON: {e}")))?;

        if !value.is_object() {
            return Err(ExtractionError::MalformedResponse(
                "response is not a JSON object".to_string(),
            ));
        }
        if !value.get("pages").is_some_and(|p| p.is_array()) {
            return Err(ExtractionError::MalformedResponse(
                "response has no 'pages' array".to_string(),
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| ExtractionError::MalformedResponse(format!("unexpected page shape: {e}")))
    }

    /// Pages numbered from 1 in response order
    pub fn into_pages(self) -> Vec<ExtractedPage> {
        self.pages
            .into_iter()
            .enumerate()
            .map(|(idx, page)| page.into_extracted(idx + 1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_page_shapes() {
        let body = r#"{
            "pages": [
                "plain text page",
                {"content": "content page"},
                {"text": "", "extracted_text": "fallback key"},
                {"text": "with lines", "lines": [{"text": "with lines", "bbox": [1, 2, 30, 12], "stripe_index": 0}]}
            ]
        }"#;

        let pages = ParseResponse::from_json(body).unwrap().into_pages();
        assert_eq!(pages.len(), 4);
        assert_eq!(pages[0].text, "plain text page");
        assert_eq!(pages[1].text, "content page");
        assert_eq!(pages[2].text, "fallback key");
        assert_eq!(pages[3].page_number, 4);
        assert_eq!(pages[3].ocr_lines().len(), 1);
        assert_eq!(pages[3].ocr_lines()[0].rect, Rect::new(1.0, 2.0, 30.0, 12.0));
    }

    #[test]
    fn test_object_without_text_is_empty_page() {
        let pages = ParseResponse::from_json(r#"{"pages": [{"other": 1}]}"#)
            .unwrap()
            .into_pages();
        assert_eq!(pages[0].text, "");
        assert!(pages[0].lines.is_none());
    }

    #[test]
    fn test_missing_pages_rejected() {
        let err = ParseResponse::from_json(r#"{"document": "x"}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse(_)));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(ParseResponse::from_json("[1, 2]").is_err());
        assert!(ParseResponse::from_json("not json").is_err());
    }
}
