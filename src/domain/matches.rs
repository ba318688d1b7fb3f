//! Detected sensitive spans

use super::category::Category;
use serde::{Deserialize, Serialize};

/// A span of normalized page text classified as sensitive
///
/// `start`/`end` are byte offsets into the normalized text the match was found
/// in, and `raw` is exactly `text[start..end]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub category: Category,
    pub raw: String,
    /// Value with separators removed, as passed to the category validator
    pub normalized: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
    /// Normalized text surrounding the match that was searched for keywords
    pub context: String,
    /// Whether a checksum/structure validator accepted the value. `None` when
    /// the category has no validator.
    #[serde(default)]
    pub valid: Option<bool>,
}

impl Match {
    /// Whether the two spans share at least one byte
    pub fn overlaps(&self, other: &Match) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Masked preview safe to put in logs
    pub fn preview(&self) -> String {
        mask_value(&self.raw)
    }
}

/// Keep the first and last two characters, star the rest
pub fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let mut out = String::with_capacity(chars.len());
    out.extend(&chars[..2]);
    out.extend(std::iter::repeat('*').take(chars.len() - 4));
    out.extend(&chars[chars.len() - 2..]);
    out
}
