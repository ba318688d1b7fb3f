//! Detection engine
//!
//! Runs every enabled category pattern over normalized page text, scores each
//! candidate and resolves overlaps across categories.

use super::normalize::{normalize, normalize_for_validation};
use super::patterns::{CompiledPattern, PatternLibrary};
use super::scoring::{score, ScoreSignals};
use super::validators::validate;
use crate::config::DetectionConfig;
use crate::domain::{CategorySelection, Match, SensitivityLevel};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Detection engine over an immutable pattern library
#[derive(Debug, Clone)]
pub struct DetectionEngine {
    library: Arc<PatternLibrary>,
    context_length: usize,
}

impl DetectionEngine {
    pub fn new(library: Arc<PatternLibrary>, context_length: usize) -> Self {
        Self {
            library,
            context_length,
        }
    }

    /// Build an engine from configuration, loading a custom pattern library
    /// when one is configured
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        let library = PatternLibrary::load(config.pattern_library.as_deref())
            .context("Failed to load pattern library")?;
        Ok(Self::new(Arc::new(library), config.context_length))
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// Detect sensitive spans in raw page text
    ///
    /// The text is normalized once; returned offsets index into
    /// `normalize(text)`.
    pub fn detect(
        &self,
        text: &str,
        categories: &CategorySelection,
        sensitivity: SensitivityLevel,
    ) -> Vec<Match> {
        let normalized = normalize(text);
        self.detect_normalized(&normalized, categories, sensitivity)
    }

    /// Detect sensitive spans in text that is already normalized
    pub fn detect_normalized(
        &self,
        normalized: &str,
        categories: &CategorySelection,
        sensitivity: SensitivityLevel,
    ) -> Vec<Match> {
        if normalized.is_empty() {
            return Vec::new();
        }

        let threshold = sensitivity.threshold();
        let mut candidates = Vec::new();

        for pattern in self.library.all_patterns() {
            if !categories.is_enabled(pattern.category) {
                continue;
            }

            let before = candidates.len();
            self.scan_category(pattern, normalized, sensitivity, threshold, &mut candidates);

            tracing::debug!(
                category = %pattern.category,
                accepted = candidates.len() - before,
                "Category scanned"
            );
        }

        let resolved = resolve_overlaps(candidates);

        tracing::debug!(
            matches = resolved.len(),
            sensitivity = ?sensitivity,
            "Detection completed"
        );

        resolved
    }

    fn scan_category(
        &self,
        pattern: &CompiledPattern,
        text: &str,
        sensitivity: SensitivityLevel,
        threshold: f64,
        out: &mut Vec<Match>,
    ) {
        for found in pattern.regex.find_iter(text) {
            let found = match found {
                Ok(found) => found,
                Err(e) => {
                    // Backtrack limit or similar; the remaining text is not scanned for this category
                    tracing::warn!(
                        category = %pattern.category,
                        error = %e,
                        "Pattern evaluation aborted"
                    );
                    break;
                }
            };

            if found.start() == found.end() {
                continue;
            }

            let raw = found.as_str();
            let value = normalize_for_validation(raw, pattern.category);
            let valid = if pattern.has_validator {
                validate(pattern.category, &value)
            } else {
                None
            };

            let context = context_window(text, found.start(), found.end(), self.context_length);
            let signals = ScoreSignals::gather(pattern, valid, context);
            let confidence = score(pattern.base_confidence, signals, sensitivity);

            tracing::trace!(
                category = %pattern.category,
                start = found.start(),
                end = found.end(),
                preview = %crate::domain::matches::mask_value(raw),
                confidence,
                "Candidate scored"
            );

            if confidence < threshold {
                continue;
            }

            out.push(Match {
                category: pattern.category,
                raw: raw.to_string(),
                normalized: value,
                start: found.start(),
                end: found.end(),
                confidence,
                context: context.to_string(),
                valid,
            });
        }
    }
}

/// Slice of `text` extending `radius` characters on each side of `start..end`
///
/// `start` and `end` must be character boundaries.
pub fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = if radius == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .take(radius)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(start)
    };

    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    &text[from..to]
}

/// Greedy cross-category overlap resolution
///
/// Candidates are ordered by start ascending then confidence descending. A
/// candidate is kept when it starts at or after the end of the last kept one;
/// when it overlaps the last kept one it replaces it only with strictly higher
/// confidence. The result is pairwise non-overlapping but not guaranteed to be
/// the maximum-confidence cover.
pub fn resolve_overlaps(mut candidates: Vec<Match>) -> Vec<Match> {
    candidates.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });

    let mut kept: Vec<Match> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match kept.last_mut() {
            Some(last) if candidate.start < last.end => {
                if candidate.confidence > last.confidence {
                    *last = candidate;
                }
            }
            _ => kept.push(candidate),
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;

    fn engine() -> DetectionEngine {
        DetectionEngine::new(Arc::new(PatternLibrary::default_patterns().unwrap()), 50)
    }

    fn candidate(category: Category, start: usize, end: usize, confidence: f64) -> Match {
        Match {
            category,
            raw: "x".repeat(end - start),
            normalized: String::new(),
            start,
            end,
            confidence,
            context: String::new(),
            valid: None,
        }
    }

    #[test]
    fn test_context_window_is_character_based() {
        let text = "ñññññ abc ñññññ";
        let start = text.find("abc").unwrap();
        let window = context_window(text, start, start + 3, 2);
        assert_eq!(window, "ñ abc ñ");
    }

    #[test]
    fn test_context_window_at_edges() {
        assert_eq!(context_window("abc", 0, 3, 50), "abc");
        assert_eq!(context_window("abc def", 4, 7, 0), "def");
    }

    #[test]
    fn test_resolve_overlaps_prefers_higher_confidence() {
        let resolved = resolve_overlaps(vec![
            candidate(Category::Phone, 0, 9, 0.7),
            candidate(Category::Dni, 0, 9, 0.9),
            candidate(Category::Email, 20, 30, 0.8),
        ]);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].category, Category::Dni);
        assert_eq!(resolved[1].category, Category::Email);
    }

    #[test]
    fn test_resolve_overlaps_keeps_earlier_on_tie() {
        let resolved = resolve_overlaps(vec![
            candidate(Category::Ssn, 0, 10, 0.8),
            candidate(Category::Phone, 5, 15, 0.8),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].category, Category::Ssn);
    }

    #[test]
    fn test_adjacent_spans_both_kept() {
        let resolved = resolve_overlaps(vec![
            candidate(Category::Ssn, 0, 5, 0.8),
            candidate(Category::Phone, 5, 10, 0.7),
        ]);
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_detects_valid_email_and_iban() {
        let text = "Contacto: ana.garcia@example.com\nIBAN: ES91 2100 0418 4502 0005 1332";
        let matches = engine().detect(
            text,
            &CategorySelection::only([Category::Email, Category::Iban]),
            SensitivityLevel::Normal,
        );

        let categories: Vec<Category> = matches.iter().map(|m| m.category).collect();
        assert_eq!(categories, vec![Category::Email, Category::Iban]);
        assert_eq!(matches[1].normalized, "ES9121000418450200051332");
        assert_eq!(matches[1].valid, Some(true));
    }

    #[test]
    fn test_raw_equals_normalized_slice() {
        let text = "Tel.   612 345 678 y DNI 12345678Z";
        let normalized = normalize(text);
        let matches = engine().detect(text, &CategorySelection::all(), SensitivityLevel::Strict);
        assert!(!matches.is_empty());
        for m in matches {
            assert!(m.start < m.end);
            assert_eq!(&normalized[m.start..m.end], m.raw);
            assert!((0.0..=1.0).contains(&m.confidence));
        }
    }

    #[test]
    fn test_disabled_category_not_reported() {
        let matches = engine().detect(
            "ana.garcia@example.com",
            &CategorySelection::only([Category::Iban]),
            SensitivityLevel::Normal,
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn test_invalid_card_rejected_without_context() {
        let matches = engine().detect(
            "ref 4111 1111 1111 1112",
            &CategorySelection::only([Category::CreditCard]),
            SensitivityLevel::Normal,
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn test_empty_text() {
        assert!(engine()
            .detect("", &CategorySelection::all(), SensitivityLevel::Strict)
            .is_empty());
    }
}
