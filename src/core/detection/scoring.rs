//! Confidence scoring
//!
//! A candidate's score starts at the category base and is adjusted, in order,
//! by validator outcome, context keywords, the combined validity+keyword bonus,
//! secondary indicator sets and the sensitivity multiplier. The result is
//! clamped to `[0, 1]`.

use super::patterns::{CompiledPattern, SecondaryIndicators};
use super::validators::{contains_any, has_credential_indicators, has_health_indicators};
use crate::domain::SensitivityLevel;

const VALID_FLOOR: f64 = 0.9;
const INVALID_FACTOR: f64 = 0.5;
const KEYWORD_FLOOR: f64 = 0.95;
const COMBINED_BONUS: f64 = 1.05;

/// Evidence gathered for one candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreSignals {
    /// Validator outcome; `None` when the category has no validator
    pub valid: Option<bool>,
    /// A category context keyword occurs in the window
    pub keyword: bool,
    /// The category's secondary indicator set occurs in the window
    pub secondary: bool,
}

impl ScoreSignals {
    /// Collect signals for a candidate of `pattern`'s category
    pub fn gather(pattern: &CompiledPattern, valid: Option<bool>, context: &str) -> Self {
        let valid = if pattern.has_validator { valid } else { None };
        let keyword = contains_any(context, pattern.context_keywords.as_slice());
        let secondary = match pattern.secondary {
            Some(SecondaryIndicators::Credential) => has_credential_indicators(context),
            Some(SecondaryIndicators::Health) => has_health_indicators(context),
            None => false,
        };

        Self {
            valid,
            keyword,
            secondary,
        }
    }
}

/// Deterministic confidence function
pub fn score(base: f64, signals: ScoreSignals, sensitivity: SensitivityLevel) -> f64 {
    let mut confidence = base;

    match signals.valid {
        Some(true) => confidence = confidence.max(VALID_FLOOR),
        Some(false) => confidence *= INVALID_FACTOR,
        None => {}
    }

    if signals.keyword {
        confidence = confidence.max(KEYWORD_FLOOR);
    }

    if signals.valid == Some(true) && signals.keyword {
        confidence = (confidence * COMBINED_BONUS).min(1.0);
    }

    if signals.secondary {
        confidence = confidence.max(KEYWORD_FLOOR);
    }

    confidence *= sensitivity.multiplier();

    confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(valid: Option<bool>, keyword: bool) -> ScoreSignals {
        ScoreSignals {
            valid,
            keyword,
            secondary: false,
        }
    }

    #[test]
    fn test_base_only() {
        let c = score(0.6, signals(None, false), SensitivityLevel::Normal);
        assert!((c - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_valid_raises_to_floor() {
        let c = score(0.5, signals(Some(true), false), SensitivityLevel::Normal);
        assert!((c - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_halves() {
        let c = score(0.8, signals(Some(false), false), SensitivityLevel::Normal);
        assert!((c - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_with_keyword_still_reaches_keyword_floor() {
        let c = score(0.8, signals(Some(false), true), SensitivityLevel::Normal);
        assert!((c - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_valid_and_keyword_gets_bonus() {
        let c = score(0.8, signals(Some(true), true), SensitivityLevel::Normal);
        assert!((c - 0.9975).abs() < 1e-9);
    }

    #[test]
    fn test_secondary_indicators() {
        let s = ScoreSignals {
            valid: None,
            keyword: false,
            secondary: true,
        };
        let c = score(0.6, s, SensitivityLevel::Normal);
        assert!((c - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_sensitivity_multiplier_and_clamp() {
        let strict = score(0.9, signals(Some(true), true), SensitivityLevel::Strict);
        assert_eq!(strict, 1.0);

        let relaxed = score(0.6, signals(None, false), SensitivityLevel::Relaxed);
        assert!((relaxed - 0.51).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_never_decreases_score() {
        let levels = [
            SensitivityLevel::Strict,
            SensitivityLevel::Normal,
            SensitivityLevel::Relaxed,
        ];
        let validities = [None, Some(true), Some(false)];
        for base in [0.5, 0.6, 0.7, 0.75, 0.8, 0.85] {
            for level in levels {
                for valid in validities {
                    let without = score(base, signals(valid, false), level);
                    let with = score(base, signals(valid, true), level);
                    assert!(with >= without, "base {base} {level:?} {valid:?}");
                }
            }
        }
    }
}
