//! Sensitive-data categories and the caller-facing knobs of a run

use crate::domain::{RedlineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Category of sensitive data
///
/// Identifiers serialize in camelCase (`creditCard`, `dateOfBirth`, ...) which is
/// the form used in category rules, statistics and CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    /// Bank account number (IBAN)
    Iban,
    /// Payment card number
    CreditCard,
    /// Spanish national identity document
    Dni,
    /// Spanish foreigner identity number
    Nie,
    /// Spanish company tax code
    Cif,
    /// Email address
    Email,
    /// Phone number
    Phone,
    /// Date of birth
    DateOfBirth,
    /// Postal address
    Address,
    /// Account user name
    Username,
    /// Person full name
    FullName,
    /// Bank account holder
    AccountHolder,
    /// Passport number
    Passport,
    /// Vehicle licence plate
    LicensePlate,
    /// Social security number
    Ssn,
    /// Employee identifier
    EmployeeId,
    /// Session cookie or token value
    Cookie,
    /// Passwords, API keys and similar secrets
    Credentials,
    /// Health-related data
    HealthData,
}

impl Category {
    /// Every category in declaration order
    pub const ALL: [Category; 19] = [
        Category::Iban,
        Category::CreditCard,
        Category::Dni,
        Category::Nie,
        Category::Cif,
        Category::Email,
        Category::Phone,
        Category::DateOfBirth,
        Category::Address,
        Category::Username,
        Category::FullName,
        Category::AccountHolder,
        Category::Passport,
        Category::LicensePlate,
        Category::Ssn,
        Category::EmployeeId,
        Category::Cookie,
        Category::Credentials,
        Category::HealthData,
    ];

    /// Wire identifier of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Iban => "iban",
            Category::CreditCard => "creditCard",
            Category::Dni => "dni",
            Category::Nie => "nie",
            Category::Cif => "cif",
            Category::Email => "email",
            Category::Phone => "phone",
            Category::DateOfBirth => "dateOfBirth",
            Category::Address => "address",
            Category::Username => "username",
            Category::FullName => "fullName",
            Category::AccountHolder => "accountHolder",
            Category::Passport => "passport",
            Category::LicensePlate => "licensePlate",
            Category::Ssn => "ssn",
            Category::EmployeeId => "employeeId",
            Category::Cookie => "cookie",
            Category::Credentials => "credentials",
            Category::HealthData => "healthData",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = RedlineError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RedlineError::Input(format!("Unknown category: {s}")))
    }
}

/// Acceptance threshold applied to scored candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityLevel {
    /// Accept candidates from 0.50
    Strict,
    /// Accept candidates from 0.65
    #[default]
    Normal,
    /// Accept candidates from 0.80
    Relaxed,
}

impl SensitivityLevel {
    /// Minimum confidence a candidate needs to be accepted
    pub fn threshold(&self) -> f64 {
        match self {
            SensitivityLevel::Strict => 0.5,
            SensitivityLevel::Normal => 0.65,
            SensitivityLevel::Relaxed => 0.8,
        }
    }

    /// Factor applied to a score before clamping
    pub fn multiplier(&self) -> f64 {
        match self {
            SensitivityLevel::Strict => 1.15,
            SensitivityLevel::Normal => 1.0,
            SensitivityLevel::Relaxed => 0.85,
        }
    }
}

impl FromStr for SensitivityLevel {
    type Err = RedlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(SensitivityLevel::Strict),
            "normal" => Ok(SensitivityLevel::Normal),
            "relaxed" => Ok(SensitivityLevel::Relaxed),
            _ => Err(RedlineError::Input(format!(
                "Invalid sensitivity '{s}'. Must be one of: strict, normal, relaxed"
            ))),
        }
    }
}

/// What happens to localized rectangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkAction {
    /// Draw a visible outline, content stays intact
    #[default]
    Highlight,
    /// Paint an opaque fill and destroy the underlying content
    Redact,
}

impl FromStr for MarkAction {
    type Err = RedlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "highlight" => Ok(MarkAction::Highlight),
            "redact" => Ok(MarkAction::Redact),
            _ => Err(RedlineError::Input(format!(
                "Invalid action '{s}'. Must be one of: highlight, redact"
            ))),
        }
    }
}

/// Which extraction paths a run may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Remote parser first, OCR as fallback
    #[default]
    Auto,
    /// Remote parser only
    Parser,
    /// Local OCR only
    Ocr,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExtractionMode::Auto => "auto",
            ExtractionMode::Parser => "parser",
            ExtractionMode::Ocr => "ocr",
        };
        f.write_str(s)
    }
}

impl FromStr for ExtractionMode {
    type Err = RedlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ExtractionMode::Auto),
            "parser" | "external" => Ok(ExtractionMode::Parser),
            "ocr" => Ok(ExtractionMode::Ocr),
            _ => Err(RedlineError::Input(format!(
                "Invalid extraction mode '{s}'. Must be one of: auto, parser, ocr"
            ))),
        }
    }
}

/// Enabled-category map supplied by the caller
///
/// Categories missing from the map are disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySelection(BTreeMap<Category, bool>);

impl CategorySelection {
    /// Selection with every category enabled
    pub fn all() -> Self {
        Self(Category::ALL.iter().map(|c| (*c, true)).collect())
    }

    /// Selection enabling only the given categories
    pub fn only(categories: impl IntoIterator<Item = Category>) -> Self {
        Self(categories.into_iter().map(|c| (c, true)).collect())
    }

    /// Parse a JSON rules object such as `{"email": true, "iban": false}`
    ///
    /// # Errors
    ///
    /// Returns [`RedlineError::Input`] when the document is not an object of
    /// known category identifiers to booleans.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| RedlineError::Input(format!("Malformed category rules: {e}")))
    }

    /// Whether detection should run for `category`
    pub fn is_enabled(&self, category: Category) -> bool {
        self.0.get(&category).copied().unwrap_or(false)
    }

    /// Enabled categories in declaration order
    pub fn enabled(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().filter(|(_, on)| **on).map(|(c, _)| *c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_camel_case() {
        let json = serde_json::to_string(&Category::CreditCard).unwrap();
        assert_eq!(json, "\"creditCard\"");
        let back: Category = serde_json::from_str("\"dateOfBirth\"").unwrap();
        assert_eq!(back, Category::DateOfBirth);
    }

    #[test]
    fn test_category_from_str_matches_wire_ids() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("passportNumber".parse::<Category>().is_err());
    }

    #[test]
    fn test_sensitivity_thresholds() {
        assert_eq!(SensitivityLevel::Strict.threshold(), 0.5);
        assert_eq!(SensitivityLevel::Normal.threshold(), 0.65);
        assert_eq!(SensitivityLevel::Relaxed.threshold(), 0.8);
        assert_eq!(SensitivityLevel::default(), SensitivityLevel::Normal);
    }

    #[test]
    fn test_selection_from_json() {
        let selection = CategorySelection::from_json(r#"{"email": true, "iban": false}"#).unwrap();
        assert!(selection.is_enabled(Category::Email));
        assert!(!selection.is_enabled(Category::Iban));
        assert!(!selection.is_enabled(Category::Phone));
        assert_eq!(selection.enabled().collect::<Vec<_>>(), vec![Category::Email]);
    }

    #[test]
    fn test_selection_rejects_unknown_category() {
        let err = CategorySelection::from_json(r#"{"shoeSize": true}"#).unwrap_err();
        assert!(matches!(err, RedlineError::Input(_)));
    }

    #[test]
    fn test_selection_rejects_non_boolean() {
        assert!(CategorySelection::from_json(r#"{"email": "yes"}"#).is_err());
        assert!(CategorySelection::from_json(r#"["email"]"#).is_err());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("AUTO".parse::<ExtractionMode>().unwrap(), ExtractionMode::Auto);
        assert_eq!("external".parse::<ExtractionMode>().unwrap(), ExtractionMode::Parser);
        assert!("magic".parse::<ExtractionMode>().is_err());
        assert_eq!("redact".parse::<MarkAction>().unwrap(), MarkAction::Redact);
    }
}
