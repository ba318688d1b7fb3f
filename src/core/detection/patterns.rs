//! Pattern library for sensitive-data detection
//!
//! Category definitions are data: a TOML document (embedded by default) is
//! compiled once into an immutable [`PatternLibrary`] that the detection engine
//! borrows.

use crate::domain::Category;
use anyhow::{Context, Result};
use fancy_regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Backtracking budget for patterns that use lookaround
const BACKTRACK_LIMIT: usize = 10_000_000;

/// Accepted base confidence for any category
pub const BASE_CONFIDENCE_RANGE: std::ops::RangeInclusive<f64> = 0.5..=0.85;

/// Additional keyword set consulted by the scorer for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecondaryIndicators {
    /// Passwords, tokens, private keys
    Credential,
    /// Diagnoses, treatments, patient records
    Health,
}

/// Pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    /// Matcher source
    pub pattern: String,
    /// Starting confidence (0.5 - 0.85)
    pub base_confidence: f64,
    /// Whether a checksum/structure validator exists
    #[serde(default)]
    pub validator: bool,
    /// Lowercase keywords searched in the context window
    #[serde(default)]
    pub context_keywords: Vec<String>,
    #[serde(default)]
    pub secondary: Option<SecondaryIndicators>,
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub category: Category,
    pub regex: Regex,
    pub base_confidence: f64,
    pub has_validator: bool,
    pub context_keywords: Vec<String>,
    pub secondary: Option<SecondaryIndicators>,
}

#[derive(Debug, Deserialize)]
struct LibraryDocument {
    categories: BTreeMap<String, PatternDefinition>,
}

/// Immutable set of compiled category patterns, in category order
#[derive(Debug)]
pub struct PatternLibrary {
    patterns: Vec<CompiledPattern>,
}

impl PatternLibrary {
    /// Load a pattern library from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read pattern library: {}",
                path.as_ref().display()
            )
        })?;

        Self::from_toml(&content)
    }

    /// Compile a pattern library from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let document: LibraryDocument =
            toml::from_str(content).context("Failed to parse pattern library TOML")?;

        let mut patterns = Vec::with_capacity(document.categories.len());
        for (name, def) in document.categories {
            let category: Category = name
                .parse()
                .with_context(|| format!("Invalid category in pattern library: {name}"))?;

            if !BASE_CONFIDENCE_RANGE.contains(&def.base_confidence) {
                anyhow::bail!(
                    "base_confidence for '{name}' must be within [{}, {}], got {}",
                    BASE_CONFIDENCE_RANGE.start(),
                    BASE_CONFIDENCE_RANGE.end(),
                    def.base_confidence
                );
            }

            let regex = RegexBuilder::new(&def.pattern)
                .backtrack_limit(BACKTRACK_LIMIT)
                .build()
                .with_context(|| format!("Invalid pattern for '{name}': {}", def.pattern))?;

            patterns.push(CompiledPattern {
                category,
                regex,
                base_confidence: def.base_confidence,
                has_validator: def.validator,
                context_keywords: def
                    .context_keywords
                    .iter()
                    .map(|k| k.to_lowercase())
                    .collect(),
                secondary: def.secondary,
            });
        }

        // Table order in TOML is not significant; detection order follows the category enum
        patterns.sort_by_key(|p| p.category);

        Ok(Self { patterns })
    }

    /// The built-in library
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../../patterns/sensitive_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Load `path` when given, otherwise the built-in library
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::default_patterns(),
        }
    }

    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    pub fn pattern_for(&self, category: Category) -> Option<&CompiledPattern> {
        self.patterns.iter().find(|p| p.category == category)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
