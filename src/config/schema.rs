//! Configuration schema types
//!
//! This module defines the configuration structure for Redline. Every section
//! has defaults so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Main Redline configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedlineConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Remote parser service
    #[serde(default)]
    pub parser: ParserConfig,

    /// Local OCR fallback
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Detection engine settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Coordinate localization tolerances
    #[serde(default)]
    pub localization: LocalizationConfig,

    /// Document backend and redaction rendering
    #[serde(default)]
    pub redaction: RedactionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RedlineConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.parser.validate()?;
        self.ocr.validate()?;
        self.detection.validate()?;
        self.localization.validate()?;
        self.redaction.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Remote parser service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Primary parser endpoint
    #[serde(default = "default_parser_url")]
    pub base_url: String,

    /// Additional endpoints tried in order after the primary
    #[serde(default)]
    pub fallback_urls: Vec<String>,

    /// Apply connect/read timeouts to parser requests
    #[serde(default)]
    pub enable_timeouts: bool,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: f64,

    /// Read timeout floor in seconds
    #[serde(default = "default_min_timeout_seconds")]
    pub min_timeout_seconds: f64,

    /// Extra read timeout per MB beyond the first 5 MB
    #[serde(default = "default_timeout_per_mb_seconds")]
    pub timeout_per_mb_seconds: f64,

    /// Read timeout ceiling in seconds
    #[serde(default = "default_max_timeout_seconds")]
    pub max_timeout_seconds: f64,
}

impl ParserConfig {
    fn validate(&self) -> Result<(), String> {
        for url in std::iter::once(&self.base_url).chain(self.fallback_urls.iter()) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!(
                    "parser url '{url}' must start with http:// or https://"
                ));
            }
        }

        let timeouts = [
            ("connect_timeout_seconds", self.connect_timeout_seconds),
            ("min_timeout_seconds", self.min_timeout_seconds),
            ("timeout_per_mb_seconds", self.timeout_per_mb_seconds),
            ("max_timeout_seconds", self.max_timeout_seconds),
        ];
        for (name, value) in timeouts {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("parser.{name} must be > 0"));
            }
        }

        Ok(())
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_url: default_parser_url(),
            fallback_urls: Vec::new(),
            enable_timeouts: false,
            connect_timeout_seconds: default_connect_timeout_seconds(),
            min_timeout_seconds: default_min_timeout_seconds(),
            timeout_per_mb_seconds: default_timeout_per_mb_seconds(),
            max_timeout_seconds: default_max_timeout_seconds(),
        }
    }
}

/// Local OCR configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Allow the OCR path at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Text recognition model (ONNX)
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// One symbol per line, in model output order
    #[serde(default = "default_charset_path")]
    pub charset_path: String,

    /// Height in pixels of each recognized stripe
    #[serde(default = "default_stripe_height_px")]
    pub stripe_height_px: u32,

    /// Rasterization zoom relative to page units
    #[serde(default = "default_render_zoom")]
    pub render_zoom: f32,

    /// Inverted-intensity threshold a pixel must exceed to count as ink
    #[serde(default = "default_ink_threshold")]
    pub ink_threshold: u8,

    /// Inference threads (0 lets the runtime decide)
    #[serde(default)]
    pub intra_threads: usize,
}

impl OcrConfig {
    fn validate(&self) -> Result<(), String> {
        if self.stripe_height_px == 0 {
            return Err("ocr.stripe_height_px must be > 0".to_string());
        }
        if !(self.render_zoom.is_finite() && self.render_zoom > 0.0) {
            return Err("ocr.render_zoom must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_path: default_model_path(),
            charset_path: default_charset_path(),
            stripe_height_px: default_stripe_height_px(),
            render_zoom: default_render_zoom(),
            ink_threshold: default_ink_threshold(),
            intra_threads: 0,
        }
    }
}

/// Detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Characters of context on each side of a candidate used for keyword scoring
    #[serde(default = "default_context_length")]
    pub context_length: usize,

    /// Replace the built-in pattern library with this TOML file
    #[serde(default)]
    pub pattern_library: Option<String>,
}

impl DetectionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.context_length == 0 {
            return Err("detection.context_length must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            context_length: default_context_length(),
            pattern_library: None,
        }
    }
}

/// Localization tolerances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizationConfig {
    /// Glyphs whose y differs by less than this share a line
    #[serde(default = "default_line_tolerance")]
    pub line_tolerance: f32,

    /// A horizontal gap at least this multiple of the average glyph width splits words
    #[serde(default = "default_word_gap_factor")]
    pub word_gap_factor: f32,

    /// Minimum similarity (0-100) accepted by the fuzzy strategies
    #[serde(default = "default_min_fuzzy_score")]
    pub min_fuzzy_score: u8,
}

impl LocalizationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.line_tolerance <= 0.0 {
            return Err("localization.line_tolerance must be > 0".to_string());
        }
        if self.word_gap_factor <= 0.0 {
            return Err("localization.word_gap_factor must be > 0".to_string());
        }
        if self.min_fuzzy_score > 100 {
            return Err("localization.min_fuzzy_score must be between 0 and 100".to_string());
        }
        Ok(())
    }
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            line_tolerance: default_line_tolerance(),
            word_gap_factor: default_word_gap_factor(),
            min_fuzzy_score: default_min_fuzzy_score(),
        }
    }
}

/// Document backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Directory containing the PDFium shared library; system library when unset
    #[serde(default)]
    pub pdfium_library_path: Option<String>,

    /// Resolution used when a redacted page is flattened to an image
    #[serde(default = "default_render_dpi")]
    pub render_dpi: u32,

    /// Outline width of highlights in page units
    #[serde(default = "default_highlight_width")]
    pub highlight_width: f32,
}

impl RedactionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.render_dpi == 0 {
            return Err("redaction.render_dpi must be > 0".to_string());
        }
        if self.highlight_width <= 0.0 {
            return Err("redaction.highlight_width must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            pdfium_library_path: None,
            render_dpi: default_render_dpi(),
            highlight_width: default_highlight_width(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log file path
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path must be set when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_parser_url() -> String {
    "http://127.0.0.1:1000".to_string()
}

fn default_connect_timeout_seconds() -> f64 {
    15.0
}

fn default_min_timeout_seconds() -> f64 {
    120.0
}

fn default_timeout_per_mb_seconds() -> f64 {
    30.0
}

fn default_max_timeout_seconds() -> f64 {
    600.0
}

fn default_model_path() -> String {
    "models/rec.onnx".to_string()
}

fn default_charset_path() -> String {
    "models/charset.txt".to_string()
}

fn default_stripe_height_px() -> u32 {
    100
}

fn default_render_zoom() -> f32 {
    2.0
}

fn default_ink_threshold() -> u8 {
    20
}

fn default_context_length() -> usize {
    50
}

fn default_line_tolerance() -> f32 {
    5.0
}

fn default_word_gap_factor() -> f32 {
    1.5
}

fn default_min_fuzzy_score() -> u8 {
    80
}

fn default_render_dpi() -> u32 {
    150
}

fn default_highlight_width() -> f32 {
    1.2
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
