//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "redline.toml")]
    pub output: String,

    /// Include comments explaining every setting
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Redline configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Point [parser] base_url at your parser service");
                println!("  2. Place the recognition model and charset under models/");
                println!("  3. Validate configuration: redline validate-config");
                println!("  4. Process a document: redline process input.pdf -o output.pdf");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Redline Configuration File

[application]
log_level = "info"

[parser]
base_url = "http://127.0.0.1:1000"
fallback_urls = []
enable_timeouts = false

[ocr]
enabled = true
model_path = "models/rec.onnx"
charset_path = "models/charset.txt"

[detection]
context_length = 50

[localization]
line_tolerance = 5.0
word_gap_factor = 1.5
min_fuzzy_score = 80

[redaction]
render_dpi = 150

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Redline Configuration File
#
# Every setting below shows its default. Values may reference environment
# variables as ${VAR_NAME}; REDLINE_<SECTION>_<KEY> variables override them.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Remote Parser Service
# ============================================================================
[parser]
# Primary endpoint; documents are uploaded to {base_url}/parse
base_url = "http://127.0.0.1:1000"

# Endpoints tried in order when the primary fails. A loopback base_url is
# also retried as host.docker.internal.
fallback_urls = []

# Requests wait indefinitely unless timeouts are enabled
enable_timeouts = false

# Connect timeout in seconds
connect_timeout_seconds = 15.0

# Read timeout = max(min, min + (size_mb - 5) * per_mb), capped at max
min_timeout_seconds = 120.0
timeout_per_mb_seconds = 30.0
max_timeout_seconds = 600.0

# ============================================================================
# Local OCR
# ============================================================================
[ocr]
# Allow OCR as a fallback (auto mode) or as the only path (ocr mode)
enabled = true

# CRNN recognition model exported to ONNX, and its charset (one symbol per line)
model_path = "models/rec.onnx"
charset_path = "models/charset.txt"

# Pages are rendered at this zoom and recognized in stripes of this height
render_zoom = 2.0
stripe_height_px = 100

# A pixel counts as ink when darker than 255 - ink_threshold
ink_threshold = 20

# Inference threads (0 = runtime default)
intra_threads = 0

# ============================================================================
# Detection
# ============================================================================
[detection]
# Characters on each side of a match searched for context keywords
context_length = 50

# Replace the built-in pattern library
# pattern_library = "patterns/custom.toml"

# ============================================================================
# Localization
# ============================================================================
[localization]
# Glyphs closer than this vertically share a line
line_tolerance = 5.0

# Horizontal gaps wider than this multiple of the average glyph width split words
word_gap_factor = 1.5

# Minimum similarity (0-100) for fuzzy matching
min_fuzzy_score = 80

# ============================================================================
# Document Backend
# ============================================================================
[redaction]
# Directory containing the PDFium shared library (system library when unset)
# pdfium_library_path = "/opt/pdfium/lib"

# Resolution used when a redacted page is flattened
render_dpi = 150

# Highlight outline width in points
highlight_width = 1.2

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = false

# Directory for log files
local_path = "logs"

# Log rotation (daily, hourly or never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RedlineConfig;

    #[test]
    fn test_generated_configs_parse_and_validate() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config: RedlineConfig = toml::from_str(&content).unwrap();
            assert!(config.validate().is_ok());
        }
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redline.toml");
        std::fs::write(&path, "").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);

        let forced = InitArgs { force: true, ..args };
        assert_eq!(forced.execute().await.unwrap(), 0);
        assert!(std::fs::read_to_string(&path).unwrap().contains("[parser]"));
    }
}
