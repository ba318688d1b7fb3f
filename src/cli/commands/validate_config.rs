//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Redline configuration file.

use crate::adapters::ocr::OcrEngine;
use crate::adapters::parser::build_candidates;
use crate::config::load_config;
use crate::core::detection::PatternLibrary;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateConfigArgs {}

impl ValidateConfigArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let library = match PatternLibrary::load(config.detection.pattern_library.as_deref()) {
            Ok(l) => l,
            Err(e) => {
                println!("❌ Pattern library could not be loaded");
                println!("   Error: {e:#}");
                return Ok(2);
            }
        };

        let ocr_available = OcrEngine::from_config(&config.ocr).is_available();

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Parser Candidates:");
        for candidate in build_candidates(&config.parser) {
            println!("    - {candidate}");
        }
        println!(
            "  Parser Timeouts: {}",
            if config.parser.enable_timeouts {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!("  OCR Enabled: {}", config.ocr.enabled);
        println!(
            "  OCR Model: {} ({})",
            config.ocr.model_path,
            if ocr_available { "found" } else { "missing" }
        );
        println!(
            "  Pattern Library: {} ({} categories)",
            config
                .detection
                .pattern_library
                .as_deref()
                .unwrap_or("built-in"),
            library.len()
        );
        println!("  Context Length: {}", config.detection.context_length);
        println!("  Redaction DPI: {}", config.redaction.render_dpi);
        println!();

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[parser]\nbase_url = \"http://parser:1000\"").unwrap();

        let code = ValidateConfigArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[localization]\nmin_fuzzy_score = 140").unwrap();

        let code = ValidateConfigArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let code = ValidateConfigArgs {}
            .execute("/nonexistent/redline.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
