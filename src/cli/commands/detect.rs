//! Detect command implementation
//!
//! Runs detection only, over a UTF-8 text file, and prints the retained
//! matches. Values are masked unless `--show-values` is given.

use crate::config::load_or_default;
use crate::core::detection::DetectionEngine;
use crate::domain::{Category, CategorySelection, SensitivityLevel};
use anyhow::Context;
use clap::Args;

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Text file to scan
    pub input: String,

    /// Enabled categories (comma-separated); all when omitted
    #[arg(long)]
    pub categories: Option<String>,

    /// Sensitivity level (strict, normal or relaxed)
    #[arg(long, default_value = "normal")]
    pub sensitivity: String,

    /// Print matches as JSON
    #[arg(long)]
    pub json: bool,

    /// Print matched values unmasked
    #[arg(long)]
    pub show_values: bool,
}

impl DetectArgs {
    /// Execute the detect command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input, "Starting detect command");

        let config = match load_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        let sensitivity: SensitivityLevel = match self.sensitivity.parse() {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{e}");
                return Ok(2);
            }
        };

        let selection = match &self.categories {
            Some(list) => {
                let parsed: Result<Vec<Category>, _> =
                    list.split(',').map(|s| s.trim().parse::<Category>()).collect();
                match parsed {
                    Ok(categories) => CategorySelection::only(categories),
                    Err(e) => {
                        eprintln!("{e}");
                        return Ok(2);
                    }
                }
            }
            None => CategorySelection::all(),
        };

        let text = std::fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read {}", self.input))?;

        let engine = DetectionEngine::from_config(&config.detection)?;
        let mut matches = engine.detect(&text, &selection, sensitivity);
        if !self.show_values {
            for m in &mut matches {
                m.raw = m.preview();
                m.normalized = crate::domain::matches::mask_value(&m.normalized);
                m.context.clear();
            }
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&matches)?);
            return Ok(0);
        }

        if matches.is_empty() {
            println!("No sensitive data found");
            return Ok(0);
        }

        println!("Found {} match(es):", matches.len());
        for m in &matches {
            println!(
                "  [{}..{}] {:<14} {:.2}  {}",
                m.start, m.end, m.category, m.confidence, m.raw
            );
        }

        Ok(0)
    }
}
