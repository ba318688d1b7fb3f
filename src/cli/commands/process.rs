//! Process command implementation
//!
//! This module implements the `process` command: run the full pipeline over
//! one document and write the marked copy.

use crate::adapters::document::{DocumentLoader, MemoryLoader, PdfiumBackend};
use crate::config::{load_or_default, RedlineConfig};
use crate::core::pipeline::{ProcessRequest, RedactionPipeline};
use crate::core::progress::{ProgressRegistry, ProgressReporter};
use crate::domain::{
    Category, CategorySelection, ExtractionMode, MarkAction, RedlineError, SensitivityLevel,
};
use clap::Args;
use std::path::Path;
use tokio::sync::watch;

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Document to process (.pdf, or .txt for plain text)
    pub input: String,

    /// Where to write the marked document
    #[arg(short, long)]
    pub output: String,

    /// Category rules as a JSON object, e.g. '{"email": true, "iban": true}'
    #[arg(long, conflicts_with_all = ["categories", "all"])]
    pub rules: Option<String>,

    /// Enabled categories (comma-separated)
    #[arg(long, conflicts_with = "all")]
    pub categories: Option<String>,

    /// Enable every category (default when no selection is given)
    #[arg(long)]
    pub all: bool,

    /// Sensitivity level (strict, normal or relaxed)
    #[arg(long, default_value = "normal")]
    pub sensitivity: String,

    /// What to do with located matches (highlight or redact)
    #[arg(long, default_value = "highlight")]
    pub action: String,

    /// Extraction mode (auto, parser or ocr)
    #[arg(long, default_value = "auto")]
    pub mode: String,

    /// Job id under which progress is tracked; generated when omitted
    #[arg(long)]
    pub job_id: Option<String>,
}

impl ProcessArgs {
    /// Execute the process command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input, output = %self.output, "Starting process command");

        let config = match load_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        let (categories, sensitivity, action, mode) = match self.options() {
            Ok(options) => options,
            Err(e) => {
                eprintln!("{e}");
                return Ok(2);
            }
        };

        let bytes = match std::fs::read(&self.input) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("Cannot read {}: {e}", self.input);
                return Ok(2);
            }
        };

        let loader = match Self::loader_for(&self.input, &config) {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize document backend");
                eprintln!("Failed to initialize document backend: {e}");
                return Ok(5);
            }
        };

        let pipeline = RedactionPipeline::from_config(&config, loader)?;

        let job_id = self
            .job_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let registry = ProgressRegistry::global();
        let progress = ProgressReporter::new(registry.sink(job_id.clone()));

        let file_name = Path::new(&self.input)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf");

        let request = ProcessRequest {
            bytes: &bytes,
            file_name,
            categories,
            sensitivity,
            action,
            mode,
            progress,
            cancel: Some(shutdown_signal),
        };

        println!("🔍 Processing {} (job {job_id})", self.input);
        let result = pipeline.process(request).await;
        let final_state = registry.clear(&job_id);

        let outcome = match result {
            Ok(o) => o,
            Err(e) => {
                eprintln!("Processing failed: {e}");
                if let Some(state) = final_state {
                    tracing::debug!(stage = ?state.stage, percent = state.percent, "Last progress");
                }
                return Ok(match e {
                    RedlineError::Input(_) => 2,
                    _ => 5,
                });
            }
        };

        if let Err(e) = std::fs::write(&self.output, &outcome.bytes) {
            eprintln!("Failed to write {}: {e}", self.output);
            return Ok(5);
        }

        let stats = &outcome.stats;
        println!();
        println!("📊 Summary:");
        println!("  Pages Processed: {}", stats.pages_processed);
        println!("  Total Matches: {}", stats.total_matches);
        for (category, count) in &stats.by_category {
            println!("    {category}: {count}");
        }
        println!("  Rectangles Marked: {}", stats.rects_marked);
        println!("  Skipped (not located): {}", stats.skipped_matches);
        if let Some(method) = stats.extraction_method {
            println!("  Extraction Method: {method}");
        }
        println!("  Duration: {:.2}s", stats.duration.as_secs_f64());
        println!();
        println!("✅ Written to {}", self.output);

        Ok(0)
    }

    fn options(
        &self,
    ) -> crate::domain::Result<(CategorySelection, SensitivityLevel, MarkAction, ExtractionMode)>
    {
        Ok((
            self.selection()?,
            self.sensitivity.parse()?,
            self.action.parse()?,
            self.mode.parse()?,
        ))
    }

    fn selection(&self) -> crate::domain::Result<CategorySelection> {
        if let Some(rules) = &self.rules {
            return CategorySelection::from_json(rules);
        }
        match &self.categories {
            Some(list) if !self.all => {
                let categories = list
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::parse::<Category>)
                    .collect::<crate::domain::Result<Vec<_>>>()?;
                Ok(CategorySelection::only(categories))
            }
            _ => Ok(CategorySelection::all()),
        }
    }

    fn loader_for(
        input: &str,
        config: &RedlineConfig,
    ) -> crate::domain::Result<Box<dyn DocumentLoader>> {
        let is_text = Path::new(input)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"));

        if is_text {
            Ok(Box::new(MemoryLoader))
        } else {
            Ok(Box::new(PdfiumBackend::from_config(&config.redaction)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ProcessArgs {
        ProcessArgs {
            input: "in.pdf".to_string(),
            output: "out.pdf".to_string(),
            rules: None,
            categories: None,
            all: false,
            sensitivity: "normal".to_string(),
            action: "highlight".to_string(),
            mode: "auto".to_string(),
            job_id: None,
        }
    }

    #[test]
    fn test_default_selection_is_all() {
        let selection = args().selection().unwrap();
        assert!(Category::ALL.iter().all(|c| selection.is_enabled(*c)));
    }

    #[test]
    fn test_category_list() {
        let mut a = args();
        a.categories = Some("email, iban".to_string());
        let selection = a.selection().unwrap();
        assert!(selection.is_enabled(Category::Email));
        assert!(selection.is_enabled(Category::Iban));
        assert!(!selection.is_enabled(Category::Dni));
    }

    #[test]
    fn test_rules_json() {
        let mut a = args();
        a.rules = Some(r#"{"dni": true, "email": false}"#.to_string());
        let selection = a.selection().unwrap();
        assert!(selection.is_enabled(Category::Dni));
        assert!(!selection.is_enabled(Category::Email));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut a = args();
        a.categories = Some("email,galaxy".to_string());
        assert!(a.selection().is_err());
    }

    #[test]
    fn test_invalid_action_rejected() {
        let mut a = args();
        a.action = "erase".to_string();
        assert!(a.options().is_err());
    }
}
