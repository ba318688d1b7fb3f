//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Redline using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Redline - sensitive data detection and PDF redaction
#[derive(Parser, Debug)]
#[command(name = "redline")]
#[command(version, about, long_about = None)]
#[command(author = "Redline Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "redline.toml", env = "REDLINE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "REDLINE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect sensitive data in a document and highlight or redact it
    Process(commands::process::ProcessArgs),

    /// Print the matches found in a plain text file
    Detect(commands::detect::DetectArgs),

    /// Check a single value against a category validator
    Validate(commands::validate::ValidateArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate_config::ValidateConfigArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_process() {
        let cli = Cli::parse_from(["redline", "process", "in.pdf", "-o", "out.pdf"]);
        assert_eq!(cli.config, "redline.toml");
        assert!(matches!(cli.command, Commands::Process(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["redline", "--config", "custom.toml", "validate-config"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["redline", "--log-level", "debug", "detect", "notes.txt"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate() {
        let cli = Cli::parse_from(["redline", "validate", "dni", "12345678Z"]);
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.category, "dni");
                assert_eq!(args.value, "12345678Z");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
