//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with --test-threads=1
//! to avoid interference between tests.

use redline::config::{load_config, load_or_default};
use redline::domain::RedlineError;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("REDLINE_APPLICATION_LOG_LEVEL");
    std::env::remove_var("REDLINE_PARSER_BASE_URL");
    std::env::remove_var("REDLINE_PARSER_FALLBACK_URLS");
    std::env::remove_var("REDLINE_PARSER_ENABLE_TIMEOUTS");
    std::env::remove_var("REDLINE_OCR_ENABLED");
    std::env::remove_var("REDLINE_DETECTION_CONTEXT_LENGTH");
    std::env::remove_var("TEST_PARSER_HOST");
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[application]
log_level = "debug"

[parser]
base_url = "http://parser.internal:1000/"
fallback_urls = ["http://backup.internal:1000"]
enable_timeouts = true
connect_timeout_seconds = 5.0
min_timeout_seconds = 60.0
timeout_per_mb_seconds = 10.0
max_timeout_seconds = 300.0

[ocr]
enabled = false
model_path = "/opt/models/rec.onnx"
charset_path = "/opt/models/charset.txt"
stripe_height_px = 80
render_zoom = 3.0

[detection]
context_length = 80

[localization]
line_tolerance = 3.0
min_fuzzy_score = 90

[redaction]
render_dpi = 200

[logging]
local_enabled = true
local_path = "/tmp/redline"
local_rotation = "hourly"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.parser.base_url, "http://parser.internal:1000/");
    assert_eq!(config.parser.fallback_urls.len(), 1);
    assert!(config.parser.enable_timeouts);
    assert_eq!(config.parser.max_timeout_seconds, 300.0);
    assert!(!config.ocr.enabled);
    assert_eq!(config.ocr.model_path, "/opt/models/rec.onnx");
    assert_eq!(config.ocr.stripe_height_px, 80);
    assert_eq!(config.detection.context_length, 80);
    assert_eq!(config.localization.min_fuzzy_score, 90);
    assert_eq!(config.redaction.render_dpi, 200);
    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[parser]\nbase_url = \"http://parser:1000\"\n");
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "info");
    assert!(!config.parser.enable_timeouts);
    assert!(config.ocr.enabled);
    assert_eq!(config.ocr.stripe_height_px, 100);
    assert_eq!(config.ocr.render_zoom, 2.0);
    assert_eq!(config.detection.context_length, 50);
    assert_eq!(config.localization.min_fuzzy_score, 80);
    assert!(!config.logging.local_enabled);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_PARSER_HOST", "parser.svc");

    let temp_file = write_config("[parser]\nbase_url = \"http://${TEST_PARSER_HOST}:1000\"\n");
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.parser.base_url, "http://parser.svc:1000");
    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable_fails() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[parser]\nbase_url = \"http://${TEST_PARSER_HOST}:1000\"\n");
    let result = load_config(temp_file.path());

    assert!(matches!(result, Err(RedlineError::Configuration(_))));
}

#[test]
fn test_env_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("REDLINE_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var(
        "REDLINE_PARSER_FALLBACK_URLS",
        "http://a.internal:1000, http://b.internal:1000,",
    );
    std::env::set_var("REDLINE_PARSER_ENABLE_TIMEOUTS", "true");
    std::env::set_var("REDLINE_DETECTION_CONTEXT_LENGTH", "120");

    let temp_file = write_config("[application]\nlog_level = \"info\"\n");
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "warn");
    assert_eq!(
        config.parser.fallback_urls,
        vec!["http://a.internal:1000", "http://b.internal:1000"]
    );
    assert!(config.parser.enable_timeouts);
    assert_eq!(config.detection.context_length, 120);

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("REDLINE_DETECTION_CONTEXT_LENGTH", "wide");

    let temp_file = write_config("");
    let result = load_config(temp_file.path());

    assert!(result.is_err());
    cleanup_env_vars();
}

#[test]
fn test_validation_errors() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    for content in [
        "[application]\nlog_level = \"loud\"\n",
        "[parser]\nbase_url = \"ftp://parser:1000\"\n",
        "[ocr]\nstripe_height_px = 0\n",
        "[localization]\nmin_fuzzy_score = 101\n",
        "[logging]\nlocal_rotation = \"weekly\"\n",
    ] {
        let temp_file = write_config(content);
        let err = load_config(temp_file.path()).unwrap_err();
        assert!(
            err.to_string().contains("validation failed"),
            "unexpected error for {content:?}: {err}"
        );
    }
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("REDLINE_OCR_ENABLED", "false");

    let config = load_or_default("/nonexistent/redline.toml").unwrap();
    assert!(!config.ocr.enabled);
    assert!(load_config("/nonexistent/redline.toml").is_err());

    cleanup_env_vars();
}
