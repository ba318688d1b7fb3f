//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::RedlineConfig;
use crate::domain::errors::RedlineError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into RedlineConfig
/// 4. Applies environment variable overrides (REDLINE_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use redline::config::loader::load_config;
///
/// let config = load_config("redline.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RedlineConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RedlineError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        RedlineError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: RedlineConfig = toml::from_str(&contents)
        .map_err(|e| RedlineError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        RedlineError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Builds a configuration from defaults and `REDLINE_*` overrides only
///
/// Used when no configuration file is present.
pub fn load_from_env() -> Result<RedlineConfig> {
    let mut config = RedlineConfig::default();
    apply_env_overrides(&mut config)?;
    config.validate().map_err(|e| {
        RedlineError::Configuration(format!("Configuration validation failed: {}", e))
    })?;
    Ok(config)
}

/// Loads `path` when it exists, otherwise falls back to [`load_from_env`]
pub fn load_or_default(path: impl AsRef<Path>) -> Result<RedlineConfig> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "No configuration file, using defaults");
        load_from_env()
    }
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| RedlineError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        // Comments are copied verbatim
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(RedlineError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        RedlineError::Configuration(format!("{key} must be a number, got '{value}'"))
    })
}

/// Applies environment variable overrides using REDLINE_* prefix
///
/// Environment variables follow the pattern: REDLINE_<SECTION>_<KEY>
/// For example: REDLINE_PARSER_BASE_URL, REDLINE_OCR_MODEL_PATH
fn apply_env_overrides(config: &mut RedlineConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("REDLINE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Parser overrides
    if let Ok(val) = std::env::var("REDLINE_PARSER_BASE_URL") {
        config.parser.base_url = val.trim().to_string();
    }
    if let Ok(val) = std::env::var("REDLINE_PARSER_FALLBACK_URLS") {
        config.parser.fallback_urls = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    if let Ok(val) = std::env::var("REDLINE_PARSER_ENABLE_TIMEOUTS") {
        config.parser.enable_timeouts = parse_flag(&val);
    }
    if let Ok(val) = std::env::var("REDLINE_PARSER_CONNECT_TIMEOUT_SECONDS") {
        config.parser.connect_timeout_seconds =
            parse_number("REDLINE_PARSER_CONNECT_TIMEOUT_SECONDS", &val)?;
    }
    if let Ok(val) = std::env::var("REDLINE_PARSER_MIN_TIMEOUT_SECONDS") {
        config.parser.min_timeout_seconds =
            parse_number("REDLINE_PARSER_MIN_TIMEOUT_SECONDS", &val)?;
    }
    if let Ok(val) = std::env::var("REDLINE_PARSER_TIMEOUT_PER_MB_SECONDS") {
        config.parser.timeout_per_mb_seconds =
            parse_number("REDLINE_PARSER_TIMEOUT_PER_MB_SECONDS", &val)?;
    }
    if let Ok(val) = std::env::var("REDLINE_PARSER_MAX_TIMEOUT_SECONDS") {
        config.parser.max_timeout_seconds =
            parse_number("REDLINE_PARSER_MAX_TIMEOUT_SECONDS", &val)?;
    }

    // OCR overrides
    if let Ok(val) = std::env::var("REDLINE_OCR_ENABLED") {
        config.ocr.enabled = parse_flag(&val);
    }
    if let Ok(val) = std::env::var("REDLINE_OCR_MODEL_PATH") {
        config.ocr.model_path = val;
    }
    if let Ok(val) = std::env::var("REDLINE_OCR_CHARSET_PATH") {
        config.ocr.charset_path = val;
    }

    // Detection overrides
    if let Ok(val) = std::env::var("REDLINE_DETECTION_CONTEXT_LENGTH") {
        config.detection.context_length = parse_number("REDLINE_DETECTION_CONTEXT_LENGTH", &val)?;
    }
    if let Ok(val) = std::env::var("REDLINE_DETECTION_PATTERN_LIBRARY") {
        config.detection.pattern_library = Some(val);
    }

    // Redaction overrides
    if let Ok(val) = std::env::var("REDLINE_REDACTION_PDFIUM_LIBRARY_PATH") {
        config.redaction.pdfium_library_path = Some(val);
    }
    if let Ok(val) = std::env::var("REDLINE_REDACTION_RENDER_DPI") {
        config.redaction.render_dpi = parse_number("REDLINE_REDACTION_RENDER_DPI", &val)?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("REDLINE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_flag(&val);
    }
    if let Ok(val) = std::env::var("REDLINE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
