//! Subscriber setup for the redline binary
//!
//! Human-readable events go to stderr. Stdout is left to command output such
//! as `detect --json` and the processing stats. When `logging.local_enabled`
//! is set, the same events are also appended as JSON lines to
//! `<local_path>/redline.log`, rotated per `logging.local_rotation`.
//!
//! The filter admits redline at the configured level. The inference runtime
//! and the HTTP stack are held at `warn` because they are chatty at `debug`
//! while a model session loads or a parser candidate is tried. `RUST_LOG`
//! replaces the whole filter when set.
//!
//! ```no_run
//! use redline::config::LoggingConfig;
//! use redline::logging::init_logging;
//!
//! let _guard = init_logging("debug", &LoggingConfig::default()).expect("logging");
//! ```

use crate::config::LoggingConfig;
use crate::domain::{RedlineError, Result};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_NAME: &str = "redline.log";

/// Dependencies capped at `warn` unless `RUST_LOG` says otherwise
const QUIET_TARGETS: &[&str] = &["ort", "reqwest", "hyper", "pdfium_render"];

/// Keeps the JSON file writer alive; dropping it flushes pending lines
pub struct LoggingGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Install the global subscriber for a redline process
///
/// Fails with a configuration error on an unknown level, an unusable log
/// directory, or a second call in the same process.
pub fn init_logging(log_level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(log_level)?;
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level)))
    };

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter())
        .boxed();

    let (file, file_writer) = if config.local_enabled {
        let rotation = parse_rotation(&config.local_rotation)?;
        let (writer, guard) = json_file_writer(Path::new(&config.local_path), rotation)?;
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .with_thread_names(true)
            .with_writer(writer)
            .with_filter(filter())
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| RedlineError::Configuration(format!("Logging already initialized: {e}")))?;

    tracing::debug!(
        level = %level,
        file_log = config.local_enabled,
        path = %config.local_path,
        "Logging ready"
    );

    Ok(LoggingGuard {
        _file_writer: file_writer,
    })
}

/// Filter directives for a level, e.g. `redline=debug,ort=warn,...`
fn directives(level: Level) -> String {
    let mut directives = format!("redline={}", level.to_string().to_lowercase());
    for target in QUIET_TARGETS {
        directives.push_str(&format!(",{target}=warn"));
    }
    directives
}

fn json_file_writer(dir: &Path, rotation: Rotation) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir).map_err(|e| {
        RedlineError::Configuration(format!(
            "Cannot create log directory {}: {e}",
            dir.display()
        ))
    })?;
    let appender = RollingFileAppender::new(rotation, dir, LOG_FILE_NAME);
    Ok(tracing_appender::non_blocking(appender))
}

fn parse_rotation(value: &str) -> Result<Rotation> {
    match value {
        "daily" => Ok(Rotation::DAILY),
        "hourly" => Ok(Rotation::HOURLY),
        "never" => Ok(Rotation::NEVER),
        other => Err(RedlineError::Configuration(format!(
            "Unknown log rotation '{other}', expected daily, hourly or never"
        ))),
    }
}

fn parse_log_level(value: &str) -> Result<Level> {
    value.trim().parse::<Level>().map_err(|_| {
        RedlineError::Configuration(format!(
            "Unknown log level '{value}', expected trace, debug, info, warn or error"
        ))
    })
}
