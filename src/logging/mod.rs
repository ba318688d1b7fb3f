//! Logging for redline runs
//!
//! [`init_logging`] installs the subscriber. The macros below cover events
//! that repeat on every run, one per parser candidate or finished page.
//!
//! Matched values never go to the log verbatim; use [`crate::domain::Match::preview`].
//!
//! # Example
//!
//! ```no_run
//! use redline::logging::init_logging;
//! use redline::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(pages = 3, "Document opened");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log an attempt against one parser candidate
///
/// # Example
///
/// ```no_run
/// use redline::log_candidate_attempt;
///
/// log_candidate_attempt!(1, 3, "http://127.0.0.1:1000");
/// ```
#[macro_export]
macro_rules! log_candidate_attempt {
    ($attempt:expr, $total:expr, $url:expr) => {
        tracing::info!(
            attempt = $attempt,
            candidates = $total,
            url = %$url,
            "Calling parser service"
        );
    };
}

/// Log the outcome of one page
///
/// # Example
///
/// ```no_run
/// use redline::log_page_processed;
///
/// log_page_processed!(2, 10, 4, 1);
/// ```
#[macro_export]
macro_rules! log_page_processed {
    ($page:expr, $total:expr, $marked:expr, $skipped:expr) => {
        tracing::debug!(
            page = $page,
            total_pages = $total,
            marked = $marked,
            skipped = $skipped,
            progress_pct = ($page as f64 / ($total as f64).max(1.0) * 100.0),
            "Page processed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use redline::log_error_with_context;
/// use redline::domain::RedlineError;
///
/// let error = RedlineError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
