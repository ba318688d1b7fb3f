//! Job progress reporting
//!
//! The pipeline pushes partial [`ProgressUpdate`]s through a
//! [`ProgressReporter`]; a [`ProgressRegistry`] merges them last-write-wins
//! into one [`ProgressState`] per job id so callers can poll it.

use crate::domain::ExtractionMethod;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

/// Highest percent a non-terminal update may carry
pub const MAX_RUNNING_PERCENT: u8 = 99;

/// Pipeline stage reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Preparing,
    ParsingExternal,
    OcrInitializing,
    OpeningDocument,
    ParserPage,
    OcrPage,
    Finalizing,
    Done,
    Error,
}

impl Stage {
    /// Percent conventionally reported when the stage starts
    pub fn base_percent(&self) -> u8 {
        match self {
            Stage::Preparing => 12,
            Stage::ParsingExternal | Stage::OcrInitializing => 18,
            Stage::OpeningDocument | Stage::ParserPage | Stage::OcrPage => 20,
            Stage::Finalizing => 97,
            Stage::Done => 100,
            Stage::Error => 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Error)
    }
}

/// Percent for a page loop: 20 + 75 * done / total, capped at 95
pub fn page_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 20;
    }
    let pct = 20 + (75 * done.min(total)) / total;
    pct.min(95) as u8
}

/// Partial update; `None` fields leave the stored value unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<ExtractionMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressUpdate {
    /// Update entering `stage` at its base percent
    pub fn stage(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            percent: Some(stage.base_percent()),
            ..Default::default()
        }
    }

    /// Terminal success update
    pub fn done() -> Self {
        Self {
            stage: Some(Stage::Done),
            percent: Some(100),
            done: Some(true),
            ..Default::default()
        }
    }

    /// Terminal failure update
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            stage: Some(Stage::Error),
            done: Some(true),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_percent(mut self, percent: u8) -> Self {
        self.percent = Some(percent);
        self
    }

    pub fn with_pages(mut self, current: usize, total: usize) -> Self {
        self.current_page = Some(current);
        self.total_pages = Some(total);
        self
    }

    pub fn with_method(mut self, method: ExtractionMethod) -> Self {
        self.extraction_method = Some(method);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.done == Some(true) || self.stage.is_some_and(|s| s.is_terminal())
    }

    /// Clamp percent to the running range unless the update is terminal
    fn clamped(mut self) -> Self {
        let terminal = self.is_terminal();
        if let Some(pct) = self.percent.as_mut() {
            *pct = if terminal {
                (*pct).min(100)
            } else {
                (*pct).min(MAX_RUNNING_PERCENT)
            };
        }
        self
    }
}

/// Merged progress of one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub stage: Stage,
    pub percent: u8,
    pub current_page: Option<usize>,
    pub total_pages: Option<usize>,
    pub extraction_method: Option<ExtractionMethod>,
    pub done: bool,
    pub message: Option<String>,
    /// Milliseconds since the Unix epoch, UTC
    pub updated_at: i64,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            stage: Stage::Preparing,
            percent: 0,
            current_page: None,
            total_pages: None,
            extraction_method: None,
            done: false,
            message: None,
            updated_at: Utc::now().timestamp_millis(),
        }
    }
}

impl ProgressState {
    /// Merge an update, last write wins per field
    pub fn apply(&mut self, update: ProgressUpdate) {
        let update = update.clamped();
        if let Some(stage) = update.stage {
            self.stage = stage;
        }
        if let Some(percent) = update.percent {
            self.percent = percent;
        }
        if update.current_page.is_some() {
            self.current_page = update.current_page;
        }
        if update.total_pages.is_some() {
            self.total_pages = update.total_pages;
        }
        if update.extraction_method.is_some() {
            self.extraction_method = update.extraction_method;
        }
        if let Some(done) = update.done {
            self.done = done;
        }
        if update.message.is_some() {
            self.message = update.message;
        }
        self.updated_at = Utc::now().timestamp_millis();
    }
}

/// Callback receiving progress updates
pub type ProgressSink = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Emits clamped updates to an optional sink
#[derive(Clone, Default)]
pub struct ProgressReporter {
    sink: Option<ProgressSink>,
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}

impl ProgressReporter {
    pub fn new(sink: ProgressSink) -> Self {
        Self { sink: Some(sink) }
    }

    /// Reporter that drops every update
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn from_option(sink: Option<ProgressSink>) -> Self {
        Self { sink }
    }

    pub fn emit(&self, update: ProgressUpdate) {
        if let Some(sink) = &self.sink {
            sink(update.clamped());
        }
    }
}

/// Process-wide progress table keyed by job id
///
/// Entries are never expired; callers clear them when they are done polling.
#[derive(Debug, Default)]
pub struct ProgressRegistry {
    states: Mutex<HashMap<String, ProgressState>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared registry for the process
    pub fn global() -> Arc<ProgressRegistry> {
        static GLOBAL: OnceLock<Arc<ProgressRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ProgressRegistry::new())))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ProgressState>> {
        // A panic while holding the lock cannot leave a state half-merged
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Merge an update into the job's state, creating it if needed
    pub fn apply(&self, job_id: &str, update: ProgressUpdate) {
        let mut states = self.lock();
        states
            .entry(job_id.to_string())
            .or_default()
            .apply(update);
    }

    pub fn get(&self, job_id: &str) -> Option<ProgressState> {
        self.lock().get(job_id).cloned()
    }

    /// Remove a job's state, returning the last value
    pub fn clear(&self, job_id: &str) -> Option<ProgressState> {
        self.lock().remove(job_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Callback that merges updates into `job_id`'s state
    pub fn sink(self: &Arc<Self>, job_id: impl Into<String>) -> ProgressSink {
        let registry = Arc::clone(self);
        let job_id = job_id.into();
        Arc::new(move |update| registry.apply(&job_id, update))
    }
}
