//! Extraction orchestrator - decides which path produces page text
//!
//! `auto` tries the remote parser and falls back to local OCR; `parser` and
//! `ocr` restrict extraction to one path. Either path must yield at least
//! [`MIN_CONTENT_CHARS`] non-whitespace characters across the document.

use crate::adapters::document::MarkableDocument;
use crate::adapters::ocr::{recognize_page, OcrEngine};
use crate::adapters::parser::{DocumentParser, ParserClient};
use crate::config::{OcrConfig, RedlineConfig};
use crate::core::progress::{ProgressReporter, ProgressUpdate, Stage};
use crate::domain::page::total_content_chars;
use crate::domain::{
    ExtractedPage, ExtractionError, ExtractionMethod, ExtractionMode, RedlineError, Result,
};
use std::sync::Arc;

/// Fewest non-whitespace characters an extraction must produce
pub const MIN_CONTENT_CHARS: usize = 10;

/// Pages produced by a successful extraction
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub pages: Vec<ExtractedPage>,
    pub method: ExtractionMethod,
}

/// Chooses between the remote parser and local OCR
pub struct ExtractionOrchestrator {
    parser: Arc<dyn DocumentParser>,
    ocr: Option<Arc<OcrEngine>>,
    ocr_config: OcrConfig,
}

impl ExtractionOrchestrator {
    /// Create an orchestrator; `ocr` is `None` when local OCR is disabled
    pub fn new(
        parser: Arc<dyn DocumentParser>,
        ocr: Option<Arc<OcrEngine>>,
        ocr_config: OcrConfig,
    ) -> Self {
        Self {
            parser,
            ocr,
            ocr_config,
        }
    }

    /// Wire the HTTP parser client and the ONNX engine from configuration
    pub fn from_config(config: &RedlineConfig) -> Result<Self> {
        let parser = Arc::new(ParserClient::new(config.parser.clone())?);
        let ocr = config
            .ocr
            .enabled
            .then(|| Arc::new(OcrEngine::from_config(&config.ocr)));
        Ok(Self::new(parser, ocr, config.ocr.clone()))
    }

    pub fn ocr_engine(&self) -> Option<&Arc<OcrEngine>> {
        self.ocr.as_ref()
    }

    /// Extract page text according to `mode`
    ///
    /// Pages are rendered on the calling task because `doc` cannot leave it.
    /// Model loading and stripe recognition run on tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::NoMethodSucceeded`] when every path allowed
    /// by `mode` failed or produced too little text.
    pub async fn extract(
        &self,
        bytes: &[u8],
        file_name: &str,
        doc: &dyn MarkableDocument,
        mode: ExtractionMode,
        progress: &ProgressReporter,
    ) -> Result<ExtractionOutcome> {
        tracing::info!(mode = %mode, file = %file_name, "Starting text extraction");

        let result = match mode {
            ExtractionMode::Parser => self
                .via_parser(bytes, file_name, progress)
                .await
                .map_err(|e| e.to_string()),
            ExtractionMode::Ocr => self
                .via_ocr(doc, progress)
                .await
                .map_err(|e| e.to_string()),
            ExtractionMode::Auto => match self.via_parser(bytes, file_name, progress).await {
                Ok(outcome) => Ok(outcome),
                Err(parser_err) => {
                    tracing::warn!(error = %parser_err, "Parser path failed, falling back to OCR");
                    self.via_ocr(doc, progress)
                        .await
                        .map_err(|ocr_err| format!("parser: {parser_err}; ocr: {ocr_err}"))
                }
            },
        };

        match result {
            Ok(outcome) => {
                tracing::info!(
                    method = %outcome.method,
                    pages = outcome.pages.len(),
                    chars = total_content_chars(&outcome.pages),
                    "Text extraction succeeded"
                );
                Ok(outcome)
            }
            Err(reason) => {
                let err = ExtractionError::NoMethodSucceeded {
                    mode: mode.to_string(),
                    reason,
                };
                crate::log_error_with_context!(err, "text extraction");
                Err(err.into())
            }
        }
    }

    async fn via_parser(
        &self,
        bytes: &[u8],
        file_name: &str,
        progress: &ProgressReporter,
    ) -> std::result::Result<ExtractionOutcome, ExtractionError> {
        progress.emit(
            ProgressUpdate::stage(Stage::ParsingExternal).with_method(ExtractionMethod::Parser),
        );

        let pages = self.parser.extract_pages(bytes, file_name).await?;
        accept(pages, ExtractionMethod::Parser)
    }

    async fn via_ocr(
        &self,
        doc: &dyn MarkableDocument,
        progress: &ProgressReporter,
    ) -> Result<ExtractionOutcome> {
        let engine = self
            .ocr
            .as_ref()
            .ok_or_else(|| ExtractionError::OcrUnavailable("local OCR is disabled".to_string()))?;

        progress.emit(
            ProgressUpdate::stage(Stage::OcrInitializing).with_method(ExtractionMethod::Ocr),
        );
        let loading = Arc::clone(engine);
        run_blocking(move || loading.initialize()).await?;

        let total = doc.page_count();
        let mut pages = Vec::with_capacity(total);
        for index in 0..total {
            progress.emit(
                ProgressUpdate::stage(Stage::OcrInitializing)
                    .with_pages(index + 1, total)
                    .with_message(format!("Recognizing page {} of {}", index + 1, total)),
            );
            let size = doc.page_size(index)?;
            let image = doc.rasterize_page(index, self.ocr_config.render_zoom)?;
            let engine = Arc::clone(engine);
            let config = self.ocr_config.clone();
            let page = run_blocking(move || {
                Ok(recognize_page(index, &image, size, &config, &engine))
            })
            .await?;
            pages.push(page);
        }

        Ok(accept(pages, ExtractionMethod::Ocr)?)
    }
}

/// Run model work on the blocking pool so the runtime's workers stay free
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| RedlineError::Ocr(format!("Recognition task did not complete: {e}")))?
}

fn accept(
    pages: Vec<ExtractedPage>,
    method: ExtractionMethod,
) -> std::result::Result<ExtractionOutcome, ExtractionError> {
    let chars = total_content_chars(&pages);
    if chars < MIN_CONTENT_CHARS {
        return Err(ExtractionError::InsufficientText {
            method: method.to_string(),
            chars,
        });
    }
    Ok(ExtractionOutcome { pages, method })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::document::MemoryDocument;
    use crate::adapters::ocr::engine::tests::FixedLoader;
    use crate::adapters::ocr::{RecognizerLoader, TextRecognizer};
    use crate::core::progress::ProgressRegistry;
    use async_trait::async_trait;
    use image::DynamicImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread::ThreadId;

    pub(crate) struct FakeParser {
        pages: std::result::Result<Vec<&'static str>, u16>,
        pub(crate) calls: AtomicUsize,
    }

    impl FakeParser {
        pub(crate) fn answering(pages: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                pages: Ok(pages),
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                pages: Err(status),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DocumentParser for FakeParser {
        async fn extract_pages(
            &self,
            _bytes: &[u8],
            _file_name: &str,
        ) -> std::result::Result<Vec<ExtractedPage>, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.pages {
                Ok(pages) => Ok(pages
                    .iter()
                    .enumerate()
                    .map(|(i, text)| ExtractedPage::new(i + 1, *text))
                    .collect()),
                Err(status) => Err(ExtractionError::HttpStatus {
                    status: *status,
                    message: "unavailable".to_string(),
                }),
            }
        }
    }

    /// Notes the thread every stripe is recognized on
    struct ThreadRecorder(Arc<Mutex<Vec<ThreadId>>>);

    impl TextRecognizer for ThreadRecorder {
        fn recognize(&mut self, _image: &DynamicImage) -> Result<String> {
            self.0.lock().unwrap().push(std::thread::current().id());
            Ok("texto reconocido".to_string())
        }
    }

    impl RecognizerLoader for ThreadRecorder {
        fn is_available(&self) -> bool {
            true
        }

        fn load(&self) -> Result<Box<dyn TextRecognizer + Send>> {
            Ok(Box::new(ThreadRecorder(Arc::clone(&self.0))))
        }
    }

    fn orchestrator(parser: Arc<FakeParser>, ocr_text: Option<&str>) -> ExtractionOrchestrator {
        let ocr = ocr_text.map(|text| Arc::new(OcrEngine::new(FixedLoader::new(text))));
        ExtractionOrchestrator::new(parser, ocr, OcrConfig::default())
    }

    #[tokio::test]
    async fn test_auto_accepts_parser_text() {
        let parser = FakeParser::answering(vec!["Contrato de arrendamiento"]);
        let orchestrator = orchestrator(parser.clone(), Some("ocr text here"));
        let doc = MemoryDocument::from_text("x");

        let outcome = orchestrator
            .extract(b"%PDF", "a.pdf", &doc, ExtractionMode::Auto, &ProgressReporter::noop())
            .await
            .unwrap();

        assert_eq!(outcome.method, ExtractionMethod::Parser);
        assert_eq!(outcome.pages[0].text, "Contrato de arrendamiento");
        assert!(!orchestrator.ocr_engine().unwrap().is_loaded());
    }

    #[tokio::test]
    async fn test_auto_falls_back_on_short_parser_text() {
        let parser = FakeParser::answering(vec!["  abc \n"]);
        let orchestrator = orchestrator(parser, Some("texto reconocido"));
        let doc = MemoryDocument::from_text("texto reconocido");

        let outcome = orchestrator
            .extract(b"%PDF", "a.pdf", &doc, ExtractionMode::Auto, &ProgressReporter::noop())
            .await
            .unwrap();

        assert_eq!(outcome.method, ExtractionMethod::Ocr);
        assert!(outcome.pages[0].lines.is_some());
    }

    #[tokio::test]
    async fn test_parser_mode_is_terminal() {
        let parser = FakeParser::failing(503);
        let orchestrator = orchestrator(parser.clone(), Some("texto reconocido"));
        let doc = MemoryDocument::from_text("x");

        let err = orchestrator
            .extract(b"%PDF", "a.pdf", &doc, ExtractionMode::Parser, &ProgressReporter::noop())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("mode: parser"));
        assert_eq!(parser.calls.load(Ordering::SeqCst), 1);
        assert!(!orchestrator.ocr_engine().unwrap().is_loaded());
    }

    #[tokio::test]
    async fn test_ocr_mode_skips_parser() {
        let parser = FakeParser::answering(vec!["never used by this mode"]);
        let orchestrator = orchestrator(parser.clone(), Some("texto reconocido"));
        let doc = MemoryDocument::from_text("x");

        let outcome = orchestrator
            .extract(b"%PDF", "a.pdf", &doc, ExtractionMode::Ocr, &ProgressReporter::noop())
            .await
            .unwrap();

        assert_eq!(outcome.method, ExtractionMethod::Ocr);
        assert_eq!(parser.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recognition_runs_off_the_runtime_thread() {
        let threads = Arc::new(Mutex::new(Vec::new()));
        let engine = Arc::new(OcrEngine::new(ThreadRecorder(Arc::clone(&threads))));
        let orchestrator = ExtractionOrchestrator::new(
            FakeParser::answering(vec![]),
            Some(engine),
            OcrConfig::default(),
        );
        let doc = MemoryDocument::from_text("uno\x0cdos");

        let outcome = orchestrator
            .extract(b"%PDF", "a.pdf", &doc, ExtractionMode::Ocr, &ProgressReporter::noop())
            .await
            .unwrap();

        assert_eq!(outcome.pages.len(), 2);
        assert_eq!(outcome.pages[1].page_number, 2);
        let runtime_thread = std::thread::current().id();
        let threads = threads.lock().unwrap();
        assert!(!threads.is_empty());
        assert!(threads.iter().all(|id| *id != runtime_thread));
    }

    #[tokio::test]
    async fn test_auto_fails_when_ocr_disabled() {
        let parser = FakeParser::failing(500);
        let orchestrator = orchestrator(parser, None);
        let doc = MemoryDocument::from_text("x");

        let err = orchestrator
            .extract(b"%PDF", "a.pdf", &doc, ExtractionMode::Auto, &ProgressReporter::noop())
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("mode: auto"));
        assert!(message.contains("local OCR is disabled"));
    }

    #[tokio::test]
    async fn test_progress_reports_method() {
        let registry = Arc::new(ProgressRegistry::new());
        let progress = ProgressReporter::new(registry.sink("job-1"));
        let parser = FakeParser::answering(vec!["Contrato de arrendamiento"]);
        let orchestrator = orchestrator(parser, None);
        let doc = MemoryDocument::from_text("x");

        orchestrator
            .extract(b"%PDF", "a.pdf", &doc, ExtractionMode::Auto, &progress)
            .await
            .unwrap();

        let state = registry.get("job-1").unwrap();
        assert_eq!(state.stage, Stage::ParsingExternal);
        assert_eq!(state.percent, 18);
        assert_eq!(state.extraction_method, Some(ExtractionMethod::Parser));
    }
}
