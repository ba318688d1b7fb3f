//! Pipeline coordinator - drives one document from bytes to marked bytes
//!
//! The document is opened once, its text extracted, then every page is
//! detected, localized and marked in increasing order. A page's marks are
//! committed before the next page starts. The document is only serialized
//! after the last page, so a failed run never produces partial output.

use super::stats::ProcessingStats;
use crate::adapters::document::{DocumentLoader, MarkableDocument};
use crate::config::RedlineConfig;
use crate::core::detection::DetectionEngine;
use crate::core::extraction::{ExtractionOrchestrator, ExtractionOutcome};
use crate::core::localize::Localizer;
use crate::core::progress::{page_percent, ProgressReporter, ProgressUpdate, Stage};
use crate::domain::{
    CategorySelection, ExtractedPage, ExtractionMethod, ExtractionMode, MarkAction, Rect,
    RedlineError, Result, SensitivityLevel,
};
use anyhow::Context;
use std::time::Instant;
use tokio::sync::watch;

/// Everything a caller supplies for one run
pub struct ProcessRequest<'a> {
    pub bytes: &'a [u8],
    /// Name sent along with the upload to the parser service
    pub file_name: &'a str,
    pub categories: CategorySelection,
    pub sensitivity: SensitivityLevel,
    pub action: MarkAction,
    pub mode: ExtractionMode,
    pub progress: ProgressReporter,
    /// Checked between pages; `true` stops the run
    pub cancel: Option<watch::Receiver<bool>>,
}

impl<'a> ProcessRequest<'a> {
    /// Request with default options: every category, normal sensitivity,
    /// highlight, auto extraction
    pub fn new(bytes: &'a [u8], file_name: &'a str) -> Self {
        Self {
            bytes,
            file_name,
            categories: CategorySelection::all(),
            sensitivity: SensitivityLevel::default(),
            action: MarkAction::default(),
            mode: ExtractionMode::default(),
            progress: ProgressReporter::noop(),
            cancel: None,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

/// Marked document and run statistics
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub bytes: Vec<u8>,
    pub stats: ProcessingStats,
}

/// Detection, localization and marking over a whole document
pub struct RedactionPipeline {
    engine: DetectionEngine,
    localizer: Localizer,
    extractor: ExtractionOrchestrator,
    loader: Box<dyn DocumentLoader>,
}

impl RedactionPipeline {
    pub fn new(
        engine: DetectionEngine,
        localizer: Localizer,
        extractor: ExtractionOrchestrator,
        loader: Box<dyn DocumentLoader>,
    ) -> Self {
        Self {
            engine,
            localizer,
            extractor,
            loader,
        }
    }

    /// Build every component from configuration
    pub fn from_config(
        config: &RedlineConfig,
        loader: Box<dyn DocumentLoader>,
    ) -> anyhow::Result<Self> {
        let engine = DetectionEngine::from_config(&config.detection)
            .context("Failed to build detection engine")?;
        let localizer = Localizer::new(&config.localization);
        let extractor = ExtractionOrchestrator::from_config(config)
            .context("Failed to build extraction orchestrator")?;
        Ok(Self::new(engine, localizer, extractor, loader))
    }

    pub fn engine(&self) -> &DetectionEngine {
        &self.engine
    }

    pub fn extractor(&self) -> &ExtractionOrchestrator {
        &self.extractor
    }

    /// Process one document
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be opened, no extraction path
    /// succeeded, marking or saving failed, or the run was cancelled. An error
    /// update is pushed to the progress sink in every case.
    pub async fn process(&self, request: ProcessRequest<'_>) -> Result<ProcessOutcome> {
        let started = Instant::now();
        let progress = request.progress.clone();

        match self.run(&request).await {
            Ok(mut outcome) => {
                outcome.stats.duration = started.elapsed();
                outcome.stats.log_summary();
                progress.emit(ProgressUpdate::done());
                Ok(outcome)
            }
            Err(e) => {
                crate::log_error_with_context!(e, "document processing");
                progress.emit(ProgressUpdate::error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn run(&self, request: &ProcessRequest<'_>) -> Result<ProcessOutcome> {
        let progress = &request.progress;
        progress.emit(ProgressUpdate::stage(Stage::Preparing));

        let mut doc = self.loader.open(request.bytes)?;
        let page_count = doc.page_count();
        tracing::info!(
            pages = page_count,
            action = ?request.action,
            sensitivity = ?request.sensitivity,
            "Document opened"
        );

        if request.is_cancelled() {
            return Err(RedlineError::Cancelled);
        }

        let ExtractionOutcome { pages, method } = self
            .extractor
            .extract(
                request.bytes,
                request.file_name,
                doc.as_ref(),
                request.mode,
                progress,
            )
            .await?;

        let total = doc.page_count();
        progress.emit(
            ProgressUpdate::stage(Stage::OpeningDocument)
                .with_method(method)
                .with_pages(0, total),
        );

        let extra = pages.iter().filter(|p| p.page_number > total).count();
        if extra > 0 {
            tracing::warn!(
                extra_pages = extra,
                document_pages = total,
                "Extracted pages have no counterpart in the document"
            );
        }

        let mut stats = ProcessingStats::new();
        stats.extraction_method = Some(method);
        let page_stage = match method {
            ExtractionMethod::Parser => Stage::ParserPage,
            ExtractionMethod::Ocr => Stage::OcrPage,
        };

        for index in 0..total {
            let page_number = index + 1;
            if request.is_cancelled() {
                tracing::warn!(page = page_number, "Processing cancelled");
                return Err(RedlineError::Cancelled);
            }

            let blank;
            let page = match pages.iter().find(|p| p.page_number == page_number) {
                Some(page) => page,
                None => {
                    tracing::warn!(page = page_number, "No extracted text for page");
                    blank = ExtractedPage::new(page_number, "");
                    &blank
                }
            };

            self.process_page(doc.as_mut(), index, page, request, &mut stats)?;

            progress.emit(
                ProgressUpdate::stage(page_stage)
                    .with_percent(page_percent(page_number, total))
                    .with_pages(page_number, total)
                    .with_method(method),
            );
        }

        progress.emit(ProgressUpdate::stage(Stage::Finalizing).with_method(method));
        let bytes = doc.save_to_bytes()?;

        Ok(ProcessOutcome { bytes, stats })
    }

    fn process_page(
        &self,
        doc: &mut dyn MarkableDocument,
        index: usize,
        page: &ExtractedPage,
        request: &ProcessRequest<'_>,
        stats: &mut ProcessingStats,
    ) -> Result<()> {
        let page_number = page.page_number;

        let matches = self
            .engine
            .detect(&page.text, &request.categories, request.sensitivity);

        let glyphs = doc.page_glyphs(index).unwrap_or_else(|e| {
            tracing::warn!(page = page_number, error = %e, "Text layer unavailable");
            Vec::new()
        });
        let layout = self.localizer.layout(glyphs);

        let mut rects: Vec<Rect> = Vec::new();
        let mut skipped = 0;
        for m in &matches {
            stats.record_match(page_number, m.category);
            match self.localizer.locate(&layout, page.ocr_lines(), m) {
                Some(region) => {
                    tracing::trace!(
                        page = page_number,
                        category = %m.category,
                        strategy = %region.strategy,
                        rects = region.rects.len(),
                        "Match located"
                    );
                    for rect in region.rects {
                        if !rects.contains(&rect) {
                            rects.push(rect);
                        }
                    }
                }
                None => {
                    tracing::debug!(
                        page = page_number,
                        category = %m.category,
                        preview = %m.preview(),
                        "Match could not be located"
                    );
                    stats.record_skipped();
                    skipped += 1;
                }
            }
        }

        doc.mark(index, request.action, &rects)?;
        stats.record_page(rects.len());

        crate::log_page_processed!(page_number, doc.page_count(), rects.len(), skipped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::document::MemoryLoader;
    use crate::config::{LocalizationConfig, OcrConfig};
    use crate::core::detection::PatternLibrary;
    use crate::core::extraction::orchestrator::tests::FakeParser;
    use crate::core::progress::ProgressRegistry;
    use crate::domain::Category;
    use std::sync::Arc;

    const PAGE: &str = "Contacto: ana.garcia@example.com";

    fn pipeline(parser_pages: Vec<&'static str>) -> RedactionPipeline {
        let library = Arc::new(PatternLibrary::default_patterns().unwrap());
        let engine = DetectionEngine::new(library, 50);
        let extractor =
            ExtractionOrchestrator::new(FakeParser::answering(parser_pages), None, OcrConfig::default());
        RedactionPipeline::new(
            engine,
            Localizer::new(&LocalizationConfig::default()),
            extractor,
            Box::new(MemoryLoader),
        )
    }

    #[tokio::test]
    async fn test_progress_ends_with_done() {
        let pipeline = pipeline(vec![PAGE]);
        let registry = Arc::new(ProgressRegistry::new());
        let mut request = ProcessRequest::new(PAGE.as_bytes(), "doc.txt");
        request.categories = CategorySelection::only([Category::Email]);
        request.progress = ProgressReporter::new(registry.sink("job"));

        let outcome = pipeline.process(request).await.unwrap();

        assert_eq!(outcome.stats.count(Category::Email), 1);
        assert_eq!(outcome.stats.rects_marked, 1);
        let state = registry.get("job").unwrap();
        assert_eq!(state.stage, Stage::Done);
        assert_eq!(state.percent, 100);
        assert_eq!(state.extraction_method, Some(ExtractionMethod::Parser));
    }

    #[tokio::test]
    async fn test_cancelled_run_returns_no_bytes() {
        let pipeline = pipeline(vec![PAGE]);
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let mut request = ProcessRequest::new(PAGE.as_bytes(), "doc.txt");
        request.cancel = Some(rx);

        let err = pipeline.process(request).await.unwrap_err();
        assert!(matches!(err, RedlineError::Cancelled));
    }

    #[tokio::test]
    async fn test_extra_parser_pages_are_ignored() {
        let pipeline = pipeline(vec![PAGE, "Segunda pagina con bob@example.org"]);
        let mut request = ProcessRequest::new(PAGE.as_bytes(), "doc.txt");
        request.categories = CategorySelection::only([Category::Email]);

        let outcome = pipeline.process(request).await.unwrap();
        assert_eq!(outcome.stats.pages_processed, 1);
        assert_eq!(outcome.stats.total_matches, 1);
    }

    #[tokio::test]
    async fn test_every_document_page_processed_when_parser_returns_fewer() {
        let document = format!("{PAGE}\x0cSegunda pagina\x0cTercera pagina");
        let pipeline = pipeline(vec![PAGE]);
        let registry = Arc::new(ProgressRegistry::new());
        let mut request = ProcessRequest::new(document.as_bytes(), "doc.txt");
        request.categories = CategorySelection::only([Category::Email]);
        request.progress = ProgressReporter::new(registry.sink("job"));

        let outcome = pipeline.process(request).await.unwrap();

        assert_eq!(outcome.stats.pages_processed, 3);
        assert_eq!(outcome.stats.count(Category::Email), 1);
        let state = registry.get("job").unwrap();
        assert_eq!(state.total_pages, Some(3));
        assert_eq!(state.current_page, Some(3));
    }

    #[tokio::test]
    async fn test_extraction_failure_reports_error() {
        let pipeline = pipeline(vec!["   "]);
        let registry = Arc::new(ProgressRegistry::new());
        let mut request = ProcessRequest::new(PAGE.as_bytes(), "doc.txt");
        request.progress = ProgressReporter::new(registry.sink("job"));

        let err = pipeline.process(request).await.unwrap_err();
        assert!(matches!(err, RedlineError::Extraction(_)));

        let state = registry.get("job").unwrap();
        assert_eq!(state.stage, Stage::Error);
        assert!(state.done);
        assert!(state.message.unwrap().contains("No extraction method succeeded"));
    }
}
