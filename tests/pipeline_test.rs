//! End-to-end runs over the in-memory document backend

mod common;

use common::{pages_body, parser_config, scripted_ocr};
use redline::adapters::document::MemoryLoader;
use redline::adapters::parser::ParserClient;
use redline::config::{DetectionConfig, LocalizationConfig, OcrConfig};
use redline::core::detection::DetectionEngine;
use redline::core::extraction::ExtractionOrchestrator;
use redline::core::localize::Localizer;
use redline::core::pipeline::{ProcessRequest, RedactionPipeline};
use redline::core::progress::{ProgressRegistry, ProgressReporter, Stage};
use redline::domain::{Category, CategorySelection, ExtractionMethod, ExtractionMode, MarkAction};
use std::sync::Arc;

const DOCUMENT: &str = "Contacto: ana.garcia@example.com\nIBAN ES91 2100 0418 4502 0005 1332";

fn pipeline(base_url: &str, ocr_text: &str) -> RedactionPipeline {
    let parser = Arc::new(ParserClient::new(parser_config(base_url)).unwrap());
    let (ocr, _) = scripted_ocr(ocr_text);
    RedactionPipeline::new(
        DetectionEngine::from_config(&DetectionConfig::default()).unwrap(),
        Localizer::new(&LocalizationConfig::default()),
        ExtractionOrchestrator::new(parser, Some(ocr), OcrConfig::default()),
        Box::new(MemoryLoader),
    )
}

fn request(action: MarkAction) -> ProcessRequest<'static> {
    let mut request = ProcessRequest::new(DOCUMENT.as_bytes(), "contrato.pdf");
    request.categories = CategorySelection::only([Category::Email, Category::Iban]);
    request.action = action;
    request
}

/// Server and its mock; the mock must stay alive for the whole test
async fn parser_server(pages: &[&str]) -> (mockito::ServerGuard, mockito::Mock) {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/parse")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(pages_body(pages))
        .create_async()
        .await;
    (server, mock)
}

#[tokio::test]
async fn test_highlight_email_and_iban() {
    let (server, _mock) = parser_server(&[DOCUMENT]).await;
    let pipeline = pipeline(&server.url(), "unused");

    let outcome = pipeline.process(request(MarkAction::Highlight)).await.unwrap();

    let stats = &outcome.stats;
    assert_eq!(stats.total_matches, 2);
    assert_eq!(stats.count(Category::Email), 1);
    assert_eq!(stats.count(Category::Iban), 1);
    assert_eq!(stats.pages_processed, 1);
    assert_eq!(stats.skipped_matches, 0);
    assert_eq!(stats.rects_marked, 2);
    assert_eq!(stats.extraction_method, Some(ExtractionMethod::Parser));

    let saved: serde_json::Value = serde_json::from_slice(&outcome.bytes).unwrap();
    let marks = saved["marks"].as_array().unwrap();
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0]["action"], "highlight");
    assert_eq!(marks[0]["rects"].as_array().unwrap().len(), 2);
    assert!(saved["pages"][0]
        .as_str()
        .unwrap()
        .contains("ana.garcia@example.com"));
}

#[tokio::test]
async fn test_redact_removes_text() {
    let (server, _mock) = parser_server(&[DOCUMENT]).await;
    let pipeline = pipeline(&server.url(), "unused");

    let outcome = pipeline.process(request(MarkAction::Redact)).await.unwrap();

    let saved: serde_json::Value = serde_json::from_slice(&outcome.bytes).unwrap();
    let page = saved["pages"][0].as_str().unwrap();
    assert!(!page.contains("ana.garcia@example.com"));
    assert!(!page.contains("ES91"));
    assert!(page.contains("Contacto:"));
    assert_eq!(saved["marks"][0]["action"], "redact");
}

#[tokio::test]
async fn test_ocr_mode_skips_parser() {
    let mut server = mockito::Server::new_async().await;
    let parser = server
        .mock("POST", "/parse")
        .expect(0)
        .create_async()
        .await;
    let pipeline = pipeline(&server.url(), "Contacto: ana.garcia@example.com");

    let mut req = request(MarkAction::Highlight);
    req.mode = ExtractionMode::Ocr;
    let outcome = pipeline.process(req).await.unwrap();

    parser.assert_async().await;
    assert_eq!(outcome.stats.extraction_method, Some(ExtractionMethod::Ocr));
    assert!(outcome.stats.count(Category::Email) >= 1);
    assert!(outcome.stats.rects_marked >= 1);
}

#[tokio::test]
async fn test_progress_reaches_done() {
    let (server, _mock) = parser_server(&[DOCUMENT]).await;
    let pipeline = pipeline(&server.url(), "unused");
    let registry = Arc::new(ProgressRegistry::new());

    let mut req = request(MarkAction::Highlight);
    req.progress = ProgressReporter::new(registry.sink("job-1"));
    pipeline.process(req).await.unwrap();

    let state = registry.get("job-1").unwrap();
    assert!(state.done);
    assert_eq!(state.stage, Stage::Done);
    assert_eq!(state.percent, 100);
    assert_eq!(state.extraction_method, Some(ExtractionMethod::Parser));
}

#[tokio::test]
async fn test_unusable_extraction_reports_error() {
    let (server, _mock) = parser_server(&["   "]).await;
    let pipeline = pipeline(&server.url(), "unused");
    let registry = Arc::new(ProgressRegistry::new());

    let mut req = request(MarkAction::Highlight);
    req.mode = ExtractionMode::Parser;
    req.progress = ProgressReporter::new(registry.sink("job-2"));
    let result = pipeline.process(req).await;

    assert!(result.is_err());
    let state = registry.get("job-2").unwrap();
    assert_eq!(state.stage, Stage::Error);
    assert!(state.done);
    assert!(state.message.is_some());
}
