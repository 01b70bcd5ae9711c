//! End-to-end pipeline: extraction, chunking, analysis, result assembly.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use deckaudit_common::config::AuditConfig;
use deckaudit_engine::analyzer::detect_inconsistencies;
use deckaudit_engine::backend::ReasoningBackend;
use deckaudit_engine::models::AnalysisResult;
use deckaudit_ingestion::blocks::Deck;
use deckaudit_ingestion::chunker::{chunk_corpus, ChunkerConfig};
use deckaudit_ingestion::extractor::extract_deck;
use deckaudit_ingestion::ocr::OcrEngine;

/// Run the whole audit over an already-parsed deck. Engine failures are
/// contained per chunk and surface as unanalyzed ranges, so the pipeline
/// itself cannot fail once the deck is parsed.
pub async fn run(
    deck: &Deck,
    ocr: Arc<dyn OcrEngine>,
    backend: Arc<dyn ReasoningBackend>,
    cfg: &AuditConfig,
    cancel: Arc<AtomicBool>,
) -> AnalysisResult {
    let started = Instant::now();

    let corpus = extract_deck(deck, ocr, cfg).await;
    let corpus = corpus.filter_range(cfg.start_slide, cfg.end_slide);
    info!(
        total_slides = corpus.total_slides(),
        slides_analyzed = corpus.slides_analyzed(),
        items = corpus.items().len(),
        "extraction complete"
    );

    let chunks = chunk_corpus(&corpus, &ChunkerConfig { max_tokens: cfg.max_tokens });
    let outcome = detect_inconsistencies(&corpus, &chunks, backend, cfg, cancel).await;

    AnalysisResult {
        total_slides: corpus.total_slides(),
        slides_analyzed: corpus.slides_analyzed(),
        findings: outcome.findings,
        unanalyzed: outcome.unanalyzed,
        elapsed: started.elapsed(),
    }
}
