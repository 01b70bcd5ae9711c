//! Analysis orchestration: the rule-based pass, per-chunk calls under
//! bounded concurrency, the cross-chunk pass, and assembly of the merged
//! outcome.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use deckaudit_common::config::AuditConfig;
use deckaudit_ingestion::models::{Chunk, Corpus};

use crate::backend::{EngineError, ReasoningBackend};
use crate::merge::merge_findings;
use crate::models::{Finding, SlideRange};
use crate::parse::{recover_json, validate_findings};
use crate::prompt::{chunk_prompt, cross_chunk_prompt, summarize_chunk};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::rules::rule_based_findings;

/// Completion budget per analysis call. Findings lists are small; this is
/// generous headroom, not a content limit.
const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Findings plus the slide ranges the engine could not analyze.
#[derive(Debug, Clone, Default)]
pub struct EngineOutcome {
    pub findings: Vec<Finding>,
    pub unanalyzed: Vec<SlideRange>,
}

/// Run the full analysis over pre-built chunks. Every backend failure is
/// contained to its chunk: exhausted retries and fatal errors alike mark
/// the chunk's slide range unanalyzed while the rest of the run proceeds,
/// so findings from healthy chunks and the rule-based pass always survive.
/// The cancel flag stops new calls from starting and marks the remainder
/// unanalyzed.
pub async fn detect_inconsistencies(
    corpus: &Corpus,
    chunks: &[Chunk],
    backend: Arc<dyn ReasoningBackend>,
    cfg: &AuditConfig,
    cancel: Arc<AtomicBool>,
) -> EngineOutcome {
    if chunks.is_empty() {
        return EngineOutcome::default();
    }

    let run_id = Uuid::new_v4();
    let span = info_span!("analysis", %run_id, model = backend.model_id());
    run_analysis(corpus, chunks, backend, cfg, cancel)
        .instrument(span)
        .await
}

async fn run_analysis(
    corpus: &Corpus,
    chunks: &[Chunk],
    backend: Arc<dyn ReasoningBackend>,
    cfg: &AuditConfig,
    cancel: Arc<AtomicBool>,
) -> EngineOutcome {
    let policy = RetryPolicy::from_config(cfg);
    let content_slides = Arc::new(corpus.content_slide_numbers());
    let semaphore = Arc::new(Semaphore::new(cfg.engine_concurrency.max(1)));

    info!(chunks = chunks.len(), "starting per-chunk analysis");

    let mut tasks: JoinSet<(usize, Result<Vec<Finding>, EngineError>)> = JoinSet::new();
    for chunk in chunks {
        if cancel.load(Ordering::SeqCst) {
            break;
        }
        let prompt = chunk_prompt(chunk);
        let index = chunk.index;
        let backend = Arc::clone(&backend);
        let policy = policy.clone();
        let content_slides = Arc::clone(&content_slides);
        let semaphore = Arc::clone(&semaphore);
        let cancel = Arc::clone(&cancel);
        let label = format!("chunk-{index}");

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            if cancel.load(Ordering::SeqCst) {
                return (index, Err(EngineError::Cancelled));
            }
            let result = run_with_retry(&policy, &label, || {
                backend.complete(&prompt, MAX_OUTPUT_TOKENS)
            })
            .await
            .and_then(|text| recover_json(&text))
            .map(|raw| validate_findings(raw, &content_slides));
            (index, result)
        });
    }

    let mut by_chunk: BTreeMap<usize, Result<Vec<Finding>, EngineError>> = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => {
                by_chunk.insert(index, result);
            }
            Err(e) => warn!(error = %e, "analysis task panicked"),
        }
    }

    let mut findings: Vec<Finding> = Vec::new();
    let mut unanalyzed: Vec<SlideRange> = Vec::new();
    for chunk in chunks {
        match by_chunk.remove(&chunk.index) {
            Some(Ok(chunk_findings)) => findings.extend(chunk_findings),
            Some(Err(e)) => {
                warn!(chunk = chunk.index, error = %e, "chunk unanalyzed");
                if let Some((start, end)) = chunk.slide_range() {
                    unanalyzed.push(SlideRange { start, end });
                }
            }
            None => {
                if let Some((start, end)) = chunk.slide_range() {
                    unanalyzed.push(SlideRange { start, end });
                }
            }
        }
    }

    if chunks.len() > 1 && !cancel.load(Ordering::SeqCst) {
        match cross_chunk_pass(chunks, &backend, &policy, &content_slides).await {
            Ok(mut extra) => findings.append(&mut extra),
            // Per-chunk findings already stand on their own.
            Err(e) => warn!(error = %e, "cross-chunk pass failed, keeping per-chunk findings"),
        }
    }

    findings.extend(rule_based_findings(corpus));

    let findings = merge_findings(findings);
    let unanalyzed = coalesce_ranges(unanalyzed);
    info!(
        findings = findings.len(),
        unanalyzed = unanalyzed.len(),
        "analysis complete"
    );
    EngineOutcome { findings, unanalyzed }
}

async fn cross_chunk_pass(
    chunks: &[Chunk],
    backend: &Arc<dyn ReasoningBackend>,
    policy: &RetryPolicy,
    content_slides: &std::collections::BTreeSet<u32>,
) -> Result<Vec<Finding>, EngineError> {
    let summaries: Vec<_> = chunks.iter().map(summarize_chunk).collect();
    let prompt = cross_chunk_prompt(&summaries);
    let text = run_with_retry(policy, "cross-chunk", || {
        backend.complete(&prompt, MAX_OUTPUT_TOKENS)
    })
    .await?;
    let raw = recover_json(&text)?;
    Ok(validate_findings(raw, content_slides))
}

/// Merge overlapping and adjacent slide ranges into maximal runs.
fn coalesce_ranges(mut ranges: Vec<SlideRange>) -> Vec<SlideRange> {
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut out: Vec<SlideRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match out.last_mut() {
            Some(last) if range.start <= last.end.saturating_add(1) => {
                last.end = last.end.max(range.end);
            }
            _ => out.push(range),
        }
    }
    out
}
