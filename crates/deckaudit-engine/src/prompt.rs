//! Prompt construction for per-chunk and cross-chunk analysis calls.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use deckaudit_ingestion::categorize::{classify, extract_figures, SignalKind};
use deckaudit_ingestion::models::Chunk;

/// Maximum figures carried into a condensed slide summary.
const SUMMARY_FIGURE_CAP: usize = 6;
/// Leading characters of the first claim carried into a summary.
const SUMMARY_CLAIM_LEN: usize = 120;

/// The JSON-only response shape every analysis call must honor.
const RESPONSE_CONTRACT: &str = r#"Respond with JSON only, no prose and no code fences, matching exactly:
{"findings": [{"category": "<numerical|contradiction|timeline|logical>", "slides": [<slide numbers>], "description": "<one sentence>", "severity": "<low|medium|high>"}]}
Every finding must cite at least two distinct slide numbers from the content above. If there are no inconsistencies, respond {"findings": []}."#;

/// Build the analysis prompt for one chunk: slide-tagged content lines
/// with signal annotations, followed by the response contract.
pub fn chunk_prompt(chunk: &Chunk) -> String {
    let mut prompt = String::from(
        "You are auditing a presentation deck for cross-slide inconsistencies: \
         numerical conflicts, contradictory statements, timeline inconsistencies, \
         and logical inconsistencies. Compare claims ACROSS slides; never report \
         a single slide in isolation.\n\n",
    );
    if chunk.split_slide {
        prompt.push_str(
            "Note: the following content is a partial view of one oversized slide.\n\n",
        );
    }
    prompt.push_str("SLIDE CONTENT:\n");
    for item in chunk.items.iter().filter(|i| !i.is_marker()) {
        let signal = classify(&item.text);
        let _ = writeln!(
            prompt,
            "SLIDE {} [{}] {}",
            item.slide_number,
            signal.as_str(),
            item.text
        );
    }
    prompt.push('\n');
    prompt.push_str(RESPONSE_CONTRACT);
    prompt
}

/// Condensed per-slide digest of one chunk, for the cross-chunk pass.
#[derive(Debug, Clone)]
pub struct ChunkSummary {
    pub chunk_index: usize,
    /// slide number → (dominant signal, key figures, leading claim).
    pub slides: BTreeMap<u32, SlideDigest>,
}

#[derive(Debug, Clone)]
pub struct SlideDigest {
    pub signal: SignalKind,
    pub figures: Vec<String>,
    pub claim: String,
}

/// Distill a chunk into per-slide signals, key figures, and a leading
/// claim, small enough that all chunk summaries fit one prompt.
pub fn summarize_chunk(chunk: &Chunk) -> ChunkSummary {
    let mut slides: BTreeMap<u32, SlideDigest> = BTreeMap::new();
    for item in chunk.items.iter().filter(|i| !i.is_marker()) {
        let digest = slides.entry(item.slide_number).or_insert_with(|| SlideDigest {
            signal: SignalKind::Statement,
            figures: Vec::new(),
            claim: truncate_claim(&item.text),
        });
        let signal = classify(&item.text);
        // Numerical and temporal signals dominate plain statements.
        if signal < digest.signal {
            digest.signal = signal;
        }
        for figure in extract_figures(&item.text, SUMMARY_FIGURE_CAP) {
            if !digest.figures.contains(&figure) && digest.figures.len() < SUMMARY_FIGURE_CAP {
                digest.figures.push(figure);
            }
        }
    }
    ChunkSummary { chunk_index: chunk.index, slides }
}

fn truncate_claim(text: &str) -> String {
    if text.chars().count() <= SUMMARY_CLAIM_LEN {
        return text.to_string();
    }
    let cut: String = text.chars().take(SUMMARY_CLAIM_LEN).collect();
    format!("{cut}…")
}

/// Build the cross-chunk prompt from all chunk summaries. Only runs when
/// the deck spanned more than one chunk, to catch inconsistencies whose
/// slides landed in different chunks.
pub fn cross_chunk_prompt(summaries: &[ChunkSummary]) -> String {
    let mut prompt = String::from(
        "You are auditing a presentation deck for cross-slide inconsistencies. \
         Below are condensed summaries of slide groups that were analyzed \
         separately. Look ONLY for inconsistencies between slides in DIFFERENT \
         groups; within-group inconsistencies are already covered.\n\n",
    );
    for summary in summaries {
        let _ = writeln!(prompt, "GROUP {}:", summary.chunk_index + 1);
        for (slide, digest) in &summary.slides {
            let figures = if digest.figures.is_empty() {
                String::new()
            } else {
                format!(" figures: {};", digest.figures.join(", "))
            };
            let _ = writeln!(
                prompt,
                "  SLIDE {} [{}]{} {}",
                slide,
                digest.signal.as_str(),
                figures,
                digest.claim
            );
        }
    }
    prompt.push('\n');
    prompt.push_str(RESPONSE_CONTRACT);
    prompt
}
