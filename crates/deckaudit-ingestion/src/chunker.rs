//! Token-bounded chunking of the corpus.
//!
//! Chunk boundaries fall between slides so the engine always sees whole
//! slides together; only a single slide that alone exceeds the budget is
//! split at item boundaries, and the resulting chunks are flagged.

use tracing::{debug, warn};

use crate::models::{Chunk, ContentItem, Corpus};

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Approximate token budget per chunk.
    pub max_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { max_tokens: 4000 }
    }
}

/// Rough token count for a piece of text. Word count divided by 0.75,
/// matching the usual words-per-token ratio for English prose.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words as f64 / 0.75).ceil() as usize
}

fn slide_tokens(items: &[ContentItem]) -> usize {
    items.iter().map(|i| estimate_tokens(&i.text)).sum()
}

/// Split the corpus into token-bounded chunks, keeping slides whole
/// wherever possible. Markers weigh nothing and ride along with their
/// neighbors so slide accounting survives chunking.
pub fn chunk_corpus(corpus: &Corpus, cfg: &ChunkerConfig) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current: Vec<ContentItem> = Vec::new();
    let mut current_tokens = 0usize;

    let mut flush = |current: &mut Vec<ContentItem>, current_tokens: &mut usize, split: bool| {
        if current.is_empty() {
            return;
        }
        chunks.push(Chunk {
            index: chunks.len(),
            items: std::mem::take(current),
            token_estimate: *current_tokens,
            split_slide: split,
        });
        *current_tokens = 0;
    };

    for slide_items in group_by_slide(corpus.items()) {
        let tokens = slide_tokens(slide_items);

        if tokens > cfg.max_tokens {
            // One slide bigger than the whole budget: close the open chunk,
            // then split this slide at item boundaries.
            flush(&mut current, &mut current_tokens, false);
            let slide = slide_items[0].slide_number;
            warn!(slide, tokens, budget = cfg.max_tokens, "slide exceeds chunk budget, splitting");
            for item in slide_items {
                let item_tokens = estimate_tokens(&item.text);
                if current_tokens + item_tokens > cfg.max_tokens && !current.is_empty() {
                    flush(&mut current, &mut current_tokens, true);
                }
                current.push(item.clone());
                current_tokens += item_tokens;
            }
            flush(&mut current, &mut current_tokens, true);
            continue;
        }

        if current_tokens + tokens > cfg.max_tokens && !current.is_empty() {
            flush(&mut current, &mut current_tokens, false);
        }
        current.extend(slide_items.iter().cloned());
        current_tokens += tokens;
    }
    flush(&mut current, &mut current_tokens, false);

    debug!(chunks = chunks.len(), "corpus chunked");
    chunks
}

/// Iterate the corpus as contiguous runs of items sharing a slide number.
fn group_by_slide<'a>(
    items: &'a [ContentItem],
) -> impl Iterator<Item = &'a [ContentItem]> + 'a {
    items.chunk_by(|a, b| a.slide_number == b.slide_number)
}
