//! Per-slide content extraction with OCR fallback.
//!
//! Native text wins: OCR runs only when a slide's native text is below the
//! configured minimum, so decks with real text never pay the OCR cost.
//! Slides run concurrently under a semaphore and are reassembled in order.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use deckaudit_common::config::AuditConfig;

use crate::blocks::{Deck, RawSlide};
use crate::models::{ContentItem, Corpus};
use crate::ocr::OcrEngine;

/// Collapse runs of whitespace (including newlines inside text frames)
/// into single spaces and trim the ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the whole deck into an ordered corpus. Slides that yield no
/// usable text, or whose extraction task fails, are recorded as markers so
/// slide accounting stays exact.
pub async fn extract_deck(
    deck: &Deck,
    ocr: Arc<dyn OcrEngine>,
    cfg: &AuditConfig,
) -> Corpus {
    let total = deck.total_slides();
    let semaphore = Arc::new(Semaphore::new(cfg.extract_concurrency.max(1)));
    let mut tasks: JoinSet<(u32, Vec<ContentItem>)> = JoinSet::new();

    for slide in deck.slides.iter().cloned() {
        let ocr = Arc::clone(&ocr);
        let semaphore = Arc::clone(&semaphore);
        let min_native = cfg.min_native_text_len;
        let threshold = cfg.ocr_confidence_threshold;
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let number = slide.number;
            (number, extract_slide(&slide, ocr.as_ref(), min_native, threshold).await)
        });
    }

    let mut by_slide: BTreeMap<u32, Vec<ContentItem>> = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((number, items)) => {
                by_slide.insert(number, items);
            }
            Err(e) => warn!(error = %e, "slide extraction task failed"),
        }
    }

    let mut corpus = Corpus::new(total);
    for slide in &deck.slides {
        let items = by_slide
            .remove(&slide.number)
            .unwrap_or_else(|| vec![ContentItem::marker(slide.number)]);
        corpus.push_slide(items);
    }
    debug!(
        total_slides = total,
        items = corpus.items().len(),
        "deck extracted"
    );
    corpus
}

/// Extract one slide: native text first; OCR over the slide's images only
/// when native text is too short to analyze. Always yields at least a
/// marker item.
async fn extract_slide(
    slide: &RawSlide,
    ocr: &dyn OcrEngine,
    min_native_text_len: usize,
    confidence_threshold: f32,
) -> Vec<ContentItem> {
    let mut items: Vec<ContentItem> = Vec::new();
    let mut native_len = 0usize;

    for block in &slide.blocks {
        if let Some((category, raw)) = block.extract_text() {
            let text = clean_text(raw);
            if text.is_empty() {
                continue;
            }
            native_len += text.len();
            items.push(ContentItem::native(slide.number, category, text));
        }
    }

    if native_len < min_native_text_len {
        for image in slide.blocks.iter().filter_map(|b| b.image()) {
            match ocr.recognize(image).await {
                Ok(result) => {
                    let text = clean_text(&result.text);
                    if text.is_empty() {
                        continue;
                    }
                    if result.confidence >= confidence_threshold {
                        items.push(ContentItem::ocr(slide.number, text, result.confidence));
                    } else {
                        warn!(
                            slide = slide.number,
                            image = %image.name,
                            confidence = result.confidence,
                            threshold = confidence_threshold,
                            "discarding low-confidence OCR text"
                        );
                    }
                }
                Err(e) => {
                    warn!(slide = slide.number, image = %image.name, error = %e, "OCR failed");
                }
            }
        }
    }

    if items.is_empty() {
        debug!(slide = slide.number, "no usable text, recording marker");
        items.push(ContentItem::marker(slide.number));
    }
    items
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::blocks::{ContentBlock, SlideImage};
    use crate::models::TextSource;
    use crate::ocr::{OcrError, OcrResult};

    struct ScriptedOcr {
        text: String,
        confidence: f32,
        calls: AtomicUsize,
    }

    impl ScriptedOcr {
        fn new(text: &str, confidence: f32) -> Self {
            Self { text: text.to_string(), confidence, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl OcrEngine for ScriptedOcr {
        async fn recognize(&self, _image: &SlideImage) -> Result<OcrResult, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(OcrResult { text: self.text.clone(), confidence: self.confidence })
        }
    }

    fn image_block() -> ContentBlock {
        ContentBlock::Image {
            image: SlideImage { name: "chart.png".to_string(), data: vec![1, 2, 3] },
        }
    }

    fn deck(slides: Vec<RawSlide>) -> Deck {
        Deck { slides }
    }

    #[tokio::test]
    async fn sufficient_native_text_skips_ocr() {
        let ocr = Arc::new(ScriptedOcr::new("from ocr", 99.0));
        let d = deck(vec![RawSlide {
            number: 1,
            blocks: vec![
                ContentBlock::Title { text: "Quarterly Results".to_string() },
                image_block(),
            ],
        }]);
        let corpus = extract_deck(&d, ocr.clone(), &AuditConfig::default()).await;

        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
        assert_eq!(corpus.items().len(), 1);
        assert_eq!(corpus.items()[0].source, TextSource::Native);
    }

    #[tokio::test]
    async fn low_confidence_ocr_leaves_a_marker() {
        let ocr = Arc::new(ScriptedOcr::new("garbled", 40.0));
        let d = deck(vec![RawSlide { number: 1, blocks: vec![image_block()] }]);
        let corpus = extract_deck(&d, ocr.clone(), &AuditConfig::default()).await;

        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
        assert_eq!(corpus.items().len(), 1);
        assert!(corpus.items()[0].is_marker());
        assert_eq!(corpus.slides_analyzed(), 1);
        assert!(corpus.content_slide_numbers().is_empty());
    }

    #[tokio::test]
    async fn confident_ocr_text_is_kept() {
        let ocr = Arc::new(ScriptedOcr::new("Revenue  grew   25%", 92.5));
        let d = deck(vec![RawSlide { number: 3, blocks: vec![image_block()] }]);
        let corpus = extract_deck(&d, ocr, &AuditConfig::default()).await;

        assert_eq!(corpus.items().len(), 1);
        let item = &corpus.items()[0];
        assert_eq!(item.source, TextSource::Ocr);
        assert_eq!(item.text, "Revenue grew 25%");
        assert_eq!(item.slide_number, 3);
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a\n\tb   c  "), "a b c");
        assert_eq!(clean_text("   "), "");
    }
}
