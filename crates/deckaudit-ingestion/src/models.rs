//! Data models for the ingestion stage: content items, the ordered corpus,
//! and token-bounded chunks.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Provenance of an extracted text item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    Native,
    Ocr,
}

/// Kind of slide element an item was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Title,
    Body,
    Table,
    Shape,
    ImageText,
}

impl ContentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Title     => "title",
            ContentCategory::Body      => "body",
            ContentCategory::Table     => "table",
            ContentCategory::Shape     => "shape",
            ContentCategory::ImageText => "image_text",
        }
    }
}

/// One unit of extracted slide text with its provenance and confidence.
/// Immutable once created. A zero-length `text` is a marker recording an
/// unextractable (low-signal) slide so slide accounting stays accurate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub slide_number: u32,
    pub source: TextSource,
    pub category: ContentCategory,
    pub text: String,
    /// 0-100; always 100 for native text.
    pub confidence: f32,
}

impl ContentItem {
    pub fn native(slide_number: u32, category: ContentCategory, text: String) -> Self {
        Self { slide_number, source: TextSource::Native, category, text, confidence: 100.0 }
    }

    pub fn ocr(slide_number: u32, text: String, confidence: f32) -> Self {
        Self {
            slide_number,
            source: TextSource::Ocr,
            category: ContentCategory::ImageText,
            text,
            confidence,
        }
    }

    /// Marker for a slide that yielded no usable text.
    pub fn marker(slide_number: u32) -> Self {
        Self {
            slide_number,
            source: TextSource::Native,
            category: ContentCategory::Body,
            text: String::new(),
            confidence: 0.0,
        }
    }

    pub fn is_marker(&self) -> bool {
        self.text.is_empty()
    }
}

/// The full ordered collection of content items for one analysis run.
/// Items are ordered by (slide number, extraction order within slide);
/// slide numbers are monotonically non-decreasing across the sequence.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    items: Vec<ContentItem>,
    total_slides: u32,
}

impl Corpus {
    pub fn new(total_slides: u32) -> Self {
        Self { items: Vec::new(), total_slides }
    }

    /// Append one slide's items. Slides must be appended in ascending
    /// slide-number order.
    pub fn push_slide(&mut self, items: Vec<ContentItem>) {
        if let (Some(last), Some(first)) = (self.items.last(), items.first()) {
            debug_assert!(
                first.slide_number >= last.slide_number,
                "slides must be appended in order"
            );
        }
        self.items.extend(items);
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Original deck size, independent of any slide-range filtering.
    pub fn total_slides(&self) -> u32 {
        self.total_slides
    }

    /// Distinct slides present in the corpus, markers included.
    pub fn slides_analyzed(&self) -> u32 {
        self.slide_numbers().len() as u32
    }

    pub fn slide_numbers(&self) -> BTreeSet<u32> {
        self.items.iter().map(|i| i.slide_number).collect()
    }

    /// Slides that contributed at least one non-marker item. Findings may
    /// only reference these; a low-signal slide has no content a finding
    /// could be grounded in.
    pub fn content_slide_numbers(&self) -> BTreeSet<u32> {
        self.items
            .iter()
            .filter(|i| !i.is_marker())
            .map(|i| i.slide_number)
            .collect()
    }

    /// Restrict the corpus to an inclusive 1-based slide range.
    /// `total_slides` is preserved so the report can state original deck
    /// size against the filtered count.
    pub fn filter_range(&self, start: Option<u32>, end: Option<u32>) -> Corpus {
        let start = start.unwrap_or(1);
        let end = end.unwrap_or(u32::MAX);
        Corpus {
            items: self
                .items
                .iter()
                .filter(|i| i.slide_number >= start && i.slide_number <= end)
                .cloned()
                .collect(),
            total_slides: self.total_slides,
        }
    }
}

/// A token-bounded slice of the corpus sent to the reasoning engine in one
/// call. Transient; generated fresh per run.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub index: usize,
    pub items: Vec<ContentItem>,
    pub token_estimate: usize,
    /// True when a single slide exceeded the token budget and had to be
    /// split at item boundaries (soft violation).
    pub split_slide: bool,
}

impl Chunk {
    /// Inclusive slide range covered by this chunk.
    pub fn slide_range(&self) -> Option<(u32, u32)> {
        let first = self.items.first()?.slide_number;
        let last = self.items.last()?.slide_number;
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(slide: u32, text: &str) -> ContentItem {
        ContentItem::native(slide, ContentCategory::Body, text.to_string())
    }

    #[test]
    fn marker_items_count_toward_slides_analyzed_but_not_content() {
        let mut corpus = Corpus::new(3);
        corpus.push_slide(vec![item(1, "Revenue: $1.2M")]);
        corpus.push_slide(vec![ContentItem::marker(2)]);
        corpus.push_slide(vec![item(3, "Roadmap")]);

        assert_eq!(corpus.slides_analyzed(), 3);
        let content: Vec<u32> = corpus.content_slide_numbers().into_iter().collect();
        assert_eq!(content, vec![1, 3]);
    }

    #[test]
    fn filter_range_keeps_total_slides() {
        let mut corpus = Corpus::new(5);
        for n in 1..=5 {
            corpus.push_slide(vec![item(n, "text")]);
        }
        let filtered = corpus.filter_range(Some(2), Some(4));
        assert_eq!(filtered.total_slides(), 5);
        assert_eq!(filtered.slides_analyzed(), 3);
        assert!(filtered.items().iter().all(|i| (2..=4).contains(&i.slide_number)));
    }

    #[test]
    fn chunk_slide_range_spans_first_to_last() {
        let chunk = Chunk {
            index: 0,
            items: vec![item(2, "a"), item(2, "b"), item(4, "c")],
            token_estimate: 10,
            split_slide: false,
        };
        assert_eq!(chunk.slide_range(), Some((2, 4)));
    }
}
