//! Typed slide content blocks as delivered by the container-parser
//! collaborator, and the collaborator seam itself.
//!
//! The block set is closed: every text-bearing variant resolves its text
//! through one `extract_text()` call at extraction time, rather than via
//! late dynamic dispatch over arbitrary shape objects.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::ContentCategory;

/// A slide's rendered image, handed to the OCR collaborator when native
/// text is insufficient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideImage {
    /// Media name within the container, for log correlation.
    pub name: String,
    /// Encoded bitmap bytes (PNG or similar) as rendered by the container
    /// parser.
    pub data: Vec<u8>,
}

/// One typed content block of a slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBlock {
    Title { text: String },
    Body { text: String },
    TableCell { text: String },
    Shape { label: String },
    Image { image: SlideImage },
}

impl ContentBlock {
    /// Resolve the block's text capability. `None` for image blocks, which
    /// go through OCR instead.
    pub fn extract_text(&self) -> Option<(ContentCategory, &str)> {
        match self {
            ContentBlock::Title { text }     => Some((ContentCategory::Title, text)),
            ContentBlock::Body { text }      => Some((ContentCategory::Body, text)),
            ContentBlock::TableCell { text } => Some((ContentCategory::Table, text)),
            ContentBlock::Shape { label }    => Some((ContentCategory::Shape, label)),
            ContentBlock::Image { .. }       => None,
        }
    }

    pub fn image(&self) -> Option<&SlideImage> {
        match self {
            ContentBlock::Image { image } => Some(image),
            _ => None,
        }
    }
}

/// One slide's raw content as produced by the container parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSlide {
    /// 1-based slide number.
    pub number: u32,
    pub blocks: Vec<ContentBlock>,
}

/// A whole presentation, in slide order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub slides: Vec<RawSlide>,
}

impl Deck {
    pub fn total_slides(&self) -> u32 {
        self.slides.len() as u32
    }
}

/// Container-format parser collaborator: turns a presentation file into
/// typed per-slide content blocks. The core never parses container formats
/// itself.
pub trait DeckReader: Send + Sync {
    fn read_deck(&self, path: &Path) -> deckaudit_common::Result<Deck>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_blocks_resolve_to_their_category() {
        let title = ContentBlock::Title { text: "Q3 Results".to_string() };
        assert_eq!(title.extract_text(), Some((ContentCategory::Title, "Q3 Results")));

        let cell = ContentBlock::TableCell { text: "$1.2M".to_string() };
        assert_eq!(cell.extract_text(), Some((ContentCategory::Table, "$1.2M")));
    }

    #[test]
    fn image_blocks_have_no_text_capability() {
        let block = ContentBlock::Image {
            image: SlideImage { name: "chart1.png".to_string(), data: vec![0x89, 0x50] },
        };
        assert!(block.extract_text().is_none());
        assert!(block.image().is_some());
    }
}
