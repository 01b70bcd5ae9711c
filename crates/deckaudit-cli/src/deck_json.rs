//! JSON deck reader: the bundled container-parser collaborator.
//!
//! Decks arrive as a JSON document of per-slide typed blocks, with slide
//! images base64-encoded. Rendering a presentation container down to this
//! shape is the exporter's job, not ours.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use tracing::debug;

use deckaudit_common::AuditError;
use deckaudit_ingestion::blocks::{ContentBlock, Deck, DeckReader, RawSlide, SlideImage};

#[derive(Debug, Deserialize)]
struct JsonDeck {
    slides: Vec<JsonSlide>,
}

#[derive(Debug, Deserialize)]
struct JsonSlide {
    number: u32,
    #[serde(default)]
    blocks: Vec<JsonBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JsonBlock {
    Title { text: String },
    Body { text: String },
    TableCell { text: String },
    Shape { label: String },
    Image { name: String, data_base64: String },
}

/// Reads the JSON deck interchange format from disk.
#[derive(Debug, Default)]
pub struct JsonDeckReader;

impl DeckReader for JsonDeckReader {
    fn read_deck(&self, path: &Path) -> deckaudit_common::Result<Deck> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AuditError::Config(format!("cannot read deck {}: {e}", path.display()))
        })?;
        let deck = parse_deck(&raw)
            .map_err(|e| AuditError::Config(format!("invalid deck {}: {e}", path.display())))?;
        debug!(path = %path.display(), slides = deck.total_slides(), "deck loaded");
        Ok(deck)
    }
}

fn parse_deck(raw: &str) -> Result<Deck, String> {
    let parsed: JsonDeck = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let mut slides = Vec::with_capacity(parsed.slides.len());
    for slide in parsed.slides {
        if slide.number == 0 {
            return Err("slide numbers are 1-based".to_string());
        }
        let mut blocks = Vec::with_capacity(slide.blocks.len());
        for block in slide.blocks {
            blocks.push(convert_block(slide.number, block)?);
        }
        slides.push(RawSlide { number: slide.number, blocks });
    }
    slides.sort_by_key(|s| s.number);
    Ok(Deck { slides })
}

fn convert_block(slide: u32, block: JsonBlock) -> Result<ContentBlock, String> {
    Ok(match block {
        JsonBlock::Title { text } => ContentBlock::Title { text },
        JsonBlock::Body { text } => ContentBlock::Body { text },
        JsonBlock::TableCell { text } => ContentBlock::TableCell { text },
        JsonBlock::Shape { label } => ContentBlock::Shape { label },
        JsonBlock::Image { name, data_base64 } => {
            let data = BASE64
                .decode(data_base64.trim())
                .map_err(|e| format!("slide {slide} image {name}: bad base64: {e}"))?;
            ContentBlock::Image { image: SlideImage { name, data } }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_blocks_round_into_the_block_model() {
        let deck = parse_deck(
            r#"{"slides":[
                {"number":2,"blocks":[{"kind":"body","text":"later"}]},
                {"number":1,"blocks":[
                    {"kind":"title","text":"Q3 Results"},
                    {"kind":"table_cell","text":"$1.2M"},
                    {"kind":"image","name":"chart.png","data_base64":"iVBORw=="}
                ]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(deck.total_slides(), 2);
        // Slides come out sorted regardless of document order.
        assert_eq!(deck.slides[0].number, 1);
        assert_eq!(deck.slides[0].blocks.len(), 3);
        assert!(deck.slides[0].blocks[2].image().is_some());
    }

    #[test]
    fn zero_slide_number_is_rejected() {
        let err = parse_deck(r#"{"slides":[{"number":0,"blocks":[]}]}"#).unwrap_err();
        assert!(err.contains("1-based"));
    }

    #[test]
    fn bad_base64_names_the_slide_and_image() {
        let err = parse_deck(
            r#"{"slides":[{"number":3,"blocks":[
                {"kind":"image","name":"pic.png","data_base64":"!!!"}
            ]}]}"#,
        )
        .unwrap_err();
        assert!(err.contains("slide 3"));
        assert!(err.contains("pic.png"));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let reader = JsonDeckReader;
        let result = reader.read_deck(Path::new("/nonexistent/deck.json"));
        assert!(matches!(result, Err(AuditError::Config(_))));
    }
}
