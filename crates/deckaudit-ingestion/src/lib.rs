//! Slide-content ingestion: typed content blocks from the container-parser
//! collaborator, per-slide extraction with OCR fallback, signal
//! categorization, and token-bounded chunking of the resulting corpus.

pub mod blocks;
pub mod categorize;
pub mod chunker;
pub mod extractor;
pub mod models;
pub mod ocr;
