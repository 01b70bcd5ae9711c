//! Pipeline-wide error taxonomy.
//!
//! Containment policy: per-slide and per-chunk errors stay inside their
//! stage (marker items, unanalyzed chunk ranges); only configuration and
//! whole-file read errors abort a run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// Per-slide extraction failure; the slide is marked low-signal.
    #[error("slide {slide}: extraction failed: {reason}")]
    Extraction { slide: u32, reason: String },

    /// OCR collaborator failure; OCR is skipped for that image.
    #[error("OCR failed: {0}")]
    Ocr(String),

    /// Retryable reasoning-engine failure (rate limit, timeout, malformed
    /// response).
    #[error("reasoning engine transient failure: {0}")]
    EngineTransient(String),

    /// Non-retryable reasoning-engine failure (auth, invalid request); the
    /// owning chunk is marked unanalyzed.
    #[error("reasoning engine fatal failure: {0}")]
    EngineFatal(String),

    /// Malformed finding returned by the engine; the item is dropped.
    #[error("invalid finding from engine: {0}")]
    Validation(String),

    /// Fatal: missing credential, unreadable input file, bad option. Aborts
    /// the run before any analysis.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;
