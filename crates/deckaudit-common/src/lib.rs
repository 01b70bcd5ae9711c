//! Shared types for the deckaudit pipeline: error taxonomy and run
//! configuration.

pub mod config;
pub mod error;

pub use error::{AuditError, Result};
