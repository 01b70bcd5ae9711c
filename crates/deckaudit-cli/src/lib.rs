//! CLI wiring for the deckaudit binary: deck loading and the end-to-end
//! pipeline, exposed as a library so integration tests can drive the full
//! flow with scripted collaborators.

pub mod deck_json;
pub mod pipeline;
