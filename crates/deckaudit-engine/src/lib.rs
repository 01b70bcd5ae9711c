//! Reasoning engine: prompt construction, backend calls with bounded
//! retry, response recovery and validation, cross-chunk analysis, and
//! finding deduplication.

pub mod analyzer;
pub mod backend;
pub mod merge;
pub mod models;
pub mod parse;
pub mod prompt;
pub mod retry;
pub mod rules;
