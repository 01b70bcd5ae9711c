//! Report rendering: one structured view of an analysis result, three
//! serializations (yaml, markdown, text). Rendering is pure; the same
//! result always produces byte-identical output.

pub mod render;
pub mod view;

pub use render::{render, render_error};
