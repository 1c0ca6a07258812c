// src/render/mod.rs
// =============================================================================
// This module turns insights into text.
//
// Submodules:
// - markdown: InsightPayload -> Markdown (what gets written to files)
// - terminal: Markdown -> styled text for the console
// =============================================================================

mod markdown;
mod terminal;

pub use markdown::json_to_markdown;
pub use terminal::render_for_terminal;
