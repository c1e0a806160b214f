//! # Composition Engine
//!
//! The composition engine coordinates duration negotiation, label
//! synthesis, layout planning and the final FFmpeg invocation to produce
//! the labelled comparison-grid video.

pub mod engine;

// Re-exports for convenience
pub use engine::{ComposeReport, GridCompositor, PreparedComposition};
