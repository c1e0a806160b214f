//! # Asset Preparation
//!
//! Standalone jobs that prepare figure assets: flattening transparent
//! images onto white, square-cropping pose visualizations, and burning
//! those visualizations into the corner of demo videos.

pub mod flatten;
pub mod overlay;
pub mod square;

pub use flatten::{flatten_file, flatten_onto_white, FlattenOutcome};
pub use overlay::{corner_overlay_graph, OverlayBurner, OverlayReport};
pub use square::{square_batch, square_crop, square_file, BatchReport};
