//! # Grid Layout
//!
//! Pure layout logic for the comparison grid: canvas geometry, the
//! scale-to-cover cell normalization, duration negotiation across clips,
//! and the compositing plan handed to FFmpeg.

pub mod duration;
pub mod geometry;
pub mod plan;

pub use duration::{min_duration, negotiate_duration, DurationNegotiation};
pub use geometry::{cover_fit, even_ceil, CellFit, GridGeometry, GridLayout};
pub use plan::{CellPlacement, EncoderSettings, GridPlan};
