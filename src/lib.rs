//! # Grid-Compositor
//!
//! Build labelled comparison-grid videos from a set of clips and prepare
//! the figure assets that go with them.
//!
//! The main job lays out R×C clips on a white canvas, each scaled to cover
//! its cell and center-cropped, draws row and column captions in label
//! bands along the top and left edges, stacks a side image to the left,
//! and trims everything to the shortest clip. All of the video work is
//! done by a single `ffmpeg` invocation built from a typed filter graph.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grid_compositor::{composition::GridCompositor, config::Config};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::from_file("manifest.toml")?;
//! let report = GridCompositor::new(config).compose().await?;
//! println!("wrote {:?} ({:.2}s)", report.output, report.duration);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`grid`] - Canvas geometry, duration negotiation and the compositing plan
//! - [`labels`] - Label overlay rendering and font fallback
//! - [`video`] - Clip probing, filter graphs and the `ffmpeg` command builder
//! - [`composition`] - The pipeline tying those together
//! - [`assets`] - Flatten, square-crop and overlay-burn jobs
//! - [`config`] - The TOML run manifest
//!
//! ## Custom Probes
//!
//! Duration negotiation goes through the [`ClipProbe`](video::ClipProbe)
//! trait, so clip metadata can come from somewhere other than `ffprobe`:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use grid_compositor::{error::ProbeError, video::{ClipInfo, ClipProbe}};
//!
//! struct FixedProbe;
//!
//! impl ClipProbe for FixedProbe {
//!     async fn probe(&self, _path: &Path) -> Result<ClipInfo, ProbeError> {
//!         Ok(ClipInfo { width: 832, height: 480, duration: 5.0 })
//!     }
//! }
//! ```

pub mod assets;
pub mod composition;
pub mod config;
pub mod error;
pub mod grid;
pub mod labels;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    composition::GridCompositor,
    config::Config,
    error::{CompositorError, Result},
};
