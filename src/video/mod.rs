//! # Video Module
//!
//! Clip metadata, the `ffprobe` collaborator, and structured `ffmpeg`
//! invocations built from typed filter graphs.

pub mod ffmpeg;
pub mod filter;
pub mod probe;
pub mod types;

pub use ffmpeg::{ensure_available, format_seconds, FfmpegCommand};
pub use filter::{Filter, FilterChain, FilterGraph};
pub use probe::{ClipProbe, FfprobeProbe};
pub use types::{Clip, ClipInfo};
