use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the grid compositor library
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Compositing error: {0}")]
    Compositing(#[from] CompositingError),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// A clip's metadata could not be read.
///
/// Probe failures are not fatal on their own: the clip is left out of the
/// duration negotiation and the run continues.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("ffprobe failed for {}: {stderr}", path.display())]
    ToolFailed { path: PathBuf, stderr: String },

    #[error("Could not run ffprobe for {}: {reason}", path.display())]
    Spawn { path: PathBuf, reason: String },

    #[error("Unreadable ffprobe output for {}: {reason}", path.display())]
    InvalidOutput { path: PathBuf, reason: String },

    #[error("No video stream in {}", path.display())]
    NoVideoStream { path: PathBuf },
}

/// The external compositing invocation failed. Always aborts the run.
#[derive(Error, Debug)]
pub enum CompositingError {
    #[error("{tool} not found. Please install FFmpeg.")]
    ToolNotFound { tool: String },

    #[error("Failed to spawn {tool}: {reason}")]
    Spawn { tool: String, reason: String },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },
}

/// Grid planning and label rendering errors
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Grid has no clips")]
    EmptyGrid,

    #[error("None of the {attempted} clips could be probed")]
    NoUsableClips { attempted: usize },

    #[error("Row {row} has {found} clips, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Label rendering failed: {reason}")]
    LabelRenderFailed { reason: String },
}

/// Errors from the asset preparation commands
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to load image: {}", path.display())]
    LoadFailed { path: PathBuf },

    #[error("Failed to save image {}: {reason}", path.display())]
    SaveFailed { path: PathBuf, reason: String },

    #[error("{failed} of {total} items failed")]
    BatchFailed { failed: usize, total: usize },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("{kind} labels: got {found}, grid has {expected}")]
    LabelCountMismatch {
        kind: String,
        found: usize,
        expected: usize,
    },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using CompositorError
pub type Result<T> = std::result::Result<T, CompositorError>;

impl CompositorError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Compositing(CompositingError::ToolNotFound { tool }) => {
                format!("'{}' was not found on PATH. Install FFmpeg and try again.", tool)
            }
            Self::Grid(GridError::NoUsableClips { .. }) => {
                "None of the grid clips could be read. Check the clip paths in the manifest.".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found. Run `init-config` to create one.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compositing_failure_surfaces_stderr() {
        let err: CompositorError = CompositingError::ToolFailed {
            tool: "ffmpeg".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "Invalid filtergraph".to_string(),
        }
        .into();

        assert!(err.to_string().contains("Invalid filtergraph"));
    }

    #[test]
    fn test_user_message_for_missing_tool() {
        let err: CompositorError = CompositingError::ToolNotFound {
            tool: "ffmpeg".to_string(),
        }
        .into();

        assert!(err.user_message().contains("FFmpeg"));
    }
}
