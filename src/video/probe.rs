//! Clip metadata probing through `ffprobe`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::ProbeError;
use crate::video::types::ClipInfo;

/// Duration assumed when the container does not report one.
pub const FALLBACK_DURATION: f64 = 5.0;

/// Source of clip metadata
///
/// The grid compositor is generic over this so duration negotiation can run
/// without an `ffprobe` binary.
#[allow(async_fn_in_trait)]
pub trait ClipProbe {
    /// Read width, height and duration of the clip at `path`
    async fn probe(&self, path: &Path) -> Result<ClipInfo, ProbeError>;
}

/// Probes clips by running `ffprobe` and parsing its JSON output
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: PathBuf,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeProbe {
    pub fn new<P: Into<PathBuf>>(binary: P) -> Self {
        Self { binary: binary.into() }
    }
}

impl ClipProbe for FfprobeProbe {
    async fn probe(&self, path: &Path) -> Result<ClipInfo, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::FileNotFound { path: path.to_path_buf() });
        }

        let output = Command::new(&self.binary)
            .args([
                "-v", "quiet",
                "-print_format", "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ProbeError::Spawn {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ProbeError::ToolFailed {
                path: path.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let info = parse_probe_output(path, &output.stdout)?;
        debug!("Probed {}: {}x{}, {:.2}s", path.display(), info.width, info.height, info.duration);
        Ok(info)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Turn `ffprobe -print_format json` output into clip metadata
///
/// Width and height come from the first video stream. The duration is the
/// container duration; when it is missing or not a number (`"N/A"`)
/// [`FALLBACK_DURATION`] is used.
pub fn parse_probe_output(path: &Path, stdout: &[u8]) -> Result<ClipInfo, ProbeError> {
    let probe: FfprobeOutput =
        serde_json::from_slice(stdout).map_err(|e| ProbeError::InvalidOutput {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ProbeError::NoVideoStream { path: path.to_path_buf() })?;

    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite())
        .unwrap_or(FALLBACK_DURATION);

    Ok(ClipInfo {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        duration,
    })
}
