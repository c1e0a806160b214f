//! FFmpeg command builder and runner.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::CompositingError;
use crate::video::filter::FilterGraph;

/// Structured `ffmpeg` invocation
///
/// Arguments are kept as separate argv entries; nothing is ever passed
/// through a shell.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    binary: PathBuf,
    inputs: Vec<PathBuf>,
    filter_graph: Option<FilterGraph>,
    maps: Vec<String>,
    output_args: Vec<String>,
    output: PathBuf,
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a command writing to `output`
    pub fn new<P: AsRef<Path>>(output: P) -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            inputs: Vec::new(),
            filter_graph: None,
            maps: Vec::new(),
            output_args: Vec::new(),
            output: output.as_ref().to_path_buf(),
            overwrite: true,
        }
    }

    /// Use a specific `ffmpeg` executable
    pub fn binary<P: Into<PathBuf>>(mut self, binary: P) -> Self {
        self.binary = binary.into();
        self
    }

    /// Add an input file; its stream index is the number of inputs before it
    pub fn input<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inputs.push(path.as_ref().to_path_buf());
        self
    }

    /// Set the `-filter_complex` graph
    pub fn filter_complex(mut self, graph: FilterGraph) -> Self {
        self.filter_graph = Some(graph);
        self
    }

    /// Map a labelled graph output (without brackets) or a stream specifier
    pub fn map<S: Into<String>>(mut self, pad: S) -> Self {
        self.maps.push(pad.into());
        self
    }

    /// Add a raw output argument
    pub fn output_arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Cap the output duration (`-t`)
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format_seconds(seconds))
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set output pixel format
    pub fn pixel_format<S: Into<String>>(self, format: S) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the argument vector (without the executable)
    pub fn build_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if self.overwrite {
            args.push("-y".into());
        }

        for input in &self.inputs {
            args.push("-i".into());
            args.push(input.clone().into_os_string());
        }

        if let Some(graph) = &self.filter_graph {
            args.push("-filter_complex".into());
            args.push(graph.to_string().into());
        }

        for pad in &self.maps {
            args.push("-map".into());
            if pad.contains(':') {
                args.push(pad.into());
            } else {
                args.push(format!("[{}]", pad).into());
            }
        }

        args.extend(self.output_args.iter().map(OsString::from));
        args.push(self.output.clone().into_os_string());
        args
    }

    /// Render the command as a single line for logs and dry runs
    pub fn display_line(&self) -> String {
        let mut line = self.binary.display().to_string();
        for arg in self.build_args() {
            let arg = arg.to_string_lossy();
            if arg.contains(|c: char| c.is_whitespace() || c == ';' || c == '[') {
                line.push_str(&format!(" '{}'", arg));
            } else {
                line.push(' ');
                line.push_str(&arg);
            }
        }
        line
    }

    /// Run the command to completion
    ///
    /// Blocks (asynchronously) until `ffmpeg` exits. A non-zero exit status
    /// becomes [`CompositingError::ToolFailed`] carrying the tool's stderr.
    pub async fn run(&self) -> Result<(), CompositingError> {
        let tool = self.binary.display().to_string();
        debug!("Running: {}", self.display_line());

        let output = Command::new(&self.binary)
            .args(self.build_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| spawn_error(&tool, e))?;

        if !output.status.success() {
            return Err(CompositingError::ToolFailed {
                tool,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!("{} finished: {}", tool, self.output.display());
        Ok(())
    }
}

/// Verify that `binary -version` runs
pub async fn ensure_available<P: AsRef<Path>>(binary: P) -> Result<(), CompositingError> {
    let tool = binary.as_ref().display().to_string();
    let status = Command::new(binary.as_ref())
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| spawn_error(&tool, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(CompositingError::ToolFailed {
            tool,
            status: status.to_string(),
            stderr: "version check failed".to_string(),
        })
    }
}

fn spawn_error(tool: &str, err: std::io::Error) -> CompositingError {
    if err.kind() == std::io::ErrorKind::NotFound {
        CompositingError::ToolNotFound { tool: tool.to_string() }
    } else {
        CompositingError::Spawn {
            tool: tool.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Format seconds for `-t` and filter durations, truncated to milliseconds
/// so the value never exceeds the shortest clip.
pub fn format_seconds(seconds: f64) -> String {
    let millis = (seconds.max(0.0) * 1000.0).floor();
    format!("{:.3}", millis / 1000.0)
}
