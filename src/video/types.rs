use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Probed properties of a source clip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    /// Width of the first video stream in pixels
    pub width: u32,

    /// Height of the first video stream in pixels
    pub height: u32,

    /// Container-level duration in seconds
    pub duration: f64,
}

impl ClipInfo {
    /// Aspect ratio (width / height), if both dimensions are known
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            None
        } else {
            Some(self.width as f64 / self.height as f64)
        }
    }
}

/// A source video file together with its probed metadata
///
/// Clips are read-only: nothing in this crate writes to a clip's file.
#[derive(Debug, Clone)]
pub struct Clip {
    /// Path to the video file
    pub path: PathBuf,

    /// Probed metadata
    pub info: ClipInfo,
}

impl Clip {
    /// Create a clip from a path and its probed metadata
    pub fn new<P: Into<PathBuf>>(path: P, info: ClipInfo) -> Self {
        Self {
            path: path.into(),
            info,
        }
    }

    /// File name for log output
    pub fn display_name(&self) -> String {
        display_name(&self.path)
    }
}

/// Short, log-friendly name of a path (its file name, or the whole path)
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Check whether a path looks like a still image rather than a video
pub fn is_image_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .as_deref(),
        Some("png") | Some("jpg") | Some("jpeg") | Some("bmp")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio() {
        let info = ClipInfo { width: 640, height: 480, duration: 4.0 };
        assert!((info.aspect_ratio().unwrap() - 4.0 / 3.0).abs() < 1e-9);

        let unknown = ClipInfo { width: 0, height: 480, duration: 4.0 };
        assert_eq!(unknown.aspect_ratio(), None);
    }

    #[test]
    fn test_display_name_and_image_detection() {
        let clip = Clip::new(
            "assets/toy_exp/wan2.1_h.mp4",
            ClipInfo { width: 832, height: 480, duration: 5.0 },
        );
        assert_eq!(clip.display_name(), "wan2.1_h.mp4");

        assert!(is_image_file(Path::new("motivation-1.PNG")));
        assert!(!is_image_file(Path::new("wan2.1_h.mp4")));
        assert!(!is_image_file(Path::new("no_extension")));
    }
}
