use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, GridError, Result},
    grid::{EncoderSettings, GridGeometry, GridLayout},
    labels::LabelSet,
};

/// Main configuration (the run manifest)
///
/// Every section has defaults, so a manifest only needs the parts it
/// changes. The defaults reproduce the toy-case comparison figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for intermediate files (label image, processed videos)
    pub scratch_dir: PathBuf,

    /// External tool locations
    pub tools: ToolsConfig,

    /// Grid composition job
    pub grid: GridConfig,

    /// Label font chain
    pub labels: LabelsConfig,

    /// Output encoder settings
    pub encoder: EncoderConfig,

    /// Transparent image flattening job
    pub flatten: FlattenConfig,

    /// Square crop batch
    pub square: SquareConfig,

    /// Overlay burn batch
    pub overlay: OverlayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from("tmp"),
            tools: ToolsConfig::default(),
            grid: GridConfig::default(),
            labels: LabelsConfig::default(),
            encoder: EncoderConfig::default(),
            flatten: FlattenConfig::default(),
            square: SquareConfig::default(),
            overlay: OverlayConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.scratch_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingKey { key: "scratch_dir".to_string() }.into());
        }
        self.grid.validate()?;
        self.labels.validate()?;
        self.square.validate()?;
        self.overlay.validate()?;
        Ok(())
    }

    /// Encoder settings for the compositing invocation
    pub fn encoder_settings(&self) -> EncoderSettings {
        EncoderSettings {
            ffmpeg: self.tools.ffmpeg.clone(),
            video_codec: self.encoder.video_codec.clone(),
            pixel_format: self.encoder.pixel_format.clone(),
        }
    }
}

/// External tool locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

/// Grid composition job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Base directory for relative clip paths
    pub clip_dir: PathBuf,

    /// Clip paths, one inner list per row
    pub clips: Vec<Vec<PathBuf>>,

    /// Image placed to the left of the grid
    pub side_image: PathBuf,

    /// Output video path
    pub output: PathBuf,

    /// One caption per row (drawn vertically)
    pub row_labels: Vec<String>,

    /// One caption per column
    pub col_labels: Vec<String>,

    /// Cell and label band geometry
    pub geometry: GridGeometry,
}

impl Default for GridConfig {
    fn default() -> Self {
        let row = |model: &str| -> Vec<PathBuf> {
            ["h", "w", "wo"]
                .iter()
                .map(|variant| PathBuf::from(format!("{}_{}.mp4", model, variant)))
                .collect()
        };

        Self {
            clip_dir: PathBuf::from("assets/toy_exp"),
            clips: vec![row("wan2.1"), row("cogvideox"), row("wan2.2")],
            side_image: PathBuf::from("assets/high_level_insight/motivation-1.png"),
            output: PathBuf::from("assets/high_level_insight/toycase_combined.mp4"),
            row_labels: vec![
                "Wan2.1 T2V".to_string(),
                "CogVideoX1.5".to_string(),
                "Wan2.2 TI2V".to_string(),
            ],
            col_labels: vec![
                "high freq Identity".to_string(),
                "low freq Identity".to_string(),
                "w/o Identity".to_string(),
            ],
            geometry: GridGeometry::default(),
        }
    }
}

impl GridConfig {
    fn validate(&self) -> Result<()> {
        if self.clips.is_empty() || self.clips[0].is_empty() {
            return Err(ConfigError::MissingKey { key: "grid.clips".to_string() }.into());
        }

        let cols = self.clips[0].len();
        if let Some((row, clips)) = self.clips.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(GridError::RaggedRow {
                row,
                found: clips.len(),
                expected: cols,
            }.into());
        }

        let g = &self.geometry;
        for (key, value) in [
            ("grid.geometry.cell_width", g.cell_width),
            ("grid.geometry.cell_height", g.cell_height),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                }.into());
            }
        }

        self.label_set().validate(&self.layout())
    }

    /// Shape and geometry of the grid
    pub fn layout(&self) -> GridLayout {
        let cols = self.clips.first().map(Vec::len).unwrap_or(0);
        GridLayout::new(self.geometry, self.clips.len(), cols)
    }

    pub fn label_set(&self) -> LabelSet {
        LabelSet::new(self.row_labels.clone(), self.col_labels.clone())
    }

    /// Clip paths in row-major order, resolved against `clip_dir`
    pub fn clip_paths(&self) -> Vec<PathBuf> {
        self.clips
            .iter()
            .flatten()
            .map(|clip| self.clip_dir.join(clip))
            .collect()
    }
}

/// Label font chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    /// Font files tried in order; the built-in bitmap font follows the last
    pub font_candidates: Vec<PathBuf>,

    /// Font size in pixels
    pub font_size: f32,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            font_candidates: vec![
                PathBuf::from("/usr/share/fonts/truetype/msttcorefonts/Times_New_Roman.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/freefont/FreeSerif.ttf"),
            ],
            font_size: 14.0,
        }
    }
}

impl LabelsConfig {
    fn validate(&self) -> Result<()> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "labels.font_size".to_string(),
                value: self.font_size.to_string()
            }.into());
        }
        Ok(())
    }
}

/// Output encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub video_codec: String,
    pub pixel_format: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        let settings = EncoderSettings::default();
        Self {
            video_codec: settings.video_codec,
            pixel_format: settings.pixel_format,
        }
    }
}

/// Transparent image flattening job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    pub input: PathBuf,

    /// Defaults to overwriting the input
    pub output: Option<PathBuf>,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("assets/logo.png"),
            output: None,
        }
    }
}

/// Square crop batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquareConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,

    /// File names inside `input_dir`
    pub files: Vec<String>,

    /// Output side length in pixels
    pub size: u32,
}

impl Default for SquareConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("assets/pose_vis"),
            output_dir: PathBuf::from("assets/pose_vis_processed"),
            files: (1..=10).map(|i| format!("{}.png", i)).collect(),
            size: 150,
        }
    }
}

impl SquareConfig {
    fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "square.size".to_string(),
                value: self.size.to_string()
            }.into());
        }
        Ok(())
    }
}

/// Overlay burn batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Base directory for relative overlay image paths
    pub overlay_dir: PathBuf,

    /// Overlay side length is the video width divided by this
    pub scale_divisor: u32,

    pub jobs: Vec<OverlayJob>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            overlay_dir: PathBuf::from("assets/pose_vis_processed"),
            scale_divisor: 5,
            jobs: Vec::new(),
        }
    }
}

impl OverlayConfig {
    fn validate(&self) -> Result<()> {
        if self.scale_divisor == 0 {
            return Err(ConfigError::InvalidValue {
                key: "overlay.scale_divisor".to_string(),
                value: self.scale_divisor.to_string()
            }.into());
        }
        Ok(())
    }
}

/// One video and the image burned into its corner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayJob {
    pub video: PathBuf,
    pub overlay: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompositorError;
    use tempfile::tempdir;

    fn valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("manifest.toml");

        let mut original = valid_config();
        original.overlay.jobs.push(OverlayJob {
            video: PathBuf::from("assets/demos/i2v/7_cam07.mp4"),
            overlay: PathBuf::from("7.png"),
        });

        original.save_to_file(&file_path).unwrap();
        let loaded = Config::from_file(&file_path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_partial_manifest_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("manifest.toml");
        std::fs::write(
            &file_path,
            r#"
scratch_dir = "scratch"

[grid]
clips = [["a.mp4", "b.mp4"]]
row_labels = ["only row"]
col_labels = ["left", "right"]

[grid.geometry]
cell_width = 160
"#,
        )
        .unwrap();

        let config = Config::from_file(&file_path).unwrap();
        config.validate().unwrap();

        let layout = config.grid.layout();
        assert_eq!((layout.rows, layout.cols), (1, 2));
        assert_eq!(config.grid.geometry.cell_width, 160);
        assert_eq!(config.grid.geometry.cell_height, 180);
        assert_eq!(config.labels.font_size, 14.0);
        assert_eq!(config.square.size, 150);
    }

    #[test]
    fn test_clip_paths_are_row_major_and_resolved() {
        let config = valid_config();
        let paths = config.grid.clip_paths();

        assert_eq!(paths.len(), 9);
        assert_eq!(paths[0], PathBuf::from("assets/toy_exp/wan2.1_h.mp4"));
        assert_eq!(paths[5], PathBuf::from("assets/toy_exp/cogvideox_wo.mp4"));
        assert_eq!(paths[8], PathBuf::from("assets/toy_exp/wan2.2_wo.mp4"));
    }

    #[test]
    fn test_label_count_must_match_grid() {
        let mut config = valid_config();
        config.grid.row_labels.pop();
        assert!(matches!(
            config.validate(),
            Err(CompositorError::Config(ConfigError::LabelCountMismatch { .. }))
        ));
    }

    #[test]
    fn test_ragged_grid_is_rejected() {
        let mut config = valid_config();
        config.grid.clips[1].pop();
        assert!(matches!(
            config.validate(),
            Err(CompositorError::Grid(GridError::RaggedRow { row: 1, found: 2, expected: 3 }))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = valid_config();
        config.grid.geometry.cell_width = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.labels.font_size = 0.0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.overlay.scale_divisor = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("does/not/exist.toml");
        assert!(matches!(
            result,
            Err(CompositorError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
