use std::path::{Path, PathBuf};

use crate::grid::geometry::{
    composed_frame_size, cover_fit, scaled_width_for_height, CellFit, GridLayout,
};
use crate::video::ffmpeg::{format_seconds, FfmpegCommand};
use crate::video::filter::{Filter, FilterChain, FilterGraph};
use crate::video::types::ClipInfo;

/// Output pad carrying the finished frame
pub const FINAL_PAD: &str = "final";

/// Where one clip lands on the canvas and how it is normalized
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPlacement {
    /// FFmpeg input index of the clip
    pub input: usize,
    pub row: usize,
    pub col: usize,

    /// Top-left corner on the label-and-video canvas
    pub x: u32,
    pub y: u32,

    /// Explicit scale/crop, known when the clip probed successfully
    pub fit: Option<CellFit>,
}

/// Complete compositing plan for one grid video
///
/// Input order is fixed: the clips in row-major order, then the side
/// image, then the label image.
#[derive(Debug, Clone)]
pub struct GridPlan {
    pub layout: GridLayout,
    pub duration: f64,
    pub cells: Vec<CellPlacement>,
}

impl GridPlan {
    /// Lay out `infos` (row-major, one per cell) on `layout`
    pub fn new(layout: GridLayout, duration: f64, infos: &[Option<ClipInfo>]) -> Self {
        let g = layout.geometry;
        let cells = (0..layout.cell_count())
            .map(|index| {
                let (row, col) = (index / layout.cols, index % layout.cols);
                let (x, y) = layout.cell_origin(row, col);
                let fit = infos
                    .get(index)
                    .copied()
                    .flatten()
                    .and_then(|info| cover_fit(info.width, info.height, g.cell_width, g.cell_height));
                CellPlacement { input: index, row, col, x, y, fit }
            })
            .collect();

        Self { layout, duration, cells }
    }

    pub fn side_input(&self) -> usize {
        self.cells.len()
    }

    pub fn label_input(&self) -> usize {
        self.cells.len() + 1
    }

    /// Predicted output size for a side image of the given dimensions
    pub fn composed_size(&self, side_image: (u32, u32)) -> (u32, u32) {
        let canvas = self.layout.canvas_size();
        let side_width = scaled_width_for_height(side_image.0, side_image.1, canvas.1);
        composed_frame_size(side_width, canvas)
    }

    /// Build the `-filter_complex` graph
    ///
    /// Each clip is scaled to cover its cell and center-cropped, the cells
    /// are overlaid on a white canvas in row-major order, the label image
    /// goes on top at the origin, and the side image (scaled to the canvas
    /// height) is stacked to the left. The result is padded to even
    /// dimensions on its right and bottom edges.
    pub fn filter_graph(&self) -> FilterGraph {
        let g = self.layout.geometry;
        let (canvas_w, canvas_h) = self.layout.canvas_size();
        let mut graph = FilterGraph::new();

        for cell in &self.cells {
            let chain = FilterChain::new().input(format!("{}:v", cell.input));
            let chain = match cell.fit {
                Some(fit) => chain
                    .filter(Filter::scale(fit.scaled_width, fit.scaled_height))
                    .filter(Filter::crop(fit.width, fit.height, Some((fit.left, fit.top)))),
                None => chain
                    .filter(
                        Filter::scale(g.cell_width, g.cell_height)
                            .named("force_original_aspect_ratio", "increase"),
                    )
                    .filter(Filter::crop(g.cell_width, g.cell_height, None)),
            };
            graph.push(
                chain
                    .filter(Filter::new("setsar").arg(1))
                    .output(format!("v{}", cell.input)),
            );
        }

        graph.push(
            FilterChain::new()
                .filter(
                    Filter::new("color")
                        .named("c", "white")
                        .named("s", format!("{}x{}", canvas_w, canvas_h))
                        .named("d", format_seconds(self.duration)),
                )
                .output("bg"),
        );

        let last = self.cells.len().saturating_sub(1);
        for (k, cell) in self.cells.iter().enumerate() {
            let base = if k == 0 { "bg".to_string() } else { format!("t{}", k - 1) };
            let out = if k == last { "grid".to_string() } else { format!("t{}", k) };
            graph.push(
                FilterChain::new()
                    .input(base)
                    .input(format!("v{}", cell.input))
                    .filter(Filter::overlay(cell.x, cell.y))
                    .output(out),
            );
        }

        graph.push(
            FilterChain::new()
                .input("grid")
                .input(format!("{}:v", self.label_input()))
                .filter(Filter::overlay(0, 0))
                .output("labeled"),
        );

        graph.push(
            FilterChain::new()
                .input(format!("{}:v", self.side_input()))
                .filter(Filter::scale(-2, canvas_h))
                .output("side"),
        );

        graph.push(
            FilterChain::new()
                .input("side")
                .input("labeled")
                .filter(Filter::new("hstack").named("inputs", 2))
                .filter(
                    Filter::new("pad")
                        .arg("ceil(iw/2)*2")
                        .arg("ceil(ih/2)*2")
                        .arg(0)
                        .arg(0),
                )
                .output(FINAL_PAD),
        );

        graph
    }

    /// Assemble the full `ffmpeg` invocation
    pub fn command(
        &self,
        clips: &[PathBuf],
        side_image: &Path,
        label_image: &Path,
        output: &Path,
        encoder: &EncoderSettings,
    ) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(output).binary(&encoder.ffmpeg);
        for clip in clips {
            cmd = cmd.input(clip);
        }

        cmd.input(side_image)
            .input(label_image)
            .filter_complex(self.filter_graph())
            .map(FINAL_PAD)
            .duration(self.duration)
            .video_codec(&encoder.video_codec)
            .pixel_format(&encoder.pixel_format)
    }
}

/// Encoder hints passed to the compositing invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub ffmpeg: PathBuf,
    pub video_codec: String,
    pub pixel_format: String,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            video_codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::geometry::GridGeometry;

    fn toy_plan(infos: &[Option<ClipInfo>]) -> GridPlan {
        GridPlan::new(GridLayout::new(GridGeometry::default(), 3, 3), 4.0, infos)
    }

    fn vga() -> Option<ClipInfo> {
        Some(ClipInfo { width: 640, height: 480, duration: 4.0 })
    }

    #[test]
    fn test_cells_are_row_major_with_offsets() {
        let plan = toy_plan(&[vga(); 9]);
        assert_eq!(plan.cells.len(), 9);

        let cell = plan.cells[5];
        assert_eq!((cell.row, cell.col), (1, 2));
        assert_eq!((cell.x, cell.y), (660, 200));
        assert_eq!(plan.side_input(), 9);
        assert_eq!(plan.label_input(), 10);
    }

    #[test]
    fn test_filter_graph_contents() {
        let mut infos = vec![vga(); 9];
        infos[4] = None;
        let graph = toy_plan(&infos).filter_graph().to_string();

        assert!(graph.starts_with("[0:v]scale=320:240,crop=320:180:0:30,setsar=1[v0];"));
        assert!(graph.contains(
            "[4:v]scale=320:180:force_original_aspect_ratio=increase,crop=320:180,setsar=1[v4]"
        ));
        assert!(graph.contains("color=c=white:s=980x560:d=4.000[bg]"));
        assert!(graph.contains("[bg][v0]overlay=20:20[t0]"));
        assert!(graph.contains("[t7][v8]overlay=660:380[grid]"));
        assert!(graph.contains("[grid][10:v]overlay=0:0[labeled]"));
        assert!(graph.contains("[9:v]scale=-2:560[side]"));
        assert!(graph.ends_with(
            "[side][labeled]hstack=inputs=2,pad=ceil(iw/2)*2:ceil(ih/2)*2:0:0[final]"
        ));
        assert_eq!(graph.matches("setsar=1").count(), 9);
    }

    #[test]
    fn test_single_cell_grid() {
        let plan = GridPlan::new(GridLayout::new(GridGeometry::default(), 1, 1), 2.5, &[vga()]);
        let graph = plan.filter_graph().to_string();
        assert!(graph.contains("[bg][v0]overlay=20:20[grid]"));
        assert!(graph.contains("[grid][2:v]overlay=0:0[labeled]"));
    }

    #[test]
    fn test_command_wiring() {
        let clips: Vec<PathBuf> = (0..9).map(|i| PathBuf::from(format!("c{}.mp4", i))).collect();
        let plan = toy_plan(&[vga(); 9]);
        let cmd = plan.command(
            &clips,
            Path::new("side.png"),
            Path::new("labels.png"),
            Path::new("out.mp4"),
            &EncoderSettings::default(),
        );

        assert_eq!(cmd.inputs().len(), 11);
        assert_eq!(cmd.inputs()[9], PathBuf::from("side.png"));
        assert_eq!(cmd.inputs()[10], PathBuf::from("labels.png"));

        let args: Vec<String> = cmd
            .build_args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.windows(2).any(|w| w[0] == "-map" && w[1] == "[final]"));
        assert!(args.windows(2).any(|w| w[0] == "-t" && w[1] == "4.000"));
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        assert!(args.windows(2).any(|w| w[0] == "-pix_fmt" && w[1] == "yuv420p"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn test_composed_size_is_even() {
        let plan = toy_plan(&[vga(); 9]);
        let (w, h) = plan.composed_size((1201, 999));
        assert_eq!((w % 2, h % 2), (0, 0));
        assert_eq!(h, 560);
    }
}
