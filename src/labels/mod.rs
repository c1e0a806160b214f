//! # Grid Labels
//!
//! Synthesizes the transparent label overlay placed on top of the video
//! grid: an opaque white band across the top for column labels, one down
//! the left side for row labels, and the label text itself. Everything
//! else is fully transparent so the videos show through.

pub mod builtin;
pub mod font;

use std::path::{Path, PathBuf};

use image::{imageops, Rgba, RgbaImage};
use tracing::{debug, info};

use crate::error::{ConfigError, GridError, Result};
use crate::grid::GridLayout;

pub use font::LabelFont;

/// File name of the label image inside the scratch directory
pub const LABEL_FILE_NAME: &str = "labels.png";

const BAND_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Row and column captions, in grid order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
}

impl LabelSet {
    pub fn new(rows: Vec<String>, cols: Vec<String>) -> Self {
        Self { rows, cols }
    }

    /// One label per row and one per column
    pub fn validate(&self, layout: &GridLayout) -> Result<()> {
        if self.rows.len() != layout.rows {
            return Err(ConfigError::LabelCountMismatch {
                kind: "Row".to_string(),
                found: self.rows.len(),
                expected: layout.rows,
            }
            .into());
        }
        if self.cols.len() != layout.cols {
            return Err(ConfigError::LabelCountMismatch {
                kind: "Column".to_string(),
                found: self.cols.len(),
                expected: layout.cols,
            }
            .into());
        }
        Ok(())
    }
}

/// Render the label overlay for `layout`
///
/// The image is exactly the size of the label-and-video canvas. Column
/// labels are centered on their column with their bottom edge `text_gap`
/// pixels above the top band's lower edge. Row labels are rotated 90°
/// counter-clockwise, centered on their row and right-aligned `text_gap`
/// pixels left of the grid.
pub fn render_label_image(layout: &GridLayout, labels: &LabelSet, font: &LabelFont) -> Result<RgbaImage> {
    labels.validate(layout)?;

    let g = layout.geometry;
    let (width, height) = layout.canvas_size();
    let mut canvas = RgbaImage::new(width, height);

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        if y < g.col_label_height || x < g.row_label_width {
            *pixel = BAND_COLOR;
        }
    }

    for (col, label) in labels.cols.iter().enumerate() {
        let Some(text) = font.rasterize(label) else {
            continue;
        };
        let x = layout.col_center_x(col) as i64 - (text.width() / 2) as i64;
        let y = g.col_label_height as i64 - g.text_gap as i64 - text.height() as i64;
        debug!("Column label {:?} at ({}, {})", label, x, y);
        imageops::overlay(&mut canvas, &text, x, y);
    }

    for (row, label) in labels.rows.iter().enumerate() {
        let Some(text) = font.rasterize(label) else {
            continue;
        };
        let rotated = imageops::rotate270(&text);
        let x = g.row_label_width as i64 - g.text_gap as i64 - rotated.width() as i64;
        let y = layout.row_center_y(row) as i64 - (rotated.height() / 2) as i64;
        debug!("Row label {:?} at ({}, {})", label, x, y);
        imageops::overlay(&mut canvas, &rotated, x, y);
    }

    Ok(canvas)
}

/// Render the label overlay and save it as `labels.png` in `scratch_dir`
pub fn write_label_image(
    layout: &GridLayout,
    labels: &LabelSet,
    font: &LabelFont,
    scratch_dir: &Path,
) -> Result<PathBuf> {
    let image = render_label_image(layout, labels, font)?;

    std::fs::create_dir_all(scratch_dir)?;
    let path = scratch_dir.join(LABEL_FILE_NAME);
    image.save(&path).map_err(|e| GridError::LabelRenderFailed {
        reason: format!("could not write {}: {}", path.display(), e),
    })?;

    info!("   Labels saved to: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompositorError;
    use crate::grid::GridGeometry;

    fn toy_layout() -> GridLayout {
        GridLayout::new(GridGeometry::default(), 3, 3)
    }

    fn toy_labels() -> LabelSet {
        LabelSet::new(
            vec!["Wan2.1 T2V".into(), "CogVideoX1.5".into(), "Wan2.2 TI2V".into()],
            vec!["high freq Identity".into(), "low freq Identity".into(), "w/o Identity".into()],
        )
    }

    /// Anything drawn on an opaque white band
    fn is_ink(p: &Rgba<u8>) -> bool {
        p[3] > 0 && *p != BAND_COLOR
    }

    #[test]
    fn test_canvas_size_and_bands() {
        let img = render_label_image(&toy_layout(), &toy_labels(), &LabelFont::builtin(14.0)).unwrap();
        assert_eq!(img.dimensions(), (980, 560));

        // Band corners are opaque; cell interiors are fully transparent.
        assert_eq!(img.get_pixel(979, 0)[3], 255);
        assert_eq!(img.get_pixel(0, 559)[3], 255);
        assert_eq!(*img.get_pixel(500, 300), Rgba([0, 0, 0, 0]));
        assert_eq!(*img.get_pixel(21, 21), Rgba([0, 0, 0, 0]));
        assert_eq!(*img.get_pixel(979, 559), Rgba([0, 0, 0, 0]));
    }

    fn assert_column_labels_sit_above_the_gap(font: &LabelFont) {
        let layout = toy_layout();
        let img = render_label_image(&layout, &toy_labels(), font).unwrap();
        let g = layout.geometry;

        for col in 0..3 {
            let x0 = layout.cell_origin(0, col).0;
            let ink: Vec<(u32, u32)> = (0..g.col_label_height)
                .flat_map(|y| (x0..x0 + g.cell_width).map(move |x| (x, y)))
                .filter(|&(x, y)| is_ink(img.get_pixel(x, y)))
                .collect();
            assert!(!ink.is_empty(), "column {} has no text", col);

            let bottom = ink.iter().map(|&(_, y)| y).max().unwrap();
            assert_eq!(bottom, g.col_label_height - g.text_gap - 1);

            // Roughly centered on the column.
            let left = ink.iter().map(|&(x, _)| x).min().unwrap();
            let right = ink.iter().map(|&(x, _)| x).max().unwrap();
            let center = (left + right) / 2;
            assert!((center as i64 - layout.col_center_x(col) as i64).abs() <= 2);
        }
    }

    fn assert_row_labels_are_vertical_and_right_aligned(font: &LabelFont) {
        let layout = toy_layout();
        let img = render_label_image(&layout, &toy_labels(), font).unwrap();
        let g = layout.geometry;

        for row in 0..3 {
            let y0 = layout.cell_origin(row, 0).1;
            let ink: Vec<(u32, u32)> = (y0..y0 + g.cell_height)
                .flat_map(|y| (0..g.row_label_width).map(move |x| (x, y)))
                .filter(|&(x, y)| is_ink(img.get_pixel(x, y)))
                .collect();
            assert!(!ink.is_empty(), "row {} has no text", row);

            let right = ink.iter().map(|&(x, _)| x).max().unwrap();
            assert_eq!(right, g.row_label_width - g.text_gap - 1);

            // Rotated text is taller than it is wide, centered on the row.
            let top = ink.iter().map(|&(_, y)| y).min().unwrap();
            let bottom = ink.iter().map(|&(_, y)| y).max().unwrap();
            let left = ink.iter().map(|&(x, _)| x).min().unwrap();
            assert!(bottom - top > right - left);
            let center = (top + bottom) / 2;
            assert!((center as i64 - layout.row_center_y(row) as i64).abs() <= 2);
        }
    }

    #[test]
    fn test_column_labels_sit_above_the_gap() {
        assert_column_labels_sit_above_the_gap(&LabelFont::builtin(14.0));
    }

    #[test]
    fn test_row_labels_are_vertical_and_right_aligned() {
        assert_row_labels_are_vertical_and_right_aligned(&LabelFont::builtin(14.0));
    }

    #[test]
    fn test_outline_font_labels_follow_the_same_layout() {
        let Some(font) = font::system_outline_font(14.0) else {
            eprintln!("no system outline font found, skipping");
            return;
        };
        assert_column_labels_sit_above_the_gap(&font);
        assert_row_labels_are_vertical_and_right_aligned(&font);
    }

    #[test]
    fn test_label_count_mismatch_is_rejected() {
        let mut labels = toy_labels();
        labels.cols.pop();
        let result = render_label_image(&toy_layout(), &labels, &LabelFont::builtin(14.0));
        assert!(matches!(
            result,
            Err(CompositorError::Config(ConfigError::LabelCountMismatch { found: 2, expected: 3, .. }))
        ));
    }

    #[test]
    fn test_write_label_image() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("tmp");
        let path = write_label_image(&toy_layout(), &toy_labels(), &LabelFont::builtin(14.0), &scratch).unwrap();

        assert_eq!(path, scratch.join(LABEL_FILE_NAME));
        let reloaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(reloaded.dimensions(), (980, 560));
    }
}
