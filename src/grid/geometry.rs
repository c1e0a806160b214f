use serde::{Deserialize, Serialize};

/// Pixel geometry shared by every cell of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridGeometry {
    /// Rendered width of each cell
    pub cell_width: u32,

    /// Rendered height of each cell
    pub cell_height: u32,

    /// Width of the left band holding the row labels
    pub row_label_width: u32,

    /// Height of the top band holding the column labels
    pub col_label_height: u32,

    /// Gap between label text and the video edge
    pub text_gap: u32,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            cell_width: 320,
            cell_height: 180,
            row_label_width: 20,
            col_label_height: 20,
            text_gap: 2,
        }
    }
}

/// Geometry plus the grid's shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub geometry: GridGeometry,
    pub rows: usize,
    pub cols: usize,
}

impl GridLayout {
    pub fn new(geometry: GridGeometry, rows: usize, cols: usize) -> Self {
        Self { geometry, rows, cols }
    }

    /// Size of the label-and-video canvas:
    /// `(row_label_width + cw*cols, col_label_height + ch*rows)`
    pub fn canvas_size(&self) -> (u32, u32) {
        let g = &self.geometry;
        (
            g.row_label_width + g.cell_width * self.cols as u32,
            g.col_label_height + g.cell_height * self.rows as u32,
        )
    }

    /// Top-left corner of cell (`row`, `col`) on the canvas
    pub fn cell_origin(&self, row: usize, col: usize) -> (u32, u32) {
        let g = &self.geometry;
        (
            g.row_label_width + g.cell_width * col as u32,
            g.col_label_height + g.cell_height * row as u32,
        )
    }

    /// Horizontal center of column `col`
    pub fn col_center_x(&self, col: usize) -> u32 {
        self.cell_origin(0, col).0 + self.geometry.cell_width / 2
    }

    /// Vertical center of row `row`
    pub fn row_center_y(&self, row: usize) -> u32 {
        self.cell_origin(row, 0).1 + self.geometry.cell_height / 2
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

/// Scale-to-cover then center-crop parameters for one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellFit {
    /// Size after scaling, before cropping (always >= the cell size)
    pub scaled_width: u32,
    pub scaled_height: u32,

    /// Crop offset inside the scaled frame
    pub left: u32,
    pub top: u32,

    /// Final cell size
    pub width: u32,
    pub height: u32,
}

/// Compute how a `src_w × src_h` source covers a `cell_w × cell_h` cell.
///
/// The scale factor is `max(cell_w/src_w, cell_h/src_h)`, so the scaled
/// frame covers the cell in both directions; the excess is cropped evenly
/// from both sides. Returns `None` for a source with a zero dimension.
pub fn cover_fit(src_w: u32, src_h: u32, cell_w: u32, cell_h: u32) -> Option<CellFit> {
    if src_w == 0 || src_h == 0 || cell_w == 0 || cell_h == 0 {
        return None;
    }

    let factor = f64::max(
        cell_w as f64 / src_w as f64,
        cell_h as f64 / src_h as f64,
    );
    let scaled_width = ((src_w as f64 * factor).round() as u32).max(cell_w);
    let scaled_height = ((src_h as f64 * factor).round() as u32).max(cell_h);

    Some(CellFit {
        scaled_width,
        scaled_height,
        left: (scaled_width - cell_w) / 2,
        top: (scaled_height - cell_h) / 2,
        width: cell_w,
        height: cell_h,
    })
}

/// Round up to the nearest even number
pub fn even_ceil(value: u32) -> u32 {
    value.div_ceil(2) * 2
}

/// Width of an image scaled to `target_height` with an even, free width
/// (the `scale=-2:H` rule).
pub fn scaled_width_for_height(src_w: u32, src_h: u32, target_height: u32) -> u32 {
    if src_h == 0 {
        return 0;
    }
    let width = (src_w as f64 * target_height as f64 / src_h as f64).round() as u32;
    (width / 2 * 2).max(2)
}

/// Final frame size: side image and labeled grid side by side, padded on
/// the trailing edges to even dimensions.
pub fn composed_frame_size(side_width: u32, canvas: (u32, u32)) -> (u32, u32) {
    (even_ceil(side_width + canvas.0), even_ceil(canvas.1))
}
