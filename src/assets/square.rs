use std::path::{Path, PathBuf};

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{AssetError, Result};

/// Center-crop to the largest square, then resize to `size × size`
pub fn square_crop(img: &DynamicImage, size: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    let side = width.min(height);
    let left = (width - side) / 2;
    let top = (height - side) / 2;

    img.crop_imm(left, top, side, side)
        .resize_exact(size, size, FilterType::Lanczos3)
}

/// Square-crop one file
pub fn square_file(input: &Path, output: &Path, size: u32) -> Result<()> {
    let img = image::open(input).map_err(|_| AssetError::LoadFailed { path: input.to_path_buf() })?;
    square_crop(&img, size)
        .save(output)
        .map_err(|e| AssetError::SaveFailed {
            path: output.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(())
}

/// Result of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.processed.len() + self.failed.len()
    }

    /// Turn any failures into an error
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(AssetError::BatchFailed {
                failed: self.failed.len(),
                total: self.total(),
            }.into())
        }
    }
}

/// Square-crop every listed file from `input_dir` into `output_dir`
///
/// Files are processed in parallel; one failing file does not stop the
/// others. The report lists files in input order.
pub fn square_batch(input_dir: &Path, output_dir: &Path, files: &[String], size: u32) -> Result<BatchReport> {
    std::fs::create_dir_all(output_dir)?;

    let results: Vec<(PathBuf, Result<()>)> = files
        .par_iter()
        .map(|name| {
            let input = input_dir.join(name);
            let output = output_dir.join(name);
            let result = square_file(&input, &output, size);
            (input, result)
        })
        .collect();

    let mut report = BatchReport::default();
    for (input, result) in results {
        match result {
            Ok(()) => {
                info!("Processed {}", input.display());
                report.processed.push(input);
            }
            Err(e) => {
                warn!("Failed {}: {}", input.display(), e);
                report.failed.push(input);
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_square_crop_is_centered() {
        // Left and right thirds red, middle green: a centered square is all green.
        let img = RgbImage::from_fn(300, 100, |x, _| {
            if (100..200).contains(&x) { Rgb([0, 255, 0]) } else { Rgb([255, 0, 0]) }
        });
        let squared = square_crop(&DynamicImage::ImageRgb8(img), 50).to_rgb8();

        assert_eq!(squared.dimensions(), (50, 50));
        assert_eq!(*squared.get_pixel(25, 25), Rgb([0, 255, 0]));
        assert!(squared.get_pixel(2, 25)[1] > 200);
    }

    #[test]
    fn test_portrait_input() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(90, 160));
        assert_eq!(square_crop(&img, 150).dimensions(), (150, 150));
    }

    #[test]
    fn test_batch_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("pose_vis");
        let output_dir = dir.path().join("pose_vis_processed");
        std::fs::create_dir_all(&input_dir).unwrap();

        RgbImage::new(640, 480).save(input_dir.join("1.png")).unwrap();
        RgbImage::new(480, 640).save(input_dir.join("3.png")).unwrap();

        let files = vec!["1.png".to_string(), "2.png".to_string(), "3.png".to_string()];
        let report = square_batch(&input_dir, &output_dir, &files, 150).unwrap();

        assert_eq!(report.processed, vec![input_dir.join("1.png"), input_dir.join("3.png")]);
        assert_eq!(report.failed, vec![input_dir.join("2.png")]);
        assert_eq!(image::open(output_dir.join("3.png")).unwrap().dimensions(), (150, 150));
        assert!(report.into_result().is_err());
    }
}
