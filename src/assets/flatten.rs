use std::path::Path;

use image::{imageops, DynamicImage, Rgba, RgbImage, RgbaImage};
use tracing::info;

use crate::error::{AssetError, Result};

/// What [`flatten_file`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlattenOutcome {
    /// The image had an alpha channel and was composited onto white
    Flattened,
    /// The image was already opaque and was saved unchanged
    Unchanged,
}

/// Composite an image with alpha over opaque white
///
/// Returns `None` for images without an alpha channel.
pub fn flatten_onto_white(img: &DynamicImage) -> Option<RgbImage> {
    if !img.color().has_alpha() {
        return None;
    }

    let rgba = img.to_rgba8();
    let mut background = RgbaImage::from_pixel(rgba.width(), rgba.height(), Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut background, &rgba, 0, 0);
    Some(DynamicImage::ImageRgba8(background).to_rgb8())
}

/// Flatten `input` onto white and write the result to `output`
///
/// `output` may be the same path as `input`.
pub fn flatten_file(input: &Path, output: &Path) -> Result<FlattenOutcome> {
    let img = image::open(input).map_err(|_| AssetError::LoadFailed { path: input.to_path_buf() })?;

    let (outcome, result) = match flatten_onto_white(&img) {
        Some(flat) => (FlattenOutcome::Flattened, flat.save(output)),
        None => (FlattenOutcome::Unchanged, img.save(output)),
    };
    result.map_err(|e| AssetError::SaveFailed {
        path: output.to_path_buf(),
        reason: e.to_string(),
    })?;

    info!("{:?}: {} -> {}", outcome, input.display(), output.display());
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_transparent_pixels_become_white() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([200, 10, 10, 255]));

        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(rgba)).unwrap();
        assert_eq!(*flat.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*flat.get_pixel(1, 0), Rgb([200, 10, 10]));
    }

    #[test]
    fn test_half_transparent_blends_toward_white() {
        let rgba = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(rgba)).unwrap();
        let value = flat.get_pixel(0, 0)[0];
        assert!((120..=135).contains(&value), "got {}", value);
    }

    #[test]
    fn test_opaque_images_are_left_alone() {
        let rgb = RgbImage::from_pixel(3, 3, Rgb([1, 2, 3]));
        assert!(flatten_onto_white(&DynamicImage::ImageRgb8(rgb)).is_none());
    }

    #[test]
    fn test_flatten_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0])).save(&path).unwrap();

        let outcome = flatten_file(&path, &path).unwrap();
        assert_eq!(outcome, FlattenOutcome::Flattened);

        let reloaded = image::open(&path).unwrap();
        assert!(!reloaded.color().has_alpha());
        assert_eq!(*reloaded.to_rgb8().get_pixel(2, 2), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.png");
        assert!(flatten_file(&missing, &missing).is_err());
    }
}
