use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{imageops, Rgba, RgbaImage};
use resvg::tiny_skia;
use tracing::{debug, info, warn};
use usvg::fontdb;

use crate::labels::builtin;

/// Font used to draw grid labels
///
/// Resolved from an ordered list of candidate font files; the built-in
/// bitmap font is always the final fallback, so resolution cannot fail.
#[derive(Clone)]
pub enum LabelFont {
    /// An outline font loaded from disk, rendered through resvg
    Outline {
        fontdb: Arc<fontdb::Database>,
        family: String,
        source: PathBuf,
        size: f32,
    },

    /// The built-in 5×8 bitmap font, scaled by an integer factor
    Builtin { scale: u32 },
}

impl LabelFont {
    /// Try each candidate in order and fall back to the built-in font
    pub fn resolve(candidates: &[PathBuf], size: f32) -> Self {
        for path in candidates {
            match load_family(path) {
                Some((db, family)) => {
                    info!("Label font: {} ({})", family, path.display());
                    return Self::Outline {
                        fontdb: Arc::new(db),
                        family,
                        source: path.clone(),
                        size,
                    };
                }
                None => debug!("Font candidate unavailable: {}", path.display()),
            }
        }

        warn!("No label font candidates could be loaded, using the built-in bitmap font");
        Self::builtin(size)
    }

    pub fn builtin(size: f32) -> Self {
        Self::Builtin { scale: builtin::scale_for_size(size) }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin { .. })
    }

    /// Human-readable description for logs
    pub fn describe(&self) -> String {
        match self {
            Self::Outline { family, source, size, .. } => {
                format!("{} {}pt ({})", family, size, source.display())
            }
            Self::Builtin { scale } => format!("built-in bitmap x{}", scale),
        }
    }

    /// Render `text` in black on transparent, cropped to its inked area
    ///
    /// Returns `None` when the text has no visible pixels (empty or blank).
    pub fn rasterize(&self, text: &str) -> Option<RgbaImage> {
        if text.trim().is_empty() {
            return None;
        }

        match self {
            Self::Outline { fontdb, family, size, .. } => {
                match rasterize_outline(text, fontdb, family, *size) {
                    Some(img) => crop_to_ink(&img),
                    None => {
                        warn!("Outline rendering of {:?} failed, using the built-in font", text);
                        crop_to_ink(&builtin::rasterize(text, builtin::scale_for_size(*size)))
                    }
                }
            }
            Self::Builtin { scale } => crop_to_ink(&builtin::rasterize(text, *scale)),
        }
    }
}

fn load_family(path: &Path) -> Option<(fontdb::Database, String)> {
    if !path.is_file() {
        return None;
    }

    let mut db = fontdb::Database::new();
    db.load_font_data(std::fs::read(path).ok()?);
    let family = db.faces().next()?.families.first()?.0.clone();
    Some((db, family))
}

fn rasterize_outline(
    text: &str,
    fontdb: &Arc<fontdb::Database>,
    family: &str,
    size: f32,
) -> Option<RgbaImage> {
    let em = size.ceil().max(1.0) as u32;
    let pad = em.max(2);
    let width = text.chars().count() as u32 * em + 2 * pad;
    let height = 2 * em + 2 * pad;
    let baseline = pad as f32 + size * 1.2;

    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}"><text x="{}" y="{}" font-family="'{}'" font-size="{}" fill="black">{}</text></svg>"##,
        width,
        height,
        pad,
        baseline,
        escape_xml(family),
        size,
        escape_xml(text),
    );

    let opts = usvg::Options {
        fontdb: Arc::clone(fontdb),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(&svg, &opts).ok()?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    let mut img = RgbaImage::new(width, height);
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Some(img)
}

/// Crop an image to the bounding box of its non-transparent pixels
pub fn crop_to_ink(img: &RgbaImage) -> Option<RgbaImage> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    let (x0, y0, x1, y1) = bounds?;
    Some(imageops::crop_imm(img, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image())
}

/// Outline font resolved from common system locations, for tests that
/// exercise the resvg path. `None` on hosts without any of them.
#[cfg(test)]
pub(crate) fn system_outline_font(size: f32) -> Option<LabelFont> {
    let candidates = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
        "/usr/share/fonts/truetype/freefont/FreeSerif.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
        "/usr/share/fonts/dejavu/DejaVuSerif.ttf",
        "/Library/Fonts/Times New Roman.ttf",
    ]
    .map(PathBuf::from);

    let font = LabelFont::resolve(&candidates, size);
    (!font.is_builtin()).then_some(font)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_candidates_fall_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_font = dir.path().join("broken.ttf");
        std::fs::write(&not_a_font, b"definitely not a font").unwrap();

        let candidates = vec![
            dir.path().join("Times_New_Roman.ttf"),
            not_a_font,
        ];
        let font = LabelFont::resolve(&candidates, 14.0);
        assert!(font.is_builtin());
        assert!(font.describe().contains("built-in"));
    }

    #[test]
    fn test_builtin_rasterize_is_tight() {
        let font = LabelFont::builtin(14.0);
        let img = font.rasterize("w/o Identity").unwrap();

        // Tight crop: every edge row/column carries ink.
        assert_tight(&img);
    }

    fn assert_tight(img: &RgbaImage) {
        let (w, h) = img.dimensions();
        assert!(w > 0 && h > 0);
        assert!((0..w).any(|x| img.get_pixel(x, 0)[3] > 0));
        assert!((0..w).any(|x| img.get_pixel(x, h - 1)[3] > 0));
        assert!((0..h).any(|y| img.get_pixel(0, y)[3] > 0));
        assert!((0..h).any(|y| img.get_pixel(w - 1, y)[3] > 0));
    }

    #[test]
    fn test_outline_font_resolves_and_renders() {
        let Some(font) = system_outline_font(14.0) else {
            eprintln!("no system outline font found, skipping");
            return;
        };
        let LabelFont::Outline { fontdb, family, .. } = &font else {
            panic!("expected an outline font");
        };
        // The outline renderer itself must produce ink, not the fallback.
        let raw = rasterize_outline("high freq Identity", fontdb, family, 14.0).unwrap();
        assert!(crop_to_ink(&raw).is_some());

        let img = font.rasterize("high freq Identity").unwrap();
        assert_tight(&img);
        // Black ink, wider than tall, and roughly the font size high.
        assert!(img.pixels().any(|p| p[3] >= 128 && p[0] < 64));
        assert!(img.width() > img.height());
        assert!((8..=24).contains(&img.height()), "height {}", img.height());
    }

    #[test]
    fn test_resolve_skips_missing_candidates_before_a_real_font() {
        let Some(LabelFont::Outline { source, .. }) = system_outline_font(14.0) else {
            return;
        };
        let candidates = vec![PathBuf::from("/nonexistent/Times_New_Roman.ttf"), source.clone()];
        match LabelFont::resolve(&candidates, 14.0) {
            LabelFont::Outline { source: picked, .. } => assert_eq!(picked, source),
            LabelFont::Builtin { .. } => panic!("fell back despite a loadable font"),
        }
    }

    #[test]
    fn test_blank_text_has_no_ink() {
        let font = LabelFont::builtin(14.0);
        assert!(font.rasterize("").is_none());
        assert!(font.rasterize("   ").is_none());
    }

    #[test]
    fn test_crop_to_ink() {
        let mut img = RgbaImage::new(10, 10);
        img.put_pixel(2, 3, Rgba([0, 0, 0, 255]));
        img.put_pixel(6, 8, Rgba([0, 0, 0, 128]));

        let cropped = crop_to_ink(&img).unwrap();
        assert_eq!(cropped.dimensions(), (5, 6));
        assert!(crop_to_ink(&RgbaImage::new(4, 4)).is_none());
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
    }
}
