//! Layout Engine - Deterministic Composition
//!
//! White canvas, packshot scaled to a fixed share of the area and centred,
//! optional logo top-left, headline near the bottom.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::Serialize;
use tracing::debug;

use crate::assets::ImageAsset;
use crate::canvas::CanvasSpec;
use crate::raster;
use crate::storage::CreativeId;
use crate::text::{render_headline, HeadlineFont, HeadlinePlacement};

/// Share of the canvas area reserved for the packshot. Not a retailer setting.
pub const PACKSHOT_AREA_PCT: f64 = 0.45;
pub const LOGO_WIDTH_PCT: f64 = 0.18;
pub const LOGO_OFFSET_PCT: f64 = 0.05;

const CANVAS_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Final packshot size after scaling. Position does not matter for compliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacementResult {
    pub width: u32,
    pub height: u32,
}

impl PlacementResult {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Finished canvas plus the identifier it will be stored under.
#[derive(Debug, Clone)]
pub struct ComposedCreative {
    pub id: CreativeId,
    pub canvas: RgbaImage,
}

impl ComposedCreative {
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = std::io::Cursor::new(Vec::new());
        self.canvas.write_to(&mut buf, image::ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}

#[derive(Debug, Clone)]
pub struct Composition {
    pub creative: ComposedCreative,
    pub placement: PlacementResult,
    pub logo_placed: bool,
    pub headline: Option<HeadlinePlacement>,
}

/// Packshot size for a canvas: area fixed at `PACKSHOT_AREA_PCT`, aspect ratio kept.
pub fn packshot_size(canvas: CanvasSpec, aspect_ratio: f64) -> PlacementResult {
    let target_area = (canvas.area() as f64 * PACKSHOT_AREA_PCT).floor();
    let ratio = if aspect_ratio > 0.0 && aspect_ratio.is_finite() {
        aspect_ratio
    } else {
        1.0
    };
    let height = ((target_area / ratio).sqrt().floor() as u32).max(1);
    let width = ((height as f64 * ratio).floor() as u32).max(1);
    PlacementResult { width, height }
}

/// Logo size: fixed share of the canvas width, height from the aspect ratio.
pub fn logo_size(canvas: CanvasSpec, aspect_ratio: f64) -> (u32, u32) {
    let ratio = if aspect_ratio > 0.0 && aspect_ratio.is_finite() {
        aspect_ratio
    } else {
        1.0
    };
    let width = ((canvas.width as f64 * LOGO_WIDTH_PCT).floor() as u32).max(1);
    let height = ((width as f64 / ratio).floor() as u32).max(1);
    (width, height)
}

/// Lanczos resize; empty sources become a transparent block of the target size.
fn resize(asset: ImageAsset, width: u32, height: u32) -> RgbaImage {
    if asset.width() == 0 || asset.height() == 0 {
        return RgbaImage::new(width, height);
    }
    if (asset.width(), asset.height()) == (width, height) {
        return asset.into_pixels();
    }
    imageops::resize(asset.pixels(), width, height, FilterType::Lanczos3)
}

pub struct LayoutEngine {
    font: HeadlineFont,
}

impl LayoutEngine {
    pub fn new(font: HeadlineFont) -> Self {
        Self { font }
    }

    pub fn font(&self) -> &HeadlineFont {
        &self.font
    }

    /// Compose a creative. Consumes the decoded assets.
    pub fn compose(
        &self,
        canvas_spec: CanvasSpec,
        packshot: ImageAsset,
        logo: Option<ImageAsset>,
        headline: &str,
    ) -> Composition {
        let (w, h) = (canvas_spec.width, canvas_spec.height);
        let mut canvas = RgbaImage::from_pixel(w, h, CANVAS_BACKGROUND);

        let placement = packshot_size(canvas_spec, packshot.aspect_ratio());
        let scaled = resize(packshot, placement.width, placement.height);
        let px = (w as i64 - placement.width as i64).div_euclid(2);
        let py = (h as i64 - placement.height as i64).div_euclid(2);
        raster::overlay(&mut canvas, &scaled, px, py);
        debug!(
            width = placement.width,
            height = placement.height,
            x = px,
            y = py,
            "packshot placed"
        );

        let logo_placed = match logo {
            Some(logo) => {
                let (lw, lh) = logo_size(canvas_spec, logo.aspect_ratio());
                let scaled = resize(logo, lw, lh);
                let lx = (w as f64 * LOGO_OFFSET_PCT).floor() as i64;
                let ly = (h as f64 * LOGO_OFFSET_PCT).floor() as i64;
                raster::overlay(&mut canvas, &scaled, lx, ly);
                debug!(width = lw, height = lh, x = lx, y = ly, "logo placed");
                true
            }
            None => false,
        };

        let headline = render_headline(&mut canvas, &self.font, headline);

        Composition {
            creative: ComposedCreative {
                id: CreativeId::generate(),
                canvas,
            },
            placement,
            logo_placed,
            headline,
        }
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(HeadlineFont::bitmap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasFormat;

    fn solid(w: u32, h: u32, color: [u8; 4]) -> ImageAsset {
        ImageAsset::from_rgba(RgbaImage::from_pixel(w, h, Rgba(color)))
    }

    #[test]
    fn test_feed_packshot_4_3() {
        let p = packshot_size(CanvasFormat::Feed.spec(), 800.0 / 600.0);
        assert_eq!(p.height, 697);
        assert_eq!(p.width, 929);
    }

    #[test]
    fn test_degenerate_ratio_treated_as_square() {
        let canvas = CanvasSpec::new(100, 100);
        let p = packshot_size(canvas, 0.0);
        assert_eq!((p.width, p.height), (67, 67));
        let (lw, lh) = logo_size(canvas, f64::NAN);
        assert_eq!((lw, lh), (18, 18));
    }

    #[test]
    fn test_tiny_canvas_clamps_to_one_pixel() {
        let p = packshot_size(CanvasSpec::new(1, 1), 1.0);
        assert_eq!((p.width, p.height), (1, 1));
    }

    #[test]
    fn test_compose_centers_packshot() {
        let engine = LayoutEngine::default();
        let out = engine.compose(
            CanvasFormat::Feed.spec(),
            solid(100, 100, [255, 0, 0, 255]),
            None,
            "",
        );
        assert_eq!(out.creative.canvas.dimensions(), (1200, 1200));
        assert!(!out.logo_placed);
        assert!(out.headline.is_none());
        assert_eq!(out.creative.canvas.get_pixel(600, 600), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.creative.canvas.get_pixel(5, 5), &CANVAS_BACKGROUND);
    }

    #[test]
    fn test_transparent_packshot_keeps_background() {
        let engine = LayoutEngine::default();
        let out = engine.compose(
            CanvasFormat::Story.spec(),
            solid(40, 80, [0, 0, 0, 0]),
            None,
            "",
        );
        assert_eq!(out.creative.canvas.dimensions(), (1080, 1920));
        assert_eq!(out.creative.canvas.get_pixel(540, 960), &CANVAS_BACKGROUND);
    }

    #[test]
    fn test_logo_top_left() {
        let engine = LayoutEngine::default();
        let out = engine.compose(
            CanvasFormat::Feed.spec(),
            solid(10, 10, [0, 0, 0, 0]),
            Some(solid(50, 25, [0, 0, 255, 255])),
            "",
        );
        assert!(out.logo_placed);
        let canvas = &out.creative.canvas;
        // logo is 216x108 at (60, 60)
        assert_eq!(canvas.get_pixel(60, 60), &Rgba([0, 0, 255, 255]));
        assert_eq!(canvas.get_pixel(60 + 215, 60 + 107), &Rgba([0, 0, 255, 255]));
        assert_eq!(canvas.get_pixel(59, 59), &CANVAS_BACKGROUND);
        assert_eq!(canvas.get_pixel(60 + 216, 60), &CANVAS_BACKGROUND);
    }

    #[test]
    fn test_oversized_packshot_is_clipped() {
        let engine = LayoutEngine::default();
        let out = engine.compose(
            CanvasSpec::new(200, 200),
            solid(4000, 1, [0, 255, 0, 255]),
            None,
            "",
        );
        assert!(out.placement.width > 200);
        assert_eq!(out.creative.canvas.dimensions(), (200, 200));
    }

    #[test]
    fn test_encode_png_roundtrips_size() {
        let engine = LayoutEngine::default();
        let out = engine.compose(CanvasSpec::new(64, 32), solid(8, 8, [1, 2, 3, 255]), None, "x");
        let png = out.creative.encode_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }
}
