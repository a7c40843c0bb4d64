//! Headline Rendering
//!
//! A bold TrueType face when one can be found, otherwise the 8x8 bitmap glyphs
//! from `font8x8` scaled up to roughly the same size.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::raster::{blend_pixel, fill_rect};

pub const HEADLINE_FONT_PX: f32 = 36.0;
/// Backdrop padding around the measured text box, all sides.
pub const BACKDROP_PADDING: i64 = 10;
/// Headline top edge sits this fraction of the canvas height above the bottom.
pub const HEADLINE_BOTTOM_PCT: f64 = 0.12;

const BACKDROP_COLOR: Rgba<u8> = Rgba([0, 0, 0, 150]);
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

const FONT_FILE: &str = "DejaVuSans-Bold.ttf";
const FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/TTF",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    ".",
];

#[derive(Debug, Error)]
pub enum FontError {
    #[error("No bold font found (looked for {0})")]
    NotFound(String),

    #[error("Failed to read font {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a usable TrueType font: {0}")]
    Invalid(String),
}

/// Ink bounds of a rendered string, relative to the layout origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextBox {
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    offset_x: i32,
    #[serde(skip)]
    offset_y: i32,
}

/// Where the headline ended up on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeadlinePlacement {
    pub x: i64,
    pub y: i64,
    pub text: TextBox,
}

#[derive(Clone)]
pub enum HeadlineFont {
    TrueType { font: Arc<Font<'static>>, px: f32 },
    Bitmap { scale: u32 },
}

impl fmt::Debug for HeadlineFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadlineFont::TrueType { px, .. } => write!(f, "TrueType({px}px)"),
            HeadlineFont::Bitmap { scale } => write!(f, "Bitmap(x{scale})"),
        }
    }
}

impl HeadlineFont {
    pub fn bitmap() -> Self {
        HeadlineFont::Bitmap {
            scale: (HEADLINE_FONT_PX / 8.0).floor().max(1.0) as u32,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, FontError> {
        let data = fs::read(path).map_err(|source| FontError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let font = Font::try_from_vec(data)
            .ok_or_else(|| FontError::Invalid(path.display().to_string()))?;
        Ok(HeadlineFont::TrueType {
            font: Arc::new(font),
            px: HEADLINE_FONT_PX,
        })
    }

    /// Try the preferred path, then well-known locations of the default bold face.
    pub fn locate(preferred: Option<&Path>) -> Result<Self, FontError> {
        if let Some(path) = preferred {
            return Self::from_file(path);
        }
        let found = FONT_DIRS
            .iter()
            .map(|dir| PathBuf::from(dir).join(FONT_FILE))
            .find(|p| p.is_file())
            .ok_or_else(|| FontError::NotFound(FONT_FILE.to_string()))?;
        Self::from_file(&found)
    }

    /// Missing fonts degrade to the bitmap renderer.
    pub fn locate_or_fallback(preferred: Option<&Path>) -> Self {
        match Self::locate(preferred) {
            Ok(font) => {
                debug!(font = ?font, "headline font loaded");
                font
            }
            Err(e) => {
                warn!(error = %e, "falling back to bitmap headline glyphs");
                Self::bitmap()
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, HeadlineFont::Bitmap { .. })
    }

    pub fn measure(&self, text: &str) -> TextBox {
        match self {
            HeadlineFont::TrueType { font, px } => {
                let scale = Scale::uniform(*px);
                let ascent = font.v_metrics(scale).ascent;
                let mut bounds: Option<(i32, i32, i32, i32)> = None;
                for glyph in font.layout(text, scale, point(0.0, ascent)) {
                    if let Some(bb) = glyph.pixel_bounding_box() {
                        bounds = Some(match bounds {
                            None => (bb.min.x, bb.min.y, bb.max.x, bb.max.y),
                            Some((x0, y0, x1, y1)) => (
                                x0.min(bb.min.x),
                                y0.min(bb.min.y),
                                x1.max(bb.max.x),
                                y1.max(bb.max.y),
                            ),
                        });
                    }
                }
                match bounds {
                    Some((x0, y0, x1, y1)) => TextBox {
                        width: (x1 - x0) as u32,
                        height: (y1 - y0) as u32,
                        offset_x: x0,
                        offset_y: y0,
                    },
                    None => TextBox::default(),
                }
            }
            HeadlineFont::Bitmap { scale } => {
                let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
                if chars == 0 {
                    return TextBox::default();
                }
                TextBox {
                    width: chars.saturating_mul(8).saturating_mul(*scale),
                    height: 8 * scale,
                    offset_x: 0,
                    offset_y: 0,
                }
            }
        }
    }

    /// Draw `text` so its ink box's top-left lands on (x, y). Pixels off-canvas are clipped.
    pub fn draw(&self, canvas: &mut RgbaImage, text: &str, x: i64, y: i64, color: Rgba<u8>) {
        match self {
            HeadlineFont::TrueType { font, px } => {
                let scale = Scale::uniform(*px);
                let ascent = font.v_metrics(scale).ascent;
                let tb = self.measure(text);
                let origin = point(
                    (x - tb.offset_x as i64) as f32,
                    (y - tb.offset_y as i64) as f32 + ascent,
                );
                for glyph in font.layout(text, scale, origin) {
                    let Some(bb) = glyph.pixel_bounding_box() else {
                        continue;
                    };
                    glyph.draw(|gx, gy, coverage| {
                        blend_pixel(
                            canvas,
                            bb.min.x as i64 + gx as i64,
                            bb.min.y as i64 + gy as i64,
                            color,
                            coverage,
                        );
                    });
                }
            }
            HeadlineFont::Bitmap { scale } => {
                let cell = 8 * *scale as i64;
                for (i, ch) in text.chars().enumerate() {
                    let rows = BASIC_FONTS
                        .get(ch)
                        .or_else(|| BASIC_FONTS.get('?'))
                        .unwrap_or([0; 8]);
                    let gx = x + i as i64 * cell;
                    for (r, row) in rows.iter().enumerate() {
                        for c in 0..8 {
                            if row & (1 << c) == 0 {
                                continue;
                            }
                            let px = gx + c as i64 * *scale as i64;
                            let py = y + r as i64 * *scale as i64;
                            let s = *scale as i64;
                            fill_rect(canvas, px, py, px + s - 1, py + s - 1, color);
                        }
                    }
                }
            }
        }
    }
}

/// Backdrop plus white headline, centred horizontally near the bottom edge.
/// An empty headline draws nothing and returns `None`.
pub fn render_headline(
    canvas: &mut RgbaImage,
    font: &HeadlineFont,
    headline: &str,
) -> Option<HeadlinePlacement> {
    if headline.is_empty() {
        return None;
    }
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    let text = font.measure(headline);
    let x = (w - text.width as i64).div_euclid(2);
    let y = h - (h as f64 * HEADLINE_BOTTOM_PCT) as i64;

    fill_rect(
        canvas,
        x - BACKDROP_PADDING,
        y - BACKDROP_PADDING,
        x + text.width as i64 + BACKDROP_PADDING,
        y + text.height as i64 + BACKDROP_PADDING,
        BACKDROP_COLOR,
    );
    font.draw(canvas, headline, x, y, TEXT_COLOR);

    Some(HeadlinePlacement { x, y, text })
}
