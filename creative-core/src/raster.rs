//! Raster Helpers - Source-Over Blending onto the Canvas
//!
//! Integer source-over with an explicit output alpha: an opaque destination
//! stays exactly opaque whatever the source coverage.

use image::{Rgba, RgbaImage};

/// Blend `color` scaled by `coverage` at (x, y). Off-canvas coordinates are ignored.
pub fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let sa = (color[3] as f32 * coverage.clamp(0.0, 1.0)).round() as u32;
    if sa == 0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let da = dst[3] as u32;

    // out_a = sa + da * (1 - sa), in 0..=255 fixed point; da == 255 gives 255
    let dst_weight = da * (255 - sa);
    let out_a = sa * 255 + dst_weight;
    if out_a == 0 {
        return;
    }
    for c in 0..3 {
        let num = color[c] as u32 * sa * 255 + dst[c] as u32 * dst_weight;
        dst[c] = ((num + out_a / 2) / out_a) as u8;
    }
    dst[3] = ((out_a + 127) / 255) as u8;
}

/// Blend a filled rectangle, corners inclusive.
pub fn fill_rect(canvas: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba<u8>) {
    let x0 = x0.max(0);
    let y0 = y0.max(0);
    let x1 = x1.min(canvas.width() as i64 - 1);
    let y1 = y1.min(canvas.height() as i64 - 1);
    for py in y0..=y1 {
        for px in x0..=x1 {
            blend_pixel(canvas, px, py, color, 1.0);
        }
    }
}

/// Alpha-composite `top` with its top-left at (x, y), clipped to the canvas.
pub fn overlay(canvas: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let (tw, th) = (top.width() as i64, top.height() as i64);
    let tx0 = (-x).max(0);
    let ty0 = (-y).max(0);
    let tx1 = tw.min(cw - x);
    let ty1 = th.min(ch - y);
    for ty in ty0..ty1 {
        for tx in tx0..tx1 {
            let p = *top.get_pixel(tx as u32, ty as u32);
            blend_pixel(canvas, x + tx, y + ty, p, 1.0);
        }
    }
}
