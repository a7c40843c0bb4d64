//! Asset Loader - Raw Bytes to RGBA Raster

use image::RgbaImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Empty image data")]
    Empty,

    #[error("Unsupported or corrupt image data: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decoded raster owned by a single request.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pixels: RgbaImage,
}

impl ImageAsset {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Width / height, treating a zero-height source as square.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height() == 0 {
            1.0
        } else {
            self.width() as f64 / self.height() as f64
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }
}

/// Decode any format the `image` crate recognises, converted to RGBA8.
pub fn decode(bytes: &[u8]) -> Result<ImageAsset, AssetError> {
    if bytes.is_empty() {
        return Err(AssetError::Empty);
    }
    let img = image::load_from_memory(bytes)?;
    Ok(ImageAsset::from_rgba(img.into_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let asset = decode(&png_bytes(8, 4)).unwrap();
        assert_eq!((asset.width(), asset.height()), (8, 4));
        assert_eq!(asset.aspect_ratio(), 2.0);
        assert_eq!(asset.pixels().get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(b"definitely not an image"), Err(AssetError::Decode(_))));
        assert!(matches!(decode(&[]), Err(AssetError::Empty)));
    }

    #[test]
    fn test_zero_height_ratio_is_one() {
        let asset = ImageAsset::from_rgba(RgbaImage::new(5, 0));
        assert_eq!(asset.aspect_ratio(), 1.0);
    }
}
