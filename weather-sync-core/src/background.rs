//! User-picked background photo and the downscaler that makes it safe to
//! hand to the widget process, which runs under a tight memory limit.

use image::{ImageFormat, RgbaImage, imageops::FilterType};
use std::{fmt, io::Cursor, path::Path};

/// Largest edge, in pixels, of an image kept for the widget.
pub const MAX_DIMENSION: u32 = 300;

#[derive(Debug, thiserror::Error)]
#[error("image error: {0}")]
pub struct ImageError(#[from] image::ImageError);

/// Decoded RGBA bitmap.
#[derive(Clone, PartialEq)]
pub struct BackgroundImage {
    pixels: RgbaImage,
}

impl fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl BackgroundImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Decode any supported format (PNG, JPEG).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::new(decoded.to_rgba8()))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let decoded = image::open(path)?;
        Ok(Self::new(decoded.to_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ImageError> {
        let mut out = Cursor::new(Vec::new());
        self.pixels.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }

    /// Scale uniformly so the larger edge equals [`MAX_DIMENSION`].
    pub fn resized(&self) -> Self {
        resize(self, MAX_DIMENSION)
    }
}

/// Fit `image` into a `bound`×`bound` square, keeping its aspect ratio.
///
/// Returns a new bitmap; the input is untouched. An image already at the
/// target size comes back as an identical copy, so repeated calls settle.
pub fn resize(image: &BackgroundImage, bound: u32) -> BackgroundImage {
    let (width, height) = fitted_size(image.width(), image.height(), bound);

    if (width, height) == (image.width(), image.height()) {
        return image.clone();
    }

    BackgroundImage::new(image::imageops::resize(
        &image.pixels,
        width,
        height,
        FilterType::Triangle,
    ))
}

fn fitted_size(width: u32, height: u32, bound: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest == 0 {
        return (width, height);
    }

    let scale = f64::from(bound) / f64::from(longest);
    let scaled = |edge: u32| ((f64::from(edge) * scale).round() as u32).max(1);

    (scaled(width), scaled(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> BackgroundImage {
        BackgroundImage::new(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        }))
    }

    #[test]
    fn landscape_is_capped_on_width() {
        assert_eq!(fitted_size(1200, 800, 300), (300, 200));
    }

    #[test]
    fn portrait_is_capped_on_height() {
        assert_eq!(fitted_size(600, 1800, 300), (100, 300));
    }

    #[test]
    fn small_images_scale_up_to_the_bound() {
        assert_eq!(fitted_size(30, 15, 300), (300, 150));
    }

    #[test]
    fn extreme_aspect_keeps_at_least_one_pixel() {
        assert_eq!(fitted_size(3000, 1, 300), (300, 1));
    }

    #[test]
    fn resize_does_not_mutate_input() {
        let original = gradient(640, 480);
        let before = original.clone();

        let resized = original.resized();

        assert_eq!(original, before);
        assert_eq!((resized.width(), resized.height()), (300, 225));
    }

    #[test]
    fn resize_is_idempotent() {
        let once = gradient(900, 500).resized();
        let twice = once.resized();

        assert_eq!(once, twice);
    }

    #[test]
    fn resize_is_deterministic() {
        let image = gradient(512, 512);

        assert_eq!(image.resized(), image.resized());
    }

    #[test]
    fn png_bytes_decode_back() {
        let image = gradient(12, 7);

        let bytes = image.to_png_bytes().unwrap();

        assert_eq!(BackgroundImage::from_bytes(&bytes).unwrap(), image);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(BackgroundImage::from_bytes(b"definitely not an image").is_err());
    }
}
