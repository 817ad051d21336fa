use image::{GrayImage, Rgb, RgbImage};

use crate::error::FaceIoError;

/// A decoded 8-bit, three-channel raster.
///
/// Pixels are stored in RGB order, which is what the `image` codecs produce.
/// Every decoder in this crate goes through the same conversion, so images
/// from uploads, base64 strings and URLs are directly comparable. Use
/// [`Image::from_bgr`] and [`Image::to_bgr_bytes`] when exchanging buffers
/// with libraries that expect BGR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pixels: RgbImage,
}

impl Image {
    /// Wrap an RGB buffer.
    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    /// Build an image from a row-major BGR buffer of `width` × `height` × 3 bytes.
    pub fn from_bgr(width: u32, height: u32, bgr: Vec<u8>) -> Result<Self, FaceIoError> {
        let expected = width as usize * height as usize * 3;
        if bgr.len() != expected {
            return Err(FaceIoError::InvalidBufferLength {
                expected,
                actual: bgr.len(),
            });
        }

        let mut rgb = bgr;
        for px in rgb.chunks_exact_mut(3) {
            px.swap(0, 2);
        }

        let pixels = RgbImage::from_raw(width, height, rgb).ok_or(
            FaceIoError::InvalidBufferLength {
                expected,
                actual: expected,
            },
        )?;
        Ok(Self { pixels })
    }

    /// An image of the given size filled with one RGB color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self {
            pixels: RgbImage::from_pixel(width, height, Rgb(rgb)),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    /// Borrow the underlying RGB buffer.
    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }

    /// Take the underlying RGB buffer.
    pub fn into_rgb(self) -> RgbImage {
        self.pixels
    }

    /// Copy the pixels out in BGR order.
    pub fn to_bgr_bytes(&self) -> Vec<u8> {
        let mut bgr = self.pixels.as_raw().clone();
        for px in bgr.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        bgr
    }

    /// Single-channel intensity plane.
    pub fn to_gray(&self) -> GrayImage {
        image::imageops::grayscale(&self.pixels)
    }
}

impl From<RgbImage> for Image {
    fn from(pixels: RgbImage) -> Self {
        Self::from_rgb(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_round_trip_swaps_channels() {
        let bgr = vec![10, 20, 30, 40, 50, 60];
        let img = Image::from_bgr(2, 1, bgr.clone()).unwrap();
        assert_eq!(img.as_rgb().get_pixel(0, 0), &Rgb([30, 20, 10]));
        assert_eq!(img.as_rgb().get_pixel(1, 0), &Rgb([60, 50, 40]));
        assert_eq!(img.to_bgr_bytes(), bgr);
    }

    #[test]
    fn from_bgr_rejects_short_buffer() {
        let err = Image::from_bgr(2, 2, vec![0; 11]).unwrap_err();
        assert!(matches!(
            err,
            FaceIoError::InvalidBufferLength {
                expected: 12,
                actual: 11
            }
        ));
    }

    #[test]
    fn zero_sized_image_is_empty() {
        assert!(Image::filled(0, 10, [0, 0, 0]).is_empty());
        assert!(Image::filled(10, 0, [0, 0, 0]).is_empty());
        assert!(!Image::filled(1, 1, [0, 0, 0]).is_empty());
    }

    #[test]
    fn gray_plane_matches_dimensions() {
        let img = Image::filled(7, 5, [200, 200, 200]);
        let gray = img.to_gray();
        assert_eq!(gray.dimensions(), (7, 5));
        assert_eq!(gray.get_pixel(3, 3).0[0], 200);
    }
}
