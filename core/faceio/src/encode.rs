use image::codecs::jpeg::JpegEncoder;
use image::ImageEncoder;

use crate::error::FaceIoError;
use crate::raster::Image;

/// JPEG quality used by [`encode_to_jpeg`].
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Encode an image to JPEG at [`DEFAULT_JPEG_QUALITY`].
pub fn encode_to_jpeg(image: &Image) -> Result<Vec<u8>, FaceIoError> {
    encode_to_jpeg_with_quality(image, DEFAULT_JPEG_QUALITY)
}

/// Encode an image to JPEG at the given quality (1–100).
pub fn encode_to_jpeg_with_quality(image: &Image, quality: u8) -> Result<Vec<u8>, FaceIoError> {
    if !(1..=100).contains(&quality) {
        return Err(FaceIoError::InvalidQuality(quality));
    }
    if image.is_empty() {
        return Err(FaceIoError::EncodeError(format!(
            "image has zero dimensions ({}x{})",
            image.width(),
            image.height()
        )));
    }

    let rgb = image.as_rgb();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| FaceIoError::EncodeError(e.to_string()))?;

    tracing::debug!(
        width = rgb.width(),
        height = rgb.height(),
        quality,
        bytes = buffer.len(),
        "encoded JPEG"
    );
    Ok(buffer)
}
