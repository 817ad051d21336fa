use std::io::{Cursor, Read};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageDecoder, ImageReader};

use crate::error::FaceIoError;
use crate::raster::Image;

/// Decode encoded image bytes (JPEG, PNG, WebP, GIF, BMP) into an [`Image`].
///
/// The EXIF orientation stored in the file is applied and any alpha channel
/// is dropped.
pub fn decode_from_bytes(input: &[u8]) -> Result<Image, FaceIoError> {
    if input.is_empty() {
        return Err(FaceIoError::DecodeError("input is empty".into()));
    }

    let reader = ImageReader::new(Cursor::new(input))
        .with_guessed_format()
        .map_err(|e| FaceIoError::DecodeError(e.to_string()))?;
    let format = reader.format();

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| FaceIoError::DecodeError(e.to_string()))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| FaceIoError::DecodeError(e.to_string()))?;
    let mut decoded =
        DynamicImage::from_decoder(decoder).map_err(|e| FaceIoError::DecodeError(e.to_string()))?;
    decoded.apply_orientation(orientation);

    tracing::debug!(
        ?format,
        width = decoded.width(),
        height = decoded.height(),
        "decoded image"
    );

    Ok(Image::from_rgb(decoded.to_rgb8()))
}

/// Read an uploaded stream to the end and decode it.
pub fn decode_from_upload<R: Read>(mut reader: R) -> Result<Image, FaceIoError> {
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .map_err(|e| FaceIoError::DecodeError(format!("failed to read upload: {e}")))?;
    decode_from_bytes(&buf)
}

/// Strip a `data:<mime>;base64,` header, returning the payload after the first comma.
///
/// Strings without a `data:` prefix are returned unchanged.
pub fn strip_data_uri(input: &str) -> Result<&str, FaceIoError> {
    if !input.starts_with("data:") {
        return Ok(input);
    }
    input
        .split_once(',')
        .map(|(_, payload)| payload)
        .ok_or_else(|| FaceIoError::DecodeError("data URI has no ',' separator".into()))
}

/// Decode a plain base64 string or a `data:` URI into an [`Image`].
///
/// ASCII whitespace anywhere in the payload is ignored, so line-wrapped
/// (MIME style) base64 is accepted. Padding is still checked.
pub fn decode_from_base64(input: &str) -> Result<Image, FaceIoError> {
    let payload = strip_data_uri(input.trim())?;
    let compact: Vec<u8> = payload
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(&compact)
        .map_err(|e| FaceIoError::DecodeError(format!("invalid base64: {e}")))?;
    decode_from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageEncoder, Rgb, RgbImage, RgbaImage};

    fn make_test_rgb(width: u32, height: u32) -> RgbImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        img
    }

    fn make_test_png(width: u32, height: u32) -> Vec<u8> {
        let img = make_test_rgb(width, height);
        let mut buffer = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buffer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        buffer
    }

    #[test]
    fn png_decodes_losslessly() {
        let png = make_test_png(40, 30);
        let img = decode_from_bytes(&png).unwrap();
        assert_eq!(img.dimensions(), (40, 30));
        assert_eq!(img.as_rgb(), &make_test_rgb(40, 30));
    }

    #[test]
    fn alpha_channel_is_dropped() {
        let mut rgba = RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, image::Rgba([10, 20, 30, 0]));
        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png)
            .write_image(rgba.as_raw(), 1, 1, image::ExtendedColorType::Rgba8)
            .unwrap();

        let img = decode_from_bytes(&png).unwrap();
        assert_eq!(img.as_rgb().get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn empty_input_is_decode_error() {
        assert!(matches!(
            decode_from_bytes(&[]),
            Err(FaceIoError::DecodeError(_))
        ));
    }

    #[test]
    fn garbage_is_decode_error() {
        assert!(matches!(
            decode_from_bytes(b"not an image"),
            Err(FaceIoError::DecodeError(_))
        ));
    }

    #[test]
    fn truncated_png_is_decode_error() {
        let png = make_test_png(20, 20);
        let truncated = &png[..png.len() / 2];
        assert!(matches!(
            decode_from_bytes(truncated),
            Err(FaceIoError::DecodeError(_))
        ));
    }

    #[test]
    fn upload_reads_whole_stream() {
        let png = make_test_png(16, 9);
        let img = decode_from_upload(Cursor::new(png)).unwrap();
        assert_eq!(img.dimensions(), (16, 9));
    }

    #[test]
    fn strip_data_uri_cuts_at_first_comma() {
        assert_eq!(
            strip_data_uri("data:image/png;base64,AAAA").unwrap(),
            "AAAA"
        );
        assert_eq!(strip_data_uri("data:x,a,b").unwrap(), "a,b");
        assert_eq!(strip_data_uri("AAAA").unwrap(), "AAAA");
    }

    #[test]
    fn data_uri_without_comma_is_rejected() {
        assert!(matches!(
            strip_data_uri("data:image/png;base64"),
            Err(FaceIoError::DecodeError(_))
        ));
    }

    #[test]
    fn base64_prefix_does_not_change_result() {
        let png = make_test_png(12, 8);
        let plain = STANDARD.encode(&png);
        let uri = format!("data:image/png;base64,{plain}");

        let a = decode_from_base64(&plain).unwrap();
        let b = decode_from_base64(&uri).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dimensions(), (12, 8));
    }

    #[test]
    fn line_wrapped_base64_is_accepted() {
        let png = make_test_png(20, 20);
        let plain = STANDARD.encode(&png);
        let wrapped = |sep: &str| {
            plain
                .as_bytes()
                .chunks(76)
                .map(|line| std::str::from_utf8(line).unwrap())
                .collect::<Vec<_>>()
                .join(sep)
        };
        let expected = decode_from_base64(&plain).unwrap();

        assert_eq!(decode_from_base64(&wrapped("\n")).unwrap(), expected);
        assert_eq!(decode_from_base64(&wrapped("\r\n")).unwrap(), expected);
        let uri = format!("data:image/png;base64,{}", wrapped("\n "));
        assert_eq!(decode_from_base64(&uri).unwrap(), expected);
    }

    #[test]
    fn missing_padding_is_still_rejected() {
        let plain = (1..16)
            .map(|side| STANDARD.encode(make_test_png(side, side)))
            .find(|encoded| encoded.ends_with('='))
            .unwrap();
        assert!(decode_from_base64(&plain).is_ok());

        let err = decode_from_base64(plain.trim_end_matches('=')).unwrap_err();
        assert!(matches!(err, FaceIoError::DecodeError(_)));
    }

    #[test]
    fn invalid_base64_is_decode_error() {
        let err = decode_from_base64("@@not base64@@").unwrap_err();
        assert!(matches!(err, FaceIoError::DecodeError(_)));
    }

    #[test]
    fn valid_base64_of_non_image_is_decode_error() {
        let payload = STANDARD.encode(b"hello world");
        let err = decode_from_base64(&payload).unwrap_err();
        assert!(matches!(err, FaceIoError::DecodeError(_)));
    }
}
