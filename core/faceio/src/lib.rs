//! Image input/output and face detection helpers for image-processing services.
//!
//! Images come in from an uploaded stream, a base64 string (plain or `data:`
//! URI) or a URL, leave as JPEG bytes, and can be scanned for frontal faces.
//!
//! # Example
//!
//! ```no_run
//! use faceio::{decode_from_base64, detect_faces, encode_to_jpeg, DetectParams};
//!
//! let payload = std::fs::read_to_string("upload.b64").unwrap();
//! let image = decode_from_base64(&payload).unwrap();
//! let faces = detect_faces(&image, &DetectParams::default()).unwrap();
//! for face in &faces {
//!     println!("face at ({}, {}) size {}x{}", face.x, face.y, face.w, face.h);
//! }
//! let jpeg = encode_to_jpeg(&image).unwrap();
//! println!("JPEG: {} bytes", jpeg.len());
//! ```
#![warn(missing_docs)]

mod decode;
mod encode;
mod error;
/// Face detection traits and data types.
pub mod face_detector;
mod fetch;
mod raster;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;

/// Decoders for byte buffers, upload streams and base64 strings.
pub use decode::{decode_from_base64, decode_from_bytes, decode_from_upload, strip_data_uri};
/// JPEG encoding.
pub use encode::{encode_to_jpeg, encode_to_jpeg_with_quality, DEFAULT_JPEG_QUALITY};
/// Error type returned by faceio operations.
pub use error::FaceIoError;
/// Face detection trait, parameters and bounding-box type.
pub use face_detector::{detect_faces_with, BoundingBox, DetectParams, FaceDetector};
/// Remote image fetching.
pub use fetch::{
    decode_from_url, timeout_from_secs, FetchOptions, UrlFetcher, DEFAULT_FETCH_TIMEOUT,
};
/// Decoded pixel buffer.
pub use raster::Image;
#[cfg(feature = "rustface")]
/// Built-in detector and the model it embeds.
pub use rustface_backend::{RustfaceDetector, BUNDLED_MODEL};

/// Detect frontal faces with the bundled SeetaFace model.
///
/// The embedded model is parsed on every call; hold a [`RustfaceDetector`]
/// and use [`detect_faces_with`] to parse it once.
#[cfg(feature = "rustface")]
pub fn detect_faces(image: &Image, params: &DetectParams) -> Result<Vec<BoundingBox>, FaceIoError> {
    // Reject bad params before paying for the model parse.
    params.validate()?;
    let detector = RustfaceDetector::bundled()?;
    detect_faces_with(&detector, image, params)
}
