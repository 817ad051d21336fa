use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use crate::error::FaceIoError;
use crate::face_detector::{BoundingBox, DetectParams, FaceDetector};

/// SeetaFace frontal-face model compiled into the library.
pub static BUNDLED_MODEL: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../model/seeta_fd_frontal_v1.0.bin"
));

/// Cascade score each unit of `min_neighbors` adds to the acceptance threshold.
const SCORE_PER_NEIGHBOR: f64 = 0.4;

/// Pyramid step handed to the scanner for a given `scale_factor`.
pub(crate) fn pyramid_step(params: &DetectParams) -> f32 {
    (1.0 / params.scale_factor).clamp(0.01, 0.99) as f32
}

/// Score threshold handed to the scanner for a given `min_neighbors`.
///
/// The scanner rejects thresholds `<= 0`, so `min_neighbors = 0` maps to the
/// smallest positive value and keeps every candidate the cascade scores.
pub(crate) fn score_threshold(params: &DetectParams) -> f64 {
    (params.min_neighbors as f64 * SCORE_PER_NEIGHBOR).max(f64::MIN_POSITIVE)
}

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model is parsed once; each call to [`FaceDetector::detect`] builds a
/// fresh scanner from a clone of it, so one instance can serve many threads.
#[derive(Clone)]
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Load the model embedded in the binary ([`BUNDLED_MODEL`]).
    ///
    /// No file is read at runtime.
    pub fn bundled() -> Result<Self, FaceIoError> {
        Self::from_reader(Cursor::new(BUNDLED_MODEL))
    }

    /// Load the model from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FaceIoError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| FaceIoError::ModelLoad(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loading face model");
        Self::from_reader(BufReader::new(file))
    }

    /// Parse the model from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FaceIoError> {
        let model =
            rustface::read_model(reader).map_err(|e| FaceIoError::ModelLoad(e.to_string()))?;
        Ok(Self { model })
    }
}

impl std::fmt::Debug for RustfaceDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustfaceDetector").finish_non_exhaustive()
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(
        &self,
        gray: &[u8],
        width: u32,
        height: u32,
        params: &DetectParams,
    ) -> Vec<BoundingBox> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(params.min_face_size);
        detector.set_score_thresh(score_threshold(params));
        detector.set_pyramid_scale_factor(pyramid_step(params));
        detector.set_slide_window_step(params.window_step, params.window_step);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        // The engine stores min_face_size but does not prune by it.
        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                BoundingBox {
                    x: bbox.x(),
                    y: bbox.y(),
                    w: bbox.width(),
                    h: bbox.height(),
                }
            })
            .filter(|b| b.w >= params.min_face_size && b.h >= params.min_face_size)
            .collect()
    }
}
