use serde::{Deserialize, Serialize};

use crate::error::FaceIoError;
use crate::raster::Image;

/// Smallest face window the cascade can scan, in pixels.
pub const MIN_SUPPORTED_FACE_SIZE: u32 = 20;

/// Axis-aligned face rectangle, top-left origin, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
}

impl BoundingBox {
    /// Box with top-left corner `(x, y)` and size `w` × `h`.
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Area in pixels.
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i64 {
        self.x as i64 + self.w as i64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.h as i64
    }

    /// Overlapping area with `other`, in pixels.
    pub fn intersection_area(&self, other: &BoundingBox) -> u64 {
        let w = self.right().min(other.right()) - (self.x as i64).max(other.x as i64);
        let h = self.bottom().min(other.bottom()) - (self.y as i64).max(other.y as i64);
        if w <= 0 || h <= 0 {
            0
        } else {
            (w * h) as u64
        }
    }

    /// Intersection over union, 0.0 when the boxes do not touch.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union == 0 {
            0.0
        } else {
            inter as f64 / union as f64
        }
    }

    /// Restrict the box to a `width` × `height` image. `None` if nothing is left.
    pub fn clip(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let x0 = (self.x as i64).clamp(0, width as i64);
        let y0 = (self.y as i64).clamp(0, height as i64);
        let x1 = self.right().clamp(0, width as i64);
        let y1 = self.bottom().clamp(0, height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(BoundingBox {
            x: x0 as i32,
            y: y0 as i32,
            w: (x1 - x0) as u32,
            h: (y1 - y0) as u32,
        })
    }
}

/// Tuning knobs for multi-scale face detection.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectParams {
    /// Downscale ratio between pyramid levels. Must be greater than 1.0.
    pub scale_factor: f64,
    /// How much agreement a candidate needs before it is reported.
    /// Higher values mean fewer false positives and more missed faces;
    /// 0 reports every candidate the cascade scores.
    pub min_neighbors: u32,
    /// Smallest face to look for, in pixels.
    pub min_face_size: u32,
    /// Horizontal and vertical stride of the scanning window, in pixels.
    pub window_step: u32,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_face_size: MIN_SUPPORTED_FACE_SIZE,
            window_step: 4,
        }
    }
}

impl DetectParams {
    /// Set the pyramid downscale ratio (default: 1.1).
    pub fn scale_factor(mut self, factor: f64) -> Self {
        self.scale_factor = factor;
        self
    }

    /// Set the candidate agreement threshold (default: 5).
    pub fn min_neighbors(mut self, neighbors: u32) -> Self {
        self.min_neighbors = neighbors;
        self
    }

    /// Set the smallest face size in pixels (default: 20).
    pub fn min_face_size(mut self, size: u32) -> Self {
        self.min_face_size = size;
        self
    }

    /// Set the scanning stride in pixels (default: 4).
    pub fn window_step(mut self, step: u32) -> Self {
        self.window_step = step;
        self
    }

    /// Check that every knob is within the range the detector accepts.
    pub fn validate(&self) -> Result<(), FaceIoError> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 1.0 {
            return Err(FaceIoError::InvalidParameter(format!(
                "scale_factor must be greater than 1.0, got {}",
                self.scale_factor
            )));
        }
        if self.min_face_size < MIN_SUPPORTED_FACE_SIZE {
            return Err(FaceIoError::InvalidParameter(format!(
                "min_face_size must be at least {MIN_SUPPORTED_FACE_SIZE}, got {}",
                self.min_face_size
            )));
        }
        if self.window_step == 0 {
            return Err(FaceIoError::InvalidParameter(
                "window_step must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Pluggable face detection backend.
///
/// Implement this trait to run detection with another engine and pass it to
/// [`detect_faces_with`].
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a row-major grayscale buffer of `width` × `height` bytes.
    fn detect(&self, gray: &[u8], width: u32, height: u32, params: &DetectParams)
        -> Vec<BoundingBox>;
}

/// Run `detector` over `image`.
///
/// Parameters are validated first. Boxes are clipped to the image and empty
/// ones dropped; the detector's ordering is otherwise preserved.
pub fn detect_faces_with(
    detector: &dyn FaceDetector,
    image: &Image,
    params: &DetectParams,
) -> Result<Vec<BoundingBox>, FaceIoError> {
    params.validate()?;

    let (width, height) = image.dimensions();
    if width < params.min_face_size || height < params.min_face_size {
        tracing::debug!(width, height, "image smaller than minimum face size");
        return Ok(Vec::new());
    }

    let gray = image.to_gray();
    let faces: Vec<BoundingBox> = detector
        .detect(gray.as_raw(), width, height, params)
        .into_iter()
        .filter_map(|face| face.clip(width, height))
        .collect();

    tracing::debug!(faces = faces.len(), width, height, "face detection finished");
    Ok(faces)
}
