use std::time::Duration;

use thiserror::Error;

/// Errors returned by faceio operations.
#[derive(Debug, Error)]
pub enum FaceIoError {
    #[error("failed to decode image: {0}")]
    DecodeError(String),

    #[error("failed to encode image: {0}")]
    EncodeError(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("failed to load face model: {0}")]
    ModelLoad(String),

    #[error("invalid detection parameter: {0}")]
    InvalidParameter(String),

    #[error("JPEG quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    InvalidBufferLength { expected: usize, actual: usize },
}

impl FaceIoError {
    /// True for failures that happened while fetching a remote image.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::NetworkError(_) | Self::Timeout(_) | Self::HttpStatus { .. }
        )
    }
}
