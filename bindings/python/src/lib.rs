use std::time::Duration;

use faceio_core::{FaceIoError, Image};
use pyo3::exceptions::{PyConnectionError, PyRuntimeError, PyTimeoutError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict, PyList};

fn to_py_err(e: FaceIoError) -> PyErr {
    match &e {
        FaceIoError::DecodeError(_)
        | FaceIoError::InvalidParameter(_)
        | FaceIoError::InvalidQuality(_)
        | FaceIoError::InvalidBufferLength { .. } => PyValueError::new_err(e.to_string()),
        FaceIoError::NetworkError(_) | FaceIoError::HttpStatus { .. } => {
            PyConnectionError::new_err(e.to_string())
        }
        FaceIoError::Timeout(_) => PyTimeoutError::new_err(e.to_string()),
        FaceIoError::EncodeError(_) | FaceIoError::ModelLoad(_) => {
            PyRuntimeError::new_err(e.to_string())
        }
    }
}

/// Where an image comes from. Exactly one source keyword must be given.
enum Source {
    Bytes(Vec<u8>),
    Base64(String),
    Url(String, Duration),
}

fn pick_source(
    data: Option<Vec<u8>>,
    base64: Option<String>,
    url: Option<String>,
    timeout: f64,
) -> PyResult<Source> {
    let timeout = faceio_core::timeout_from_secs(timeout).map_err(to_py_err)?;
    match (data, base64, url) {
        (Some(bytes), None, None) => Ok(Source::Bytes(bytes)),
        (None, Some(text), None) => Ok(Source::Base64(text)),
        (None, None, Some(url)) => Ok(Source::Url(url, timeout)),
        _ => Err(PyValueError::new_err("pass exactly one of data=, base64= or url=")),
    }
}

fn load(source: Source) -> Result<Image, FaceIoError> {
    match source {
        Source::Bytes(bytes) => faceio_core::decode_from_upload(bytes.as_slice()),
        Source::Base64(text) => faceio_core::decode_from_base64(&text),
        Source::Url(url, timeout) => faceio_core::decode_from_url(&url, timeout),
    }
}

/// Decode an image and re-encode it as JPEG.
///
/// Args:
///     data: Raw image bytes from an upload (JPEG, PNG, WebP, GIF, BMP)
///     base64: Base64 string, plain or as a ``data:<mime>;base64,`` URI
///     url: HTTP(S) URL to fetch
///     timeout: Fetch timeout in seconds for ``url`` (default: 8.0)
///     quality: JPEG quality 1-100 (default: 95)
///
/// Returns:
///     JPEG bytes
#[pyfunction]
#[pyo3(signature = (*, data=None, base64=None, url=None, timeout=8.0, quality=None))]
fn encode_jpeg(
    py: Python<'_>,
    data: Option<Vec<u8>>,
    base64: Option<String>,
    url: Option<String>,
    timeout: f64,
    quality: Option<u8>,
) -> PyResult<Py<PyBytes>> {
    let source = pick_source(data, base64, url, timeout)?;
    let quality = quality.unwrap_or(faceio_core::DEFAULT_JPEG_QUALITY);

    let jpeg = py
        .allow_threads(|| {
            let image = load(source)?;
            faceio_core::encode_to_jpeg_with_quality(&image, quality)
        })
        .map_err(to_py_err)?;

    Ok(PyBytes::new(py, &jpeg).unbind())
}

/// Decode an image and return its size.
///
/// Takes the same source keywords as ``encode_jpeg``.
///
/// Returns:
///     dict with keys: width (int), height (int)
#[pyfunction]
#[pyo3(signature = (*, data=None, base64=None, url=None, timeout=8.0))]
fn image_size(
    py: Python<'_>,
    data: Option<Vec<u8>>,
    base64: Option<String>,
    url: Option<String>,
    timeout: f64,
) -> PyResult<Py<PyDict>> {
    let source = pick_source(data, base64, url, timeout)?;
    let image = py.allow_threads(|| load(source)).map_err(to_py_err)?;

    let dict = PyDict::new(py);
    dict.set_item("width", image.width())?;
    dict.set_item("height", image.height())?;
    Ok(dict.unbind())
}

/// Detect frontal faces.
///
/// Takes the same source keywords as ``encode_jpeg``.
///
/// Args:
///     scale_factor: Pyramid downscale ratio between passes, > 1.0 (default: 1.1)
///     min_neighbors: Higher values give fewer false positives (default: 5)
///     min_face_size: Smallest face in pixels, >= 20 (default: 20)
///     model_path: SeetaFace model file (default: the bundled model)
///
/// Returns:
///     list of dicts with keys: x, y, w, h (int)
#[cfg(feature = "rustface")]
#[pyfunction]
#[pyo3(signature = (*, data=None, base64=None, url=None, timeout=8.0, scale_factor=1.1, min_neighbors=5, min_face_size=20, model_path=None))]
#[allow(clippy::too_many_arguments)]
fn detect_faces(
    py: Python<'_>,
    data: Option<Vec<u8>>,
    base64: Option<String>,
    url: Option<String>,
    timeout: f64,
    scale_factor: f64,
    min_neighbors: u32,
    min_face_size: u32,
    model_path: Option<String>,
) -> PyResult<Py<PyList>> {
    let source = pick_source(data, base64, url, timeout)?;
    let params = faceio_core::DetectParams::default()
        .scale_factor(scale_factor)
        .min_neighbors(min_neighbors)
        .min_face_size(min_face_size);
    params.validate().map_err(to_py_err)?;

    let faces = py
        .allow_threads(|| {
            let detector = match model_path {
                Some(path) => faceio_core::RustfaceDetector::from_path(path)?,
                None => faceio_core::RustfaceDetector::bundled()?,
            };
            let image = load(source)?;
            faceio_core::detect_faces_with(&detector, &image, &params)
        })
        .map_err(to_py_err)?;

    let list = PyList::empty(py);
    for face in faces {
        let dict = PyDict::new(py);
        dict.set_item("x", face.x)?;
        dict.set_item("y", face.y)?;
        dict.set_item("w", face.w)?;
        dict.set_item("h", face.h)?;
        list.append(dict)?;
    }
    Ok(list.unbind())
}

#[pymodule]
fn faceio(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(encode_jpeg, m)?)?;
    m.add_function(wrap_pyfunction!(image_size, m)?)?;
    #[cfg(feature = "rustface")]
    m.add_function(wrap_pyfunction!(detect_faces, m)?)?;
    m.add("DEFAULT_FETCH_TIMEOUT_SECS", faceio_core::DEFAULT_FETCH_TIMEOUT.as_secs_f64())?;
    Ok(())
}
