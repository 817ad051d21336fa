//! Detect faces in an image file, URL or `data:` URI and print the boxes as JSON.
//!
//! Usage:
//!   cargo run --example detect_faces -- <path | http(s)://url | data:...>
//!   RUST_LOG=faceio=debug cargo run --example detect_faces -- photo.jpg

use std::fs::File;

use faceio::{
    decode_from_base64, decode_from_upload, detect_faces_with, DetectParams, FaceIoError, Image,
    FetchOptions, RustfaceDetector, UrlFetcher,
};
use tracing_subscriber::EnvFilter;

fn load(source: &str) -> Result<Image, FaceIoError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        UrlFetcher::new(FetchOptions::default())?.fetch_image(source)
    } else if source.starts_with("data:") {
        decode_from_base64(source)
    } else {
        let file = File::open(source)
            .map_err(|e| FaceIoError::DecodeError(format!("{source}: {e}")))?;
        decode_from_upload(file)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let Some(source) = std::env::args().nth(1) else {
        eprintln!("usage: detect_faces <path | url | data-uri>");
        std::process::exit(2);
    };

    let result = load(&source).and_then(|image| {
        let detector = RustfaceDetector::bundled()?;
        let faces = detect_faces_with(&detector, &image, &DetectParams::default())?;
        Ok((image.dimensions(), faces))
    });

    match result {
        Ok(((width, height), faces)) => {
            let report = serde_json::json!({
                "width": width,
                "height": height,
                "faces": faces,
            });
            println!("{}", serde_json::to_string_pretty(&report).unwrap());
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
