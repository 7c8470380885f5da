//! Image Source Layer
//!
//! Decodes a photographed weld symbol (JPEG, PNG, ...) into an owned in-memory
//! frame. This is the only stage that can fail a request outright.

pub mod frame;

pub use frame::CapturedFrame;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Failure to obtain a decodable image
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read image file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Decode an encoded image held in memory
pub fn decode_image(bytes: &[u8]) -> Result<CapturedFrame, CaptureError> {
    let image = image::load_from_memory(bytes)?;
    let frame = CapturedFrame::new(image)?;
    debug!("Decoded {}x{} image from {} bytes", frame.width, frame.height, bytes.len());
    Ok(frame)
}

/// Read and decode an image file
pub fn load_image(path: &Path) -> Result<CapturedFrame, CaptureError> {
    let bytes = std::fs::read(path).map_err(|source| CaptureError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode_image(&bytes)
}
