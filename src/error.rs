// Error types module

use thiserror::Error;

use crate::watermark::WatermarkError;

/// Top-level error for configuration loading and image I/O around the
/// watermark engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (invalid YAML, missing env vars, out-of-range values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Watermark rendering or compositing failures
    #[error(transparent)]
    Watermark(#[from] WatermarkError),

    /// Decoding or encoding the input/output image
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
