//! Watermark error types.
//!
//! Defines errors that can occur while measuring, rendering or compositing
//! a watermark. Font resolution never fails (the fallback chain always ends
//! at the built-in face) and oversized watermarks collapse to the canvas
//! midpoint, so neither has a variant here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during watermark processing.
#[derive(Debug, Clone, Error)]
pub enum WatermarkError {
    /// The image watermark file is missing or cannot be read.
    #[error("Watermark source '{}' is unreadable: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    /// The image watermark file exists but could not be decoded.
    #[error("Failed to decode watermark image: {0}")]
    Decode(String),

    /// Text drawing failed.
    #[error("Failed to render text watermark: {0}")]
    Render(String),

    /// Resizing the working image or the watermark failed.
    #[error("Failed to resize image: {0}")]
    Resize(String),

    /// A configuration value cannot be turned into a watermark.
    #[error("Watermark configuration error: {0}")]
    Config(String),
}

impl WatermarkError {
    pub fn source_unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error means "nothing to draw" rather than a broken input.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::SourceUnreadable { .. })
    }
}
