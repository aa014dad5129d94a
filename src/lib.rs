// Photo Watermark Library
// Text and image watermark compositing for photographs

pub mod config;
pub mod error;
pub mod logging;
pub mod watermark;

pub use error::{Error, Result};
