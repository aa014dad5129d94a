//! Output encoding configuration.

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::Error;
use crate::watermark::raster::alpha_composite;

fn default_jpeg_quality() -> u8 {
    95
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub output_format: OutputFormat,
    /// JPEG quality 1-100 (default: 95)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            ));
        }
        Ok(())
    }

    /// Encode `image` to `path`. JPEG output is flattened onto white first.
    pub fn write_image(&self, image: &DynamicImage, path: &Path) -> Result<(), Error> {
        match self.output_format {
            OutputFormat::Png => image.save_with_format(path, ImageFormat::Png)?,
            OutputFormat::Jpeg => {
                let writer = BufWriter::new(File::create(path)?);
                let mut encoder = JpegEncoder::new_with_quality(writer, self.jpeg_quality);
                let rgb = flatten_on_white(image);
                encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)?;
            }
        }
        Ok(())
    }
}

fn flatten_on_white(image: &DynamicImage) -> image::RgbImage {
    let overlay = image.to_rgba8();
    let (width, height) = overlay.dimensions();
    let mut flat = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    alpha_composite(&mut flat, &overlay);
    DynamicImage::ImageRgba8(flat).to_rgb8()
}
