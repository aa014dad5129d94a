//! Merging a rendered watermark layer onto the target image.
//!
//! The layer is positioned by its center, cropped to the part that overlaps
//! the canvas, placed on a canvas-sized transparent overlay and then
//! alpha-composited onto an RGBA copy of the base image. The base image is
//! never modified.
//!
//! # Example
//!
//! ```
//! use image::{DynamicImage, Rgba, RgbaImage};
//! use photo_watermark::watermark::compositor::{merge_layer, WatermarkLayer};
//! use photo_watermark::watermark::position::PlacementPosition;
//!
//! let base = DynamicImage::ImageRgb8(image::RgbImage::new(100, 100));
//! let layer = WatermarkLayer::new(
//!     RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255])),
//!     PlacementPosition::new(50, 50),
//! );
//!
//! let merged = merge_layer(&base, &layer);
//! assert_eq!(merged.as_rgba8().unwrap().get_pixel(50, 50), &Rgba([255, 255, 255, 255]));
//! ```

use super::position::{
    top_left_for_center, visible_region, ImageDimensions, PixelRect, PlacementPosition,
    WatermarkDimensions,
};
use super::raster::{alpha_composite, composite_at};
use image::{DynamicImage, RgbaImage};
use tracing::debug;

/// A rendered (already rotated) watermark and where its center goes.
#[derive(Clone)]
pub struct WatermarkLayer {
    pub image: RgbaImage,
    pub center: PlacementPosition,
}

impl std::fmt::Debug for WatermarkLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkLayer")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .field("center", &self.center)
            .finish()
    }
}

impl WatermarkLayer {
    pub fn new(image: RgbaImage, center: PlacementPosition) -> Self {
        Self { image, center }
    }

    pub fn dimensions(&self) -> WatermarkDimensions {
        WatermarkDimensions::new(self.image.width(), self.image.height())
    }

    /// Canvas position of the layer's top-left pixel.
    pub fn top_left(&self) -> PlacementPosition {
        top_left_for_center(self.center, &self.dimensions())
    }

    /// Part of the canvas the layer covers, if any.
    pub fn visible_region(&self, canvas: &ImageDimensions) -> Option<PixelRect> {
        visible_region(self.top_left(), canvas, &self.dimensions())
    }
}

/// Composite `layer` onto a copy of `base`.
///
/// A layer that misses the canvas entirely returns `base` unchanged, in its
/// original pixel format. Otherwise the result is RGBA8.
pub fn merge_layer(base: &DynamicImage, layer: &WatermarkLayer) -> DynamicImage {
    let canvas = ImageDimensions::of(base);
    let top_left = layer.top_left();

    let Some(region) = layer.visible_region(&canvas) else {
        debug!(
            x = top_left.x,
            y = top_left.y,
            width = layer.image.width(),
            height = layer.image.height(),
            "Watermark layer does not overlap the canvas"
        );
        return base.clone();
    };

    let crop_x = (region.x as i64 - top_left.x as i64) as u32;
    let crop_y = (region.y as i64 - top_left.y as i64) as u32;
    let visible =
        image::imageops::crop_imm(&layer.image, crop_x, crop_y, region.width, region.height)
            .to_image();

    let mut overlay = RgbaImage::new(canvas.width, canvas.height);
    composite_at(&mut overlay, &visible, region.x as i64, region.y as i64);

    let mut merged = base.to_rgba8();
    alpha_composite(&mut merged, &overlay);

    debug!(
        x = region.x,
        y = region.y,
        width = region.width,
        height = region.height,
        "Watermark layer merged"
    );

    DynamicImage::ImageRgba8(merged)
}
