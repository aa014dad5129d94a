//! Resizing the working image before a watermark is placed.
//!
//! Placement and measurement always see the resized image, so grid anchors
//! and clamped custom positions are relative to the final output size.

use super::config::{ResizeMethod, ResizeOptions};
use super::error::WatermarkError;
use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::DynamicImage;
use std::num::NonZeroU32;

fn scaled(value: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return value.max(1);
    }
    let result = (value as f64 * numerator as f64 / denominator as f64).round();
    (result as u32).max(1)
}

/// Output size for `options` applied to a `width x height` image.
///
/// Never returns a zero dimension.
pub fn target_dimensions(width: u32, height: u32, options: &ResizeOptions) -> (u32, u32) {
    match options.method {
        ResizeMethod::Width => {
            let target_w = options.width.max(1);
            let target_h = if options.keep_aspect_ratio {
                scaled(height, target_w, width)
            } else {
                height.max(1)
            };
            (target_w, target_h)
        }
        ResizeMethod::Height => {
            let target_h = options.height.max(1);
            let target_w = if options.keep_aspect_ratio {
                scaled(width, target_h, height)
            } else {
                width.max(1)
            };
            (target_w, target_h)
        }
        ResizeMethod::Percentage => {
            let percentage = options.percentage.max(1);
            (
                scaled(width, percentage, 100),
                scaled(height, percentage, 100),
            )
        }
    }
}

/// Apply a pre-resize request. Returns a clone when the size is unchanged.
pub fn apply_resize(
    image: &DynamicImage,
    options: &ResizeOptions,
) -> Result<DynamicImage, WatermarkError> {
    let (target_w, target_h) = target_dimensions(image.width(), image.height(), options);
    if (target_w, target_h) == (image.width(), image.height()) {
        return Ok(image.clone());
    }
    tracing::debug!(
        from_width = image.width(),
        from_height = image.height(),
        to_width = target_w,
        to_height = target_h,
        method = ?options.method,
        "Resizing image before watermarking"
    );
    resize_image(image, target_w, target_h)
}

/// Resize to an exact size with a Lanczos3 convolution.
pub fn resize_image(
    img: &DynamicImage,
    target_w: u32,
    target_h: u32,
) -> Result<DynamicImage, WatermarkError> {
    let resize_failed = |reason: String| WatermarkError::Resize(reason);

    let src_width = NonZeroU32::new(img.width())
        .ok_or_else(|| resize_failed("Source width is 0".to_string()))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| resize_failed("Source height is 0".to_string()))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| resize_failed("Target width is 0".to_string()))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| resize_failed("Target height is 0".to_string()))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);
    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));

    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| resize_failed(format!("Resize operation failed: {:?}", e)))?;

    let rgba_image = image::RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| resize_failed("Failed to create output image buffer".to_string()))?;

    Ok(DynamicImage::ImageRgba8(rgba_image))
}
