//! Raster primitives shared by text and image watermarks.
//!
//! - Porter-Duff "over" blending of straight-alpha RGBA pixels
//! - Expanding rotation with bicubic sampling
//! - Scaling and alpha adjustment of watermark layers
//!
//! All functions take RGBA8 buffers; callers promote other pixel formats
//! before reaching this module.

use super::position::rotated_bounds;
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

/// Blend two pixels using the "over" operator.
///
/// result = foreground + background * (1 - foreground.alpha)
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    match (background[3], foreground[3]) {
        (_, 0) => return background,
        (_, 255) | (0, _) => return foreground,
        _ => {}
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let result =
            (fg as f32 * fg_alpha + bg as f32 * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        result.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Move `background` toward `ink` by `coverage`, alpha included.
///
/// Unlike [`blend_pixels`], full coverage yields `ink` exactly, whatever was
/// underneath. Colour is interpolated premultiplied so a transparent
/// background contributes no hue to partially covered pixels.
pub fn mix_pixels(background: Rgba<u8>, ink: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let t = coverage.clamp(0.0, 1.0);
    if t <= 0.0 {
        return background;
    }
    if t >= 1.0 {
        return ink;
    }

    let bg_alpha = background[3] as f32 / 255.0;
    let ink_alpha = ink[3] as f32 / 255.0;
    let out_alpha = bg_alpha + (ink_alpha - bg_alpha) * t;
    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mix_channel = |bg: u8, fg: u8| -> u8 {
        let bg = bg as f32 * bg_alpha;
        let fg = fg as f32 * ink_alpha;
        ((bg + (fg - bg) * t) / out_alpha).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        mix_channel(background[0], ink[0]),
        mix_channel(background[1], ink[1]),
        mix_channel(background[2], ink[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Alpha-composite `overlay` onto `base` in place. Both must share dimensions.
pub fn alpha_composite(base: &mut RgbaImage, overlay: &RgbaImage) {
    debug_assert_eq!(base.dimensions(), overlay.dimensions());

    base.par_chunks_exact_mut(4)
        .zip(overlay.par_chunks_exact(4))
        .for_each(|(dst, src)| {
            let blended = blend_pixels(
                Rgba([dst[0], dst[1], dst[2], dst[3]]),
                Rgba([src[0], src[1], src[2], src[3]]),
            );
            dst.copy_from_slice(&blended.0);
        });
}

/// Blend `source` over `target` with its top-left corner at `(x, y)`.
///
/// Parts of `source` outside `target` are clipped.
pub fn composite_at(target: &mut RgbaImage, source: &RgbaImage, x: i64, y: i64) {
    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + source.width() as i64).min(target.width() as i64);
    let y_end = (y + source.height() as i64).min(target.height() as i64);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let sx = (tx - x) as u32;
            let sy = (ty - y) as u32;
            let src = *source.get_pixel(sx, sy);
            let dst = target.get_pixel_mut(tx as u32, ty as u32);
            *dst = blend_pixels(*dst, src);
        }
    }
}

/// Multiply every alpha value by `opacity / 255`.
pub fn multiply_alpha(image: &mut RgbaImage, opacity: u8) {
    if opacity == 255 {
        return;
    }
    let opacity = opacity as u32;
    for pixel in image.pixels_mut() {
        pixel[3] = ((pixel[3] as u32 * opacity + 127) / 255) as u8;
    }
}

/// Scale an image by `factor` with a Lanczos3 filter.
///
/// Output dimensions are `max(1, round(dim * factor))`.
pub fn scale_image(image: &RgbaImage, factor: f32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }
    let target_w = ((w as f64 * factor as f64).round() as u32).max(1);
    let target_h = ((h as f64 * factor as f64).round() as u32).max(1);
    if (target_w, target_h) == (w, h) {
        return image.clone();
    }
    image::imageops::resize(image, target_w, target_h, FilterType::Lanczos3)
}

/// Catmull-Rom cubic kernel (a = -0.5).
fn cubic_weight(t: f32) -> f32 {
    const A: f32 = -0.5;
    let t = t.abs();
    if t <= 1.0 {
        (A + 2.0) * t * t * t - (A + 3.0) * t * t + 1.0
    } else if t < 2.0 {
        A * t * t * t - 5.0 * A * t * t + 8.0 * A * t - 4.0 * A
    } else {
        0.0
    }
}

/// Rotate counter-clockwise by `degrees` about the image center, growing the
/// canvas so no corner is clipped.
///
/// Output size always equals [`rotated_bounds`] of the input size. Quarter
/// turns are lossless; other angles are resampled bicubically on
/// premultiplied alpha so transparent edges do not bleed dark fringes.
pub fn rotate_expanded(image: &RgbaImage, degrees: f64) -> RgbaImage {
    let degrees = super::config::normalize_degrees(degrees);
    let (src_w, src_h) = image.dimensions();

    if src_w == 0 || src_h == 0 || degrees == 0.0 {
        return image.clone();
    }
    if degrees == 90.0 {
        return image::imageops::rotate270(image);
    }
    if degrees == 180.0 {
        return image::imageops::rotate180(image);
    }
    if degrees == 270.0 {
        return image::imageops::rotate90(image);
    }

    let bounds = rotated_bounds(src_w, src_h, degrees);
    let (dst_w, dst_h) = (bounds.width.max(1), bounds.height.max(1));

    let premultiplied: Vec<[f32; 4]> = image
        .pixels()
        .map(|p| {
            let a = p[3] as f32 / 255.0;
            [p[0] as f32 * a, p[1] as f32 * a, p[2] as f32 * a, p[3] as f32]
        })
        .collect();

    let radians = degrees.to_radians();
    let cos = radians.cos() as f32;
    let sin = radians.sin() as f32;
    let src_cx = src_w as f32 / 2.0;
    let src_cy = src_h as f32 / 2.0;
    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;

    let sample = |sx: f32, sy: f32| -> [f32; 4] {
        let x0 = sx.floor();
        let y0 = sy.floor();
        let fx = sx - x0;
        let fy = sy - y0;
        let mut acc = [0.0f32; 4];

        for j in -1i32..=2 {
            let py = y0 as i32 + j;
            if py < 0 || py >= src_h as i32 {
                continue;
            }
            let wy = cubic_weight(j as f32 - fy);
            if wy == 0.0 {
                continue;
            }
            for i in -1i32..=2 {
                let px = x0 as i32 + i;
                if px < 0 || px >= src_w as i32 {
                    continue;
                }
                let w = wy * cubic_weight(i as f32 - fx);
                if w == 0.0 {
                    continue;
                }
                let texel = &premultiplied[(py as u32 * src_w + px as u32) as usize];
                for c in 0..4 {
                    acc[c] += texel[c] * w;
                }
            }
        }
        acc
    };

    let mut rotated = RgbaImage::new(dst_w, dst_h);
    let row_len = dst_w as usize * 4;

    rotated
        .par_chunks_exact_mut(row_len)
        .enumerate()
        .for_each(|(dy, row)| {
            let ry = dy as f32 + 0.5 - dst_cy;
            for (dx, out) in row.chunks_exact_mut(4).enumerate() {
                let rx = dx as f32 + 0.5 - dst_cx;

                // Inverse mapping into source pixel space
                let sx = rx * cos - ry * sin + src_cx - 0.5;
                let sy = rx * sin + ry * cos + src_cy - 0.5;

                if sx <= -1.0 || sy <= -1.0 || sx >= src_w as f32 || sy >= src_h as f32 {
                    continue;
                }

                let [pr, pg, pb, pa] = sample(sx, sy);
                let alpha = pa.round().clamp(0.0, 255.0);
                if alpha == 0.0 {
                    continue;
                }
                let unpremultiply = |c: f32| (c * 255.0 / pa).round().clamp(0.0, 255.0) as u8;
                out.copy_from_slice(&[
                    unpremultiply(pr),
                    unpremultiply(pg),
                    unpremultiply(pb),
                    alpha as u8,
                ]);
            }
        });

    rotated
}
