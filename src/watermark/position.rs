//! Placement geometry for watermarks.
//!
//! Converts a placement request (grid anchor or free-form center) plus a
//! measured watermark size and a canvas size into a center coordinate,
//! clamped so the watermark's box stays on the canvas. Shared by text and
//! image watermarks; nothing here knows about fonts or pixels.
//!
//! # Conventions
//!
//! - A center `c` and a box width `w` place the box's left edge at
//!   `c - floor(w / 2)`, i.e. `c - w/2` rounded half up.
//! - When a box does not fit on an axis, the center on that axis collapses
//!   to the canvas midpoint instead of producing an inverted range.
//!
//! # Example
//!
//! ```
//! use photo_watermark::watermark::position::{grid_position, ImageDimensions, WatermarkDimensions};
//! use photo_watermark::watermark::GridAnchor;
//!
//! let image = ImageDimensions { width: 800, height: 600 };
//! let watermark = WatermarkDimensions { width: 100, height: 50 };
//!
//! let center = grid_position(&image, &watermark, GridAnchor::BottomRight, 20);
//! assert_eq!((center.x, center.y), (730, 555)); // 800 - 20 - 50, 600 - 20 - 25
//! ```

use super::{GridAnchor, Placement};

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn of(image: &image::DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Dimensions of the watermark's axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

impl WatermarkDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A pixel coordinate on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Allowed center range on one axis: `[lo, hi]`, collapsed to the midpoint
/// when the box plus margins does not fit.
fn center_range(canvas: u32, size: u32, margin: u32) -> (i64, i64) {
    let canvas = canvas as i64;
    let size = size as i64;
    let margin = margin as i64;

    let lo = margin + size / 2;
    let hi = canvas - margin - (size - size / 2);

    if lo > hi {
        let mid = midpoint(canvas);
        (mid, mid)
    } else {
        (lo, hi)
    }
}

fn midpoint(canvas: i64) -> i64 {
    (canvas as f64 / 2.0).round() as i64
}

fn place_axis(canvas: u32, size: u32, margin: u32, alignment: i8) -> i32 {
    let (lo, hi) = center_range(canvas, size, margin);
    let center = match alignment {
        a if a < 0 => lo,
        0 => midpoint(canvas as i64).clamp(lo, hi),
        _ => hi,
    };
    center as i32
}

/// Center point for a grid-anchored watermark.
///
/// The box sits `margin` pixels from the near edge(s) of the anchor and is
/// centered on the canvas along "center" axes.
pub fn grid_position(
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
    anchor: GridAnchor,
    margin: u32,
) -> PlacementPosition {
    PlacementPosition::new(
        place_axis(image.width, watermark.width, margin, anchor.horizontal()),
        place_axis(image.height, watermark.height, margin, anchor.vertical()),
    )
}

/// Clamp a requested center so the whole watermark box stays on the canvas.
///
/// Axes on which the watermark is larger than the canvas collapse to the
/// canvas midpoint.
pub fn clamp_center(
    requested: PlacementPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> PlacementPosition {
    let (x_lo, x_hi) = center_range(image.width, watermark.width, 0);
    let (y_lo, y_hi) = center_range(image.height, watermark.height, 0);

    PlacementPosition::new(
        (requested.x as i64).clamp(x_lo, x_hi) as i32,
        (requested.y as i64).clamp(y_lo, y_hi) as i32,
    )
}

/// Resolve a placement request into a center point.
pub fn compute_placement(
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
    placement: Placement,
    margin: u32,
) -> PlacementPosition {
    match placement {
        Placement::Grid(anchor) => grid_position(image, watermark, anchor, margin),
        Placement::Custom { x, y } => {
            clamp_center(PlacementPosition::new(x, y), image, watermark)
        }
    }
}

/// Top-left corner of a box of the given size centered on `center`.
pub fn top_left_for_center(
    center: PlacementPosition,
    watermark: &WatermarkDimensions,
) -> PlacementPosition {
    PlacementPosition::new(
        center.x - (watermark.width / 2) as i32,
        center.y - (watermark.height / 2) as i32,
    )
}

/// Size of the axis-aligned box containing a `width x height` rectangle
/// rotated by `degrees`.
///
/// Multiples of 90° are exact; other angles use
/// `ceil(|w cos| + |h sin|) x ceil(|w sin| + |h cos|)`.
pub fn rotated_bounds(width: u32, height: u32, degrees: f64) -> WatermarkDimensions {
    let degrees = super::config::normalize_degrees(degrees);

    if degrees == 0.0 || degrees == 180.0 {
        return WatermarkDimensions::new(width, height);
    }
    if degrees == 90.0 || degrees == 270.0 {
        return WatermarkDimensions::new(height, width);
    }

    let radians = degrees.to_radians();
    let cos = radians.cos().abs();
    let sin = radians.sin().abs();
    let w = width as f64;
    let h = height as f64;

    // Trim float noise so e.g. 8.0000000001 does not round up to 9
    let snap = |v: f64| (v - 1e-9).ceil().max(0.0) as u32;

    WatermarkDimensions::new(snap(w * cos + h * sin), snap(w * sin + h * cos))
}

/// The part of a watermark placed at `top_left` that falls on the canvas.
///
/// Returns `None` when the two do not overlap.
pub fn visible_region(
    top_left: PlacementPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> Option<PixelRect> {
    let x_start = (top_left.x as i64).max(0);
    let y_start = (top_left.y as i64).max(0);
    let x_end = (top_left.x as i64 + watermark.width as i64).min(image.width as i64);
    let y_end = (top_left.y as i64 + watermark.height as i64).min(image.height as i64);

    if x_start >= x_end || y_start >= y_end {
        return None;
    }

    Some(PixelRect {
        x: x_start as u32,
        y: y_start as u32,
        width: (x_end - x_start) as u32,
        height: (y_end - y_start) as u32,
    })
}

/// Check if a watermark at `top_left` is at least partially visible.
pub fn is_visible(
    top_left: &PlacementPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> bool {
    visible_region(*top_left, image, watermark).is_some()
}
