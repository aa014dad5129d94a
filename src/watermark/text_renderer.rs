//! Text watermark measurement and rendering.
//!
//! A text layer is drawn unrotated in three passes. Each pass moves the
//! pixels it covers toward its own colour by the coverage, so a fully
//! covered pixel ends up exactly at that colour and opacity:
//!
//! 1. the shadow (stroke included), translated by the shadow offset
//! 2. the stroke, a disk dilation of the glyph coverage
//! 3. the fill
//!
//! The layer is padded by the stroke width on every side and by the shadow
//! offset on the side the shadow points to, so nothing is ever clipped.
//! [`measure_text`] reports the size of that layer after rotation, which is
//! exactly the size the compositor receives.

use super::config::{Color, TextWatermark};
use super::error::WatermarkError;
use super::font_loader::{FontFace, TextBounds};
use super::position::{rotated_bounds, WatermarkDimensions};
use super::raster::mix_pixels;
use image::{Rgba, RgbaImage};

/// Largest text layer, in pixels, that will be laid out.
pub const MAX_LAYER_PIXELS: u64 = 1 << 26;

/// Geometry of an unrotated text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLayout {
    pub bounds: TextBounds,
    pub width: u32,
    pub height: u32,
    /// Baseline pen origin of the main (unshadowed) glyph run.
    pub pen: (i32, i32),
    pub stroke_width: u32,
    pub shadow_offset: (i32, i32),
}

impl TextLayout {
    /// Lay out `text`, failing with [`WatermarkError::Render`] when the
    /// padded layer would not fit in [`MAX_LAYER_PIXELS`].
    pub fn new(
        text: &str,
        font: &FontFace,
        size: f32,
        stroke_width: u32,
        shadow_offset: (i32, i32),
    ) -> Result<Self, WatermarkError> {
        let bounds = font.text_bounds(text, size);
        let (dx, dy) = shadow_offset;
        let too_large = || {
            WatermarkError::Render(format!(
                "Text layer for '{text}' is too large (stroke {stroke_width}, shadow {dx},{dy})"
            ))
        };

        let padding = stroke_width.checked_mul(2).ok_or_else(too_large)?;
        let width = bounds
            .width()
            .checked_add(padding)
            .and_then(|w| w.checked_add(dx.unsigned_abs()))
            .ok_or_else(too_large)?;
        let height = bounds
            .height()
            .checked_add(padding)
            .and_then(|h| h.checked_add(dy.unsigned_abs()))
            .ok_or_else(too_large)?;
        if width as u64 * height as u64 > MAX_LAYER_PIXELS {
            return Err(too_large());
        }

        let s = i32::try_from(stroke_width).map_err(|_| too_large())?;
        let pen_x = dx
            .checked_neg()
            .and_then(|shift| s.checked_add(shift.max(0)))
            .and_then(|x| x.checked_sub(bounds.left))
            .ok_or_else(too_large)?;
        let pen_y = dy
            .checked_neg()
            .and_then(|shift| s.checked_add(shift.max(0)))
            .and_then(|y| y.checked_sub(bounds.top))
            .ok_or_else(too_large)?;

        Ok(Self {
            bounds,
            width,
            height,
            pen: (pen_x, pen_y),
            stroke_width,
            shadow_offset,
        })
    }
}

/// Size of the axis-aligned box containing the stroked, shadowed and
/// rotated text. Empty text measures `(0, 0)`.
pub fn measure_text(
    text: &str,
    font: &FontFace,
    size: f32,
    stroke_width: u32,
    shadow_offset: (i32, i32),
    rotation_degrees: f64,
) -> Result<WatermarkDimensions, WatermarkError> {
    if text.is_empty() {
        return Ok(WatermarkDimensions::default());
    }
    let layout = TextLayout::new(text, font, size, stroke_width, shadow_offset)?;
    Ok(rotated_bounds(layout.width, layout.height, rotation_degrees))
}

/// Per-pixel glyph coverage in `0.0..=1.0`.
#[derive(Debug, Clone)]
struct CoverageMask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl CoverageMask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    fn get(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0.0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    fn stamp(&mut self, x: i32, y: i32, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let slot = &mut self.data[y as usize * self.width as usize + x as usize];
        *slot = slot.max(coverage.clamp(0.0, 1.0));
    }

    /// Maximum of the mask translated by every integer offset within
    /// `radius`, the origin excluded.
    fn dilate(&self, radius: u32) -> Self {
        let r = radius as i32;
        let offsets: Vec<(i32, i32)> = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| (dx, dy) != (0, 0) && dx * dx + dy * dy <= r * r)
            .collect();

        let mut out = Self::new(self.width, self.height);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let coverage = offsets
                    .iter()
                    .map(|&(dx, dy)| self.get(x - dx, y - dy))
                    .fold(0.0f32, f32::max);
                out.stamp(x, y, coverage);
            }
        }
        out
    }

    fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (a, b) in out.data.iter_mut().zip(&other.data) {
            *a = a.max(*b);
        }
        out
    }

    fn translated(&self, dx: i32, dy: i32) -> Self {
        let mut out = Self::new(self.width, self.height);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                out.stamp(x, y, self.get(x - dx, y - dy));
            }
        }
        out
    }

    /// Move `layer` toward `color` wherever the mask has coverage.
    fn paint(&self, layer: &mut RgbaImage, color: Rgba<u8>) {
        for (pixel, &coverage) in layer.pixels_mut().zip(&self.data) {
            if coverage > 0.0 {
                *pixel = mix_pixels(*pixel, color, coverage);
            }
        }
    }
}

/// Render an unrotated text layer.
///
/// Fill and stroke use `opacity` as their alpha; the shadow is black at the
/// same alpha. The result has the size reported by [`TextLayout::new`].
pub fn render_text_layer(
    spec: &TextWatermark,
    font: &FontFace,
    opacity: u8,
) -> Result<RgbaImage, WatermarkError> {
    if spec.content.is_empty() {
        return Err(WatermarkError::Render("Cannot render empty text".to_string()));
    }

    let size = spec.font_size as f32;
    let stroke_width = spec.stroke.effective_width();
    let shadow_offset = spec.shadow.effective_offset();
    let layout = TextLayout::new(&spec.content, font, size, stroke_width, shadow_offset)?;

    if layout.width == 0 || layout.height == 0 {
        return Err(WatermarkError::Render(format!(
            "Text layer for '{}' has no area",
            spec.content
        )));
    }

    let mut glyphs = CoverageMask::new(layout.width, layout.height);
    font.draw_text(&spec.content, size, layout.pen, |x, y, coverage| {
        glyphs.stamp(x, y, coverage)
    });

    let stroke = (stroke_width > 0).then(|| glyphs.dilate(stroke_width));
    let mut layer = RgbaImage::new(layout.width, layout.height);

    if spec.shadow.enabled {
        let silhouette = match &stroke {
            Some(stroke) => stroke.union(&glyphs),
            None => glyphs.clone(),
        };
        let (dx, dy) = shadow_offset;
        silhouette
            .translated(dx, dy)
            .paint(&mut layer, Color::black().with_alpha(opacity));
    }

    if let Some(stroke) = &stroke {
        stroke.paint(&mut layer, spec.stroke.color.with_alpha(opacity));
    }

    glyphs.paint(&mut layer, spec.color.with_alpha(opacity));

    Ok(layer)
}
