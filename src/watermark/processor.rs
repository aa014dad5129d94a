//! Watermark engine: the high-level API for watermarking one image.
//!
//! The engine owns the two process-lifetime caches (installed fonts and
//! decoded watermark images) and is otherwise stateless. It is cheap to
//! clone and safe to share between threads, so batch callers can process
//! many images in parallel against a single engine.
//!
//! # Example
//!
//! ```no_run
//! use photo_watermark::watermark::{WatermarkConfig, WatermarkEngine};
//!
//! let engine = WatermarkEngine::system();
//! let photo = image::open("photo.jpg")?;
//! let outcome = engine.apply_watermark(&photo, &WatermarkConfig::default())?;
//! outcome.image.save("photo-watermarked.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use super::compositor::{merge_layer, WatermarkLayer};
use super::config::{
    ImageWatermark, Placement, ResizeOptions, TextWatermark, WatermarkConfig, WatermarkKind,
    WatermarkSpec, GRID_MARGIN,
};
use super::error::WatermarkError;
use super::font_catalog::FontCatalog;
use super::font_loader::{FontLoader, FontRequest, FontSource, LoadedFont};
use super::image_cache::ImageCache;
use super::position::{
    compute_placement, rotated_bounds, ImageDimensions, PlacementPosition, WatermarkDimensions,
};
use super::raster::{multiply_alpha, rotate_expanded, scale_image};
use super::resize::apply_resize;
use super::text_renderer::{measure_text, render_text_layer};
use image::{DynamicImage, RgbaImage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a watermark was not drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The text watermark has no content.
    EmptyText,
    /// The image watermark file is missing or unreadable.
    SourceUnreadable { path: PathBuf, reason: String },
    /// The layer does not overlap the canvas at the requested center.
    OutsideCanvas,
}

/// Result of watermarking one image.
#[derive(Debug, Clone)]
pub struct WatermarkOutcome {
    /// The output image. Equal to the (possibly resized) input when skipped.
    pub image: DynamicImage,
    /// Font actually used for a text watermark.
    pub font: Option<FontSource>,
    /// Center the layer was placed at.
    pub center: Option<PlacementPosition>,
    /// Size of the rotated layer.
    pub layer_size: WatermarkDimensions,
    pub skipped: Option<SkipReason>,
}

impl WatermarkOutcome {
    fn skipped(image: DynamicImage, reason: SkipReason) -> Self {
        Self {
            image,
            font: None,
            center: None,
            layer_size: WatermarkDimensions::default(),
            skipped: Some(reason),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.skipped.is_none()
    }
}

/// A rendered, rotated watermark ready for merging.
#[derive(Debug, Clone)]
pub struct RenderedWatermark {
    pub layer: RgbaImage,
    pub font: Option<FontSource>,
}

impl RenderedWatermark {
    pub fn dimensions(&self) -> WatermarkDimensions {
        WatermarkDimensions::new(self.layer.width(), self.layer.height())
    }
}

/// Result of rendering a watermark layer.
#[derive(Debug, Clone)]
pub enum LayerOutcome {
    Ready(RenderedWatermark),
    Skipped(SkipReason),
}

impl LayerOutcome {
    pub fn into_rendered(self) -> Option<RenderedWatermark> {
        match self {
            Self::Ready(rendered) => Some(rendered),
            Self::Skipped(_) => None,
        }
    }
}

/// Text and image watermark compositing with shared font and image caches.
#[derive(Debug, Clone)]
pub struct WatermarkEngine {
    fonts: Arc<FontLoader>,
    images: ImageCache,
    margin: u32,
}

impl WatermarkEngine {
    pub fn new(fonts: Arc<FontLoader>, images: ImageCache) -> Self {
        Self {
            fonts,
            images,
            margin: GRID_MARGIN,
        }
    }

    /// Engine using the platform font directories and default fonts.
    pub fn system() -> Self {
        Self::with_catalog(Arc::new(FontCatalog::system()))
    }

    /// Engine over a specific font catalog, with platform default fonts as
    /// the last file-based fallback.
    pub fn with_catalog(catalog: Arc<FontCatalog>) -> Self {
        Self::new(Arc::new(FontLoader::new(catalog)), ImageCache::default())
    }

    /// Engine that never touches installed fonts: text always uses the
    /// built-in face unless an explicit font file is given.
    pub fn isolated() -> Self {
        let loader = FontLoader::new(Arc::new(FontCatalog::empty())).with_default_fonts(Vec::new());
        Self::new(Arc::new(loader), ImageCache::default())
    }

    /// Distance kept between grid-anchored watermarks and the canvas edge.
    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    pub fn font_loader(&self) -> &FontLoader {
        &self.fonts
    }

    pub fn image_cache(&self) -> &ImageCache {
        &self.images
    }

    /// Best catalog match for a family, without the fallback chain.
    pub fn resolve_font(
        &self,
        family: &str,
        bold: bool,
        italic: bool,
        style_hint: Option<&str>,
    ) -> Option<(PathBuf, u32)> {
        self.fonts
            .catalog()
            .resolve(family, bold, italic, style_hint)
    }

    /// Load the face a text watermark will be drawn with. Never fails.
    pub fn load_font(&self, text: &TextWatermark) -> LoadedFont {
        let style_hint = Some(text.style_hint.as_str()).filter(|hint| !hint.trim().is_empty());
        self.fonts.load(&FontRequest {
            family: &text.font_family,
            bold: text.bold,
            italic: text.italic,
            style_hint,
            font_path: text.font_path.as_deref(),
            font_index: text.font_index,
        })
    }

    /// Size of the rotated watermark box, exactly as it will be rendered.
    ///
    /// Empty text measures `(0, 0)`.
    ///
    /// # Errors
    ///
    /// Image watermarks fail with `SourceUnreadable` or `Decode` when the
    /// source cannot be loaded.
    pub fn measure(&self, spec: &WatermarkSpec) -> Result<WatermarkDimensions, WatermarkError> {
        let rotation = spec.normalized_rotation();
        match &spec.kind {
            WatermarkKind::Text(text) => {
                if text.content.is_empty() {
                    return Ok(WatermarkDimensions::default());
                }
                let font = self.load_font(text);
                measure_text(
                    &text.content,
                    &font.face,
                    text.font_size as f32,
                    text.stroke.effective_width(),
                    text.shadow.effective_offset(),
                    rotation,
                )
            }
            WatermarkKind::Image(image) => {
                let cached = self.images.get_or_load(&image.source_path)?;
                let scale = image.clamped_scale() as f64;
                let (w, h) = cached.image.dimensions();
                let scaled_w = ((w as f64 * scale).round() as u32).max(1);
                let scaled_h = ((h as f64 * scale).round() as u32).max(1);
                Ok(rotated_bounds(scaled_w, scaled_h, rotation))
            }
        }
    }

    /// Center for a watermark of size `watermark` on `canvas`.
    pub fn compute_placement(
        &self,
        canvas: &ImageDimensions,
        watermark: &WatermarkDimensions,
        placement: Placement,
    ) -> PlacementPosition {
        compute_placement(canvas, watermark, placement, self.margin)
    }

    /// Render the rotated watermark layer, or report why there is nothing
    /// to draw.
    pub fn render(&self, spec: &WatermarkSpec) -> Result<LayerOutcome, WatermarkError> {
        let rotation = spec.normalized_rotation();
        match &spec.kind {
            WatermarkKind::Text(text) => {
                if text.content.is_empty() {
                    return Ok(LayerOutcome::Skipped(SkipReason::EmptyText));
                }
                let font = self.load_font(text);
                let layer = render_text_layer(text, &font.face, spec.opacity)?;
                Ok(LayerOutcome::Ready(RenderedWatermark {
                    layer: rotate_expanded(&layer, rotation),
                    font: Some(font.source),
                }))
            }
            WatermarkKind::Image(image) => match self.render_image(image, spec.opacity, rotation) {
                Ok(layer) => Ok(LayerOutcome::Ready(RenderedWatermark { layer, font: None })),
                Err(WatermarkError::SourceUnreadable { path, reason }) => {
                    warn!(path = %path.display(), reason = %reason, "Watermark image unreadable, skipping");
                    Ok(LayerOutcome::Skipped(SkipReason::SourceUnreadable { path, reason }))
                }
                Err(e) => Err(e),
            },
        }
    }

    fn render_image(
        &self,
        image: &ImageWatermark,
        opacity: u8,
        rotation: f64,
    ) -> Result<RgbaImage, WatermarkError> {
        let cached = self.images.get_or_load(&image.source_path)?;
        let mut layer = scale_image(&cached.image, image.clamped_scale());
        multiply_alpha(&mut layer, opacity);
        Ok(rotate_expanded(&layer, rotation))
    }

    /// Render `spec` and merge it onto a copy of `base` with its center at
    /// `center`. No clamping is applied to `center`.
    pub fn composite(
        &self,
        base: &DynamicImage,
        spec: &WatermarkSpec,
        center: PlacementPosition,
    ) -> Result<WatermarkOutcome, WatermarkError> {
        let rendered = match self.render(spec)? {
            LayerOutcome::Ready(rendered) => rendered,
            LayerOutcome::Skipped(reason) => {
                return Ok(WatermarkOutcome::skipped(base.clone(), reason))
            }
        };
        Ok(self.merge(base, rendered, center))
    }

    fn merge(
        &self,
        base: &DynamicImage,
        rendered: RenderedWatermark,
        center: PlacementPosition,
    ) -> WatermarkOutcome {
        let layer_size = rendered.dimensions();
        let layer = WatermarkLayer::new(rendered.layer, center);

        let skipped = layer
            .visible_region(&ImageDimensions::of(base))
            .is_none()
            .then_some(SkipReason::OutsideCanvas);

        WatermarkOutcome {
            image: merge_layer(base, &layer),
            font: rendered.font,
            center: Some(center),
            layer_size,
            skipped,
        }
    }

    /// Resize (optionally), place and composite a watermark.
    ///
    /// Placement is computed against the resized image.
    pub fn apply(
        &self,
        base: &DynamicImage,
        spec: &WatermarkSpec,
        placement: Placement,
        resize: Option<&ResizeOptions>,
    ) -> Result<WatermarkOutcome, WatermarkError> {
        let working = match resize {
            Some(options) => apply_resize(base, options)?,
            None => base.clone(),
        };

        let rendered = match self.render(spec)? {
            LayerOutcome::Ready(rendered) => rendered,
            LayerOutcome::Skipped(reason) => return Ok(WatermarkOutcome::skipped(working, reason)),
        };

        let canvas = ImageDimensions::of(&working);
        let center = self.compute_placement(&canvas, &rendered.dimensions(), placement);
        debug!(
            canvas_width = canvas.width,
            canvas_height = canvas.height,
            layer_width = rendered.layer.width(),
            layer_height = rendered.layer.height(),
            center_x = center.x,
            center_y = center.y,
            placement = ?placement,
            "Watermark placed"
        );

        Ok(self.merge(&working, rendered, center))
    }

    /// Apply a watermark described by a full configuration record.
    pub fn apply_watermark(
        &self,
        base: &DynamicImage,
        config: &WatermarkConfig,
    ) -> Result<WatermarkOutcome, WatermarkError> {
        self.apply(
            base,
            &config.to_spec(),
            config.placement(),
            config.resize().as_ref(),
        )
    }
}

impl Default for WatermarkEngine {
    fn default() -> Self {
        Self::system()
    }
}
