//! Watermark module for applying text and image watermarks to photographs.
//!
//! A watermark is rendered into an isolated transparent layer, rotated with
//! canvas expansion, placed by its center and alpha-blended onto a copy of
//! the target image. The same measured bounding box drives both placement
//! and rendering, so a preview computed with [`WatermarkEngine::measure`]
//! and [`WatermarkEngine::compute_placement`] lines up exactly with the
//! exported result.
//!
//! # Features
//!
//! - **Text watermarks** with stroke, drop shadow and any rotation
//! - **Image watermarks** from local files (decoded once and cached)
//! - **9-grid anchors** with a fixed edge margin, or free-form centers
//!   clamped to the canvas
//! - **Font resolution** against installed fonts with a fallback chain that
//!   always ends at a built-in face
//! - **Pre-resize** of the working image by width, height or percentage
//!
//! # Configuration Example
//!
//! ```yaml
//! watermark:
//!   text: "© 2025 Studio"
//!   font_family: "DejaVu Sans"
//!   font_size: 48
//!   position_type: bottom-right
//!   text_stroke: true
//!   stroke_width: 2
//!   rotation_angle: 30
//! ```

pub mod builtin_font;
pub mod compositor;
pub mod config;
pub mod error;
pub mod font_catalog;
pub mod font_loader;
pub mod image_cache;
pub mod position;
pub mod processor;
pub mod raster;
pub mod resize;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::{merge_layer, WatermarkLayer};
pub use config::{
    parse_hex_color, Color, GridAnchor, ImageWatermark, Placement, ResizeMethod, ResizeOptions,
    ShadowOptions, StrokeOptions, TextWatermark, WatermarkConfig, WatermarkKind, WatermarkSpec,
    WatermarkType, GRID_MARGIN,
};
pub use error::WatermarkError;
pub use font_catalog::{FontCatalog, FontEntry};
pub use font_loader::{FontFace, FontLoader, FontSource, LoadedFont};
pub use image_cache::{CachedImage, ImageCache, ImageCacheConfig};
pub use position::{
    clamp_center, compute_placement, grid_position, is_visible, rotated_bounds,
    top_left_for_center, ImageDimensions, PlacementPosition, WatermarkDimensions,
};
pub use processor::{LayerOutcome, RenderedWatermark, SkipReason, WatermarkEngine, WatermarkOutcome};
pub use text_renderer::measure_text;
