//! Watermark configuration types.
//!
//! Two layers live here:
//! - [`WatermarkConfig`]: the flat, fully-populated record handed over by the
//!   application shell. Every field has a documented serde default.
//! - [`WatermarkSpec`], [`Placement`] and [`ResizeOptions`]: the immutable,
//!   engine-level view derived from it for a single compositing call.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::WatermarkError;

/// Distance in pixels between a grid-anchored watermark and the canvas edge.
pub const GRID_MARGIN: u32 = 20;

/// Lower bound for image watermark scaling.
pub const MIN_IMAGE_SCALE: f32 = 0.05;

/// Upper bound for image watermark scaling.
pub const MAX_IMAGE_SCALE: f32 = 10.0;

// Default values
fn default_text() -> String {
    "Sample Watermark".to_string()
}

fn default_font_size() -> u32 {
    36
}

fn default_opacity() -> u8 {
    128
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_true() -> bool {
    true
}

fn default_shadow_offset() -> (i32, i32) {
    (2, 2)
}

fn default_stroke_width() -> u32 {
    1
}

fn default_image_scale() -> f32 {
    1.0
}

fn default_resize_width() -> u32 {
    800
}

fn default_resize_height() -> u32 {
    600
}

fn default_resize_percentage() -> u32 {
    100
}

/// RGB colour.
///
/// Deserializes from `"#RGB"`, `"#RRGGBB"` or `[r, g, b]`; serializes as
/// `"#RRGGBB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White color.
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Combine with an alpha value into an RGBA pixel.
    pub fn with_alpha(self, alpha: u8) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, alpha])
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Rgb([u8; 3]),
}

impl TryFrom<ColorRepr> for Color {
    type Error = WatermarkError;

    fn try_from(value: ColorRepr) -> Result<Self, Self::Error> {
        match value {
            ColorRepr::Hex(hex) => parse_hex_color(&hex),
            ColorRepr::Rgb([r, g, b]) => Ok(Color::new(r, g, b)),
        }
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::Config(format!("Color must start with '#', got '{hex}'")))?;

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WatermarkError::Config(format!(
            "Invalid hex digit in color '{hex}'"
        )));
    }

    let component = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|_| WatermarkError::Config(format!("Invalid hex digit in color '{hex}'")))
    };

    match digits.len() {
        // #RGB: each digit doubled, 0xF -> 0xFF
        3 => Ok(Color::new(
            component(&digits[0..1])? * 17,
            component(&digits[1..2])? * 17,
            component(&digits[2..3])? * 17,
        )),
        6 => Ok(Color::new(
            component(&digits[0..2])?,
            component(&digits[2..4])?,
            component(&digits[4..6])?,
        )),
        n => Err(WatermarkError::Config(format!(
            "Color must be #RGB or #RRGGBB format, got {n} characters"
        ))),
    }
}

/// One of the nine canvas-relative anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GridAnchor {
    TopLeft,
    TopCenter,
    TopRight,
    #[serde(alias = "center-left")]
    MiddleLeft,
    Center,
    #[serde(alias = "center-right")]
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl GridAnchor {
    pub const ALL: [GridAnchor; 9] = [
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::MiddleLeft,
        Self::Center,
        Self::MiddleRight,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopCenter => "top-center",
            Self::TopRight => "top-right",
            Self::MiddleLeft => "middle-left",
            Self::Center => "center",
            Self::MiddleRight => "middle-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
        }
    }

    /// Horizontal alignment: -1 near (left), 0 centered, 1 far (right).
    pub(crate) fn horizontal(&self) -> i8 {
        match self {
            Self::TopLeft | Self::MiddleLeft | Self::BottomLeft => -1,
            Self::TopCenter | Self::Center | Self::BottomCenter => 0,
            Self::TopRight | Self::MiddleRight | Self::BottomRight => 1,
        }
    }

    /// Vertical alignment: -1 near (top), 0 centered, 1 far (bottom).
    pub(crate) fn vertical(&self) -> i8 {
        match self {
            Self::TopLeft | Self::TopCenter | Self::TopRight => -1,
            Self::MiddleLeft | Self::Center | Self::MiddleRight => 0,
            Self::BottomLeft | Self::BottomCenter | Self::BottomRight => 1,
        }
    }
}

impl std::str::FromStr for GridAnchor {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "center-left" => return Ok(Self::MiddleLeft),
            "center-right" => return Ok(Self::MiddleRight),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|anchor| anchor.as_str() == normalized)
            .ok_or_else(|| WatermarkError::Config(format!("Unknown grid anchor '{s}'")))
    }
}

/// Where the watermark goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// One of the nine anchors, [`GRID_MARGIN`] pixels from the near edges.
    Grid(GridAnchor),
    /// Center of the watermark's bounding box, in source-image pixels.
    Custom { x: i32, y: i32 },
}

/// Stroke (outline) drawn around text glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeOptions {
    pub enabled: bool,
    pub width: u32,
    pub color: Color,
}

impl StrokeOptions {
    /// Stroke radius actually drawn; zero when disabled.
    pub fn effective_width(&self) -> u32 {
        if self.enabled {
            self.width
        } else {
            0
        }
    }
}

impl Default for StrokeOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            width: default_stroke_width(),
            color: Color::black(),
        }
    }
}

/// Drop shadow drawn behind text glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowOptions {
    pub enabled: bool,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl ShadowOptions {
    /// Offset actually drawn; `(0, 0)` when disabled.
    pub fn effective_offset(&self) -> (i32, i32) {
        if self.enabled {
            (self.offset_x, self.offset_y)
        } else {
            (0, 0)
        }
    }
}

impl Default for ShadowOptions {
    fn default() -> Self {
        let (offset_x, offset_y) = default_shadow_offset();
        Self {
            enabled: false,
            offset_x,
            offset_y,
        }
    }
}

/// Text watermark parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TextWatermark {
    pub content: String,
    pub font_family: String,
    pub font_size: u32,
    pub bold: bool,
    pub italic: bool,
    /// Preferred style string (e.g. "Semibold"); empty means no preference.
    pub style_hint: String,
    pub color: Color,
    pub stroke: StrokeOptions,
    pub shadow: ShadowOptions,
    /// Explicit font file, tried before the catalog.
    pub font_path: Option<PathBuf>,
    pub font_index: u32,
}

impl Default for TextWatermark {
    fn default() -> Self {
        Self {
            content: default_text(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            bold: true,
            italic: false,
            style_hint: String::new(),
            color: Color::white(),
            stroke: StrokeOptions::default(),
            shadow: ShadowOptions::default(),
            font_path: None,
            font_index: 0,
        }
    }
}

/// Image watermark parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageWatermark {
    pub source_path: PathBuf,
    /// Scale factor, clamped to `[MIN_IMAGE_SCALE, MAX_IMAGE_SCALE]` on use.
    pub scale: f32,
}

impl ImageWatermark {
    pub fn clamped_scale(&self) -> f32 {
        if self.scale.is_finite() {
            self.scale.clamp(MIN_IMAGE_SCALE, MAX_IMAGE_SCALE)
        } else {
            1.0
        }
    }
}

/// Text or image content of a watermark.
#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkKind {
    Text(TextWatermark),
    Image(ImageWatermark),
}

/// Everything needed to render one watermark, independent of placement.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkSpec {
    pub kind: WatermarkKind,
    /// Counter-clockwise rotation, any sign or magnitude.
    pub rotation_degrees: f32,
    /// 0 = invisible, 255 = opaque.
    pub opacity: u8,
}

impl WatermarkSpec {
    pub fn text(text: TextWatermark) -> Self {
        Self {
            kind: WatermarkKind::Text(text),
            rotation_degrees: 0.0,
            opacity: default_opacity(),
        }
    }

    pub fn image(image: ImageWatermark) -> Self {
        Self {
            kind: WatermarkKind::Image(image),
            rotation_degrees: 0.0,
            opacity: default_opacity(),
        }
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    /// Rotation normalized into `[0, 360)`.
    pub fn normalized_rotation(&self) -> f64 {
        normalize_degrees(self.rotation_degrees as f64)
    }
}

/// Normalize an angle into `[0, 360)`. Non-finite angles become 0.
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// How the working image is resized before watermarking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMethod {
    Width,
    Height,
    #[default]
    Percentage,
}

/// Pre-resize request, applied before measurement and placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    pub method: ResizeMethod,
    pub width: u32,
    pub height: u32,
    pub percentage: u32,
    pub keep_aspect_ratio: bool,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            method: ResizeMethod::default(),
            width: default_resize_width(),
            height: default_resize_height(),
            percentage: default_resize_percentage(),
            keep_aspect_ratio: true,
        }
    }
}

/// Text or image watermark selector in [`WatermarkConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkType {
    #[default]
    Text,
    Image,
}

/// Full watermark configuration as supplied by the application shell.
///
/// ```yaml
/// text: "© 2025 Studio"
/// font_size: 48
/// position_type: bottom-right
/// text_stroke: true
/// stroke_width: 2
/// rotation_angle: 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Text content (default: "Sample Watermark")
    pub text: String,
    /// Font size in pixels (default: 36)
    pub font_size: u32,
    /// Opacity 0-255 (default: 128)
    pub opacity: u8,
    /// Grid anchor used unless `use_custom_position` (default: bottom-right)
    pub position_type: GridAnchor,
    /// Center of the watermark in source-image pixels
    pub custom_position: (i32, i32),
    pub use_custom_position: bool,

    /// Font family name (default: "Arial")
    pub font_family: String,
    /// Bold face requested (default: true)
    pub font_bold: bool,
    pub font_italic: bool,
    /// Preferred style string such as "Semibold" (default: empty)
    pub font_style: String,
    /// Text fill color (default: #FFFFFF)
    pub text_color: Color,
    pub text_shadow: bool,
    /// Shadow offset in pixels (default: (2, 2))
    pub shadow_offset: (i32, i32),
    pub text_stroke: bool,
    /// Stroke width in pixels (default: 1)
    pub stroke_width: u32,
    /// Stroke color (default: #000000)
    pub stroke_color: Color,
    /// Explicit font file; empty means resolve from `font_family`
    pub font_path: String,
    pub font_index: u32,

    pub watermark_type: WatermarkType,
    pub image_watermark_path: String,
    /// Image watermark scale, clamped to [0.05, 10.0] (default: 1.0)
    pub image_scale: f32,
    /// Image watermark opacity 0-255 (default: 128)
    pub image_opacity: u8,

    /// Counter-clockwise rotation in degrees (default: 0)
    pub rotation_angle: i32,

    pub resize_enabled: bool,
    pub resize_method: ResizeMethod,
    pub resize_width: u32,
    pub resize_height: u32,
    pub resize_percentage: u32,
    pub keep_aspect_ratio: bool,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: default_text(),
            font_size: default_font_size(),
            opacity: default_opacity(),
            position_type: GridAnchor::BottomRight,
            custom_position: (0, 0),
            use_custom_position: false,
            font_family: default_font_family(),
            font_bold: default_true(),
            font_italic: false,
            font_style: String::new(),
            text_color: Color::white(),
            text_shadow: false,
            shadow_offset: default_shadow_offset(),
            text_stroke: false,
            stroke_width: default_stroke_width(),
            stroke_color: Color::black(),
            font_path: String::new(),
            font_index: 0,
            watermark_type: WatermarkType::Text,
            image_watermark_path: String::new(),
            image_scale: default_image_scale(),
            image_opacity: default_opacity(),
            rotation_angle: 0,
            resize_enabled: false,
            resize_method: ResizeMethod::Percentage,
            resize_width: default_resize_width(),
            resize_height: default_resize_height(),
            resize_percentage: default_resize_percentage(),
            keep_aspect_ratio: default_true(),
        }
    }
}

impl WatermarkConfig {
    /// Build the engine-level watermark description.
    pub fn to_spec(&self) -> WatermarkSpec {
        match self.watermark_type {
            WatermarkType::Text => WatermarkSpec {
                kind: WatermarkKind::Text(TextWatermark {
                    content: self.text.clone(),
                    font_family: self.font_family.clone(),
                    font_size: self.font_size,
                    bold: self.font_bold,
                    italic: self.font_italic,
                    style_hint: self.font_style.clone(),
                    color: self.text_color,
                    stroke: StrokeOptions {
                        enabled: self.text_stroke,
                        width: self.stroke_width,
                        color: self.stroke_color,
                    },
                    shadow: ShadowOptions {
                        enabled: self.text_shadow,
                        offset_x: self.shadow_offset.0,
                        offset_y: self.shadow_offset.1,
                    },
                    font_path: (!self.font_path.is_empty()).then(|| PathBuf::from(&self.font_path)),
                    font_index: self.font_index,
                }),
                rotation_degrees: self.rotation_angle as f32,
                opacity: self.opacity,
            },
            WatermarkType::Image => WatermarkSpec {
                kind: WatermarkKind::Image(ImageWatermark {
                    source_path: PathBuf::from(&self.image_watermark_path),
                    scale: self.image_scale,
                }),
                rotation_degrees: self.rotation_angle as f32,
                opacity: self.image_opacity,
            },
        }
    }

    pub fn placement(&self) -> Placement {
        if self.use_custom_position {
            Placement::Custom {
                x: self.custom_position.0,
                y: self.custom_position.1,
            }
        } else {
            Placement::Grid(self.position_type)
        }
    }

    /// Pre-resize request, or `None` when resizing is disabled.
    pub fn resize(&self) -> Option<ResizeOptions> {
        self.resize_enabled.then_some(ResizeOptions {
            method: self.resize_method,
            width: self.resize_width,
            height: self.resize_height,
            percentage: self.resize_percentage,
            keep_aspect_ratio: self.keep_aspect_ratio,
        })
    }

    /// Validate the watermark configuration.
    ///
    /// Values the engine clamps on its own (image scale, opacity) are not
    /// reported here.
    pub fn validate(&self) -> Result<(), String> {
        match self.watermark_type {
            WatermarkType::Text => {
                if self.font_size == 0 {
                    return Err("Text watermark font_size must be greater than 0".to_string());
                }
            }
            WatermarkType::Image => {
                if self.image_watermark_path.is_empty() {
                    return Err(
                        "Image watermark 'image_watermark_path' field cannot be empty".to_string(),
                    );
                }
            }
        }

        if self.resize_enabled {
            let (field, value) = match self.resize_method {
                ResizeMethod::Width => ("resize_width", self.resize_width),
                ResizeMethod::Height => ("resize_height", self.resize_height),
                ResizeMethod::Percentage => ("resize_percentage", self.resize_percentage),
            };
            if value == 0 {
                return Err(format!("Resize {field} must be greater than 0"));
            }
        }

        Ok(())
    }
}
