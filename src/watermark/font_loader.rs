//! Turning a font request into a drawable face.
//!
//! Loading walks an ordered list of strategies and stops at the first one
//! that yields a face:
//!
//! 1. the explicit font file (and face index) from the request
//! 2. the best catalog match for the family
//! 3. family-name file variants ("ArialBold.ttf", "Arial-Italic.otf", ...)
//! 4. well-known platform default fonts
//! 5. the built-in bitmap face
//!
//! The last strategy cannot fail, so loading always produces a font.

use super::builtin_font;
use super::font_catalog::FontCatalog;
use ab_glyph::{point, Font, FontArc, FontVec, PxScale, ScaleFont};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const VARIANT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

/// Ink box of a glyph run relative to its baseline pen origin.
///
/// `top` is negative for glyphs above the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl TextBounds {
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    fn union(self, other: TextBounds) -> TextBounds {
        TextBounds {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// A face that can measure and rasterize text.
#[derive(Clone)]
pub enum FontFace {
    Outline(FontArc),
    Builtin,
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outline(_) => f.write_str("FontFace::Outline"),
            Self::Builtin => f.write_str("FontFace::Builtin"),
        }
    }
}

/// Scale at which one em spans `size` pixels.
fn em_scale(font: &FontArc, size: f32) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(size * font.height_unscaled() / units_per_em)
}

impl FontFace {
    /// Tight ink bounds of `text` at `size` pixels per em.
    pub fn text_bounds(&self, text: &str, size: f32) -> TextBounds {
        if text.is_empty() {
            return TextBounds::default();
        }

        let font = match self {
            Self::Builtin => return builtin_font::text_bounds(text, size),
            Self::Outline(font) => font,
        };

        let mut ink: Option<TextBounds> = None;
        let caret = layout_glyphs(font, text, size, (0, 0), |outlined| {
            let b = outlined.px_bounds();
            let glyph_box = TextBounds {
                left: b.min.x.floor() as i32,
                top: b.min.y.floor() as i32,
                right: b.max.x.ceil() as i32,
                bottom: b.max.y.ceil() as i32,
            };
            ink = Some(ink.map_or(glyph_box, |acc| acc.union(glyph_box)));
        });

        // Whitespace-only runs have no ink; use the advance box instead
        ink.unwrap_or_else(|| {
            let scaled = font.as_scaled(em_scale(font, size));
            TextBounds {
                left: 0,
                top: -(scaled.ascent().ceil() as i32),
                right: caret.ceil() as i32,
                bottom: (-scaled.descent()).ceil() as i32,
            }
        })
    }

    /// Rasterize `text` with its baseline pen origin at `origin`.
    ///
    /// `plot` receives pixel coordinates and a coverage value in `0.0..=1.0`.
    pub fn draw_text(
        &self,
        text: &str,
        size: f32,
        origin: (i32, i32),
        mut plot: impl FnMut(i32, i32, f32),
    ) {
        match self {
            Self::Builtin => builtin_font::draw_text(text, size, origin, plot),
            Self::Outline(font) => {
                layout_glyphs(font, text, size, origin, |outlined| {
                    let b = outlined.px_bounds();
                    outlined.draw(|x, y, coverage| {
                        plot(b.min.x as i32 + x as i32, b.min.y as i32 + y as i32, coverage)
                    });
                });
            }
        }
    }
}

/// Position every glyph along the baseline, applying kerning, and hand the
/// outlined glyphs to `visit`. Returns the final caret offset.
fn layout_glyphs(
    font: &FontArc,
    text: &str,
    size: f32,
    origin: (i32, i32),
    mut visit: impl FnMut(&ab_glyph::OutlinedGlyph),
) -> f32 {
    let scale = em_scale(font, size);
    let scaled = font.as_scaled(scale);
    let mut caret = 0.0f32;
    let mut previous: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(
            scale,
            point(origin.0 as f32 + caret, origin.1 as f32),
        );
        if let Some(outlined) = font.outline_glyph(glyph) {
            visit(&outlined);
        }

        caret += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }

    caret
}

/// Where a loaded face came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    File { path: PathBuf, index: u32 },
    Builtin,
}

impl FontSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Builtin => None,
        }
    }
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, index } => write!(f, "{}#{}", path.display(), index),
            Self::Builtin => f.write_str("<built-in>"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub face: FontFace,
    pub source: FontSource,
}

impl LoadedFont {
    pub fn builtin() -> Self {
        Self {
            face: FontFace::Builtin,
            source: FontSource::Builtin,
        }
    }
}

/// Why a single font file could not be opened.
#[derive(Debug, Error)]
pub enum FontFileError {
    #[error("cannot read font file: {0}")]
    Io(#[from] std::io::Error),

    #[error("file is not a font: {0}")]
    NotAFont(String),

    #[error("face index {index} out of range")]
    IndexOutOfRange { index: u32 },
}

/// Font selection parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontRequest<'a> {
    pub family: &'a str,
    pub bold: bool,
    pub italic: bool,
    pub style_hint: Option<&'a str>,
    pub font_path: Option<&'a Path>,
    pub font_index: u32,
}

/// One link of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    ExplicitPath,
    Catalog,
    NameVariants,
    PlatformDefaults,
    Builtin,
}

impl LoadStrategy {
    pub const ORDER: [LoadStrategy; 5] = [
        LoadStrategy::ExplicitPath,
        LoadStrategy::Catalog,
        LoadStrategy::NameVariants,
        LoadStrategy::PlatformDefaults,
        LoadStrategy::Builtin,
    ];
}

/// Well-known fonts tried when nothing matches the requested family.
pub fn platform_default_fonts() -> Vec<PathBuf> {
    if cfg!(target_os = "windows") {
        let fonts = std::env::var_os("WINDIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("C:\\Windows"))
            .join("Fonts");
        vec![fonts.join("arial.ttf"), fonts.join("segoeui.ttf")]
    } else if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/System/Library/Fonts/Helvetica.ttc"),
            PathBuf::from("/System/Library/Fonts/Supplemental/Arial.ttf"),
        ]
    } else {
        vec![
            PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
            PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"),
            PathBuf::from("/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"),
        ]
    }
}

/// Runs the fallback chain and caches parsed font files.
pub struct FontLoader {
    catalog: Arc<FontCatalog>,
    default_fonts: Vec<PathBuf>,
    faces: RwLock<HashMap<(PathBuf, u32), FontArc>>,
}

impl fmt::Debug for FontLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontLoader")
            .field("catalog_dirs", &self.catalog.dirs())
            .field("default_fonts", &self.default_fonts)
            .field("cached_faces", &self.faces.read().len())
            .finish()
    }
}

impl FontLoader {
    pub fn new(catalog: Arc<FontCatalog>) -> Self {
        Self {
            catalog,
            default_fonts: platform_default_fonts(),
            faces: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the platform default font list.
    pub fn with_default_fonts(mut self, default_fonts: Vec<PathBuf>) -> Self {
        self.default_fonts = default_fonts;
        self
    }

    pub fn catalog(&self) -> &Arc<FontCatalog> {
        &self.catalog
    }

    /// Load a face for `request`. Never fails.
    pub fn load(&self, request: &FontRequest<'_>) -> LoadedFont {
        for strategy in LoadStrategy::ORDER {
            if let Some(font) = self.attempt(strategy, request) {
                debug!(
                    family = request.family,
                    strategy = ?strategy,
                    source = %font.source,
                    "Font loaded"
                );
                return font;
            }
        }
        LoadedFont::builtin()
    }

    /// Try a single strategy.
    pub fn attempt(&self, strategy: LoadStrategy, request: &FontRequest<'_>) -> Option<LoadedFont> {
        match strategy {
            LoadStrategy::ExplicitPath => {
                let path = request.font_path.filter(|p| !p.as_os_str().is_empty())?;
                match self.open(path, request.font_index) {
                    Ok(font) => Some(font),
                    Err(FontFileError::IndexOutOfRange { index }) => {
                        debug!(path = %path.display(), index, "Face index out of range, using face 0");
                        self.open(path, 0).ok()
                    }
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "Explicit font unusable");
                        None
                    }
                }
            }
            LoadStrategy::Catalog => {
                if request.family.trim().is_empty() {
                    return None;
                }
                let (path, index) = self.catalog.resolve(
                    request.family,
                    request.bold,
                    request.italic,
                    request.style_hint,
                )?;
                self.open(&path, index).ok()
            }
            LoadStrategy::NameVariants => self
                .name_variant_paths(request)
                .into_iter()
                .find_map(|path| self.open(&path, 0).ok()),
            LoadStrategy::PlatformDefaults => self
                .default_fonts
                .iter()
                .find_map(|path| self.open(path, 0).ok()),
            LoadStrategy::Builtin => Some(LoadedFont::builtin()),
        }
    }

    /// Candidate files named after the family, most specific style first.
    pub fn name_variant_paths(&self, request: &FontRequest<'_>) -> Vec<PathBuf> {
        let family = request.family.trim();
        if family.is_empty() {
            return Vec::new();
        }

        let mut stems: Vec<String> = Vec::new();
        let compact: String = family.chars().filter(|c| !c.is_whitespace()).collect();
        let bases = if compact == family {
            vec![family.to_string()]
        } else {
            vec![family.to_string(), compact]
        };

        let suffixes: &[&str] = match (request.bold, request.italic) {
            (true, true) => &["BoldItalic", "-BoldItalic", "Bold", "-Bold", ""],
            (true, false) => &["Bold", "-Bold", ""],
            (false, true) => &["Italic", "-Italic", ""],
            (false, false) => &["", "-Regular"],
        };
        for base in &bases {
            for suffix in suffixes {
                stems.push(format!("{base}{suffix}"));
            }
        }

        let mut paths: Vec<PathBuf> = Vec::new();
        for stem in &stems {
            let files = self.catalog.files_with_stem(stem);
            for ext in VARIANT_EXTENSIONS {
                for path in files {
                    let matches_ext = path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case(ext));
                    if matches_ext && !paths.contains(path) {
                        paths.push(path.clone());
                    }
                }
            }
        }
        paths
    }

    fn open(&self, path: &Path, index: u32) -> Result<LoadedFont, FontFileError> {
        let key = (path.to_path_buf(), index);
        if let Some(font) = self.faces.read().get(&key) {
            return Ok(LoadedFont {
                face: FontFace::Outline(font.clone()),
                source: FontSource::File {
                    path: key.0,
                    index,
                },
            });
        }

        let font = open_font_file(path, index)?;
        self.faces.write().insert(key.clone(), font.clone());
        Ok(LoadedFont {
            face: FontFace::Outline(font),
            source: FontSource::File {
                path: key.0,
                index,
            },
        })
    }
}

/// Parse one face of a font file.
pub fn open_font_file(path: &Path, index: u32) -> Result<FontArc, FontFileError> {
    let data = std::fs::read(path)?;

    if let Err(e) = ttf_parser::Face::parse(&data, index) {
        return Err(match e {
            ttf_parser::FaceParsingError::FaceIndexOutOfBounds => {
                FontFileError::IndexOutOfRange { index }
            }
            other => FontFileError::NotAFont(other.to_string()),
        });
    }

    let font = FontVec::try_from_vec_and_index(data, index)
        .map_err(|e| FontFileError::NotAFont(e.to_string()))?;
    Ok(FontArc::new(font))
}
