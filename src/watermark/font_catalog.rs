//! Installed font discovery and best-match lookup.
//!
//! The catalog walks a list of font directories once, on first lookup, and
//! records every face of every font file it can parse. Lookups are keyed by
//! family name and scored against the requested weight, slant and optional
//! style string.
//!
//! # Example
//!
//! ```no_run
//! use photo_watermark::watermark::font_catalog::FontCatalog;
//!
//! let catalog = FontCatalog::system();
//! if let Some((path, index)) = catalog.resolve("DejaVu Sans", true, false, None) {
//!     println!("{} #{}", path.display(), index);
//! }
//! ```

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;
use walkdir::WalkDir;

const FONT_EXTENSIONS: [&str; 4] = ["ttf", "otf", "ttc", "otc"];

const BOLD_TOKENS: [&str; 6] = ["bold", "black", "heavy", "demi", "semibold", "medium"];
const ITALIC_TOKENS: [&str; 3] = ["italic", "oblique", "slant"];

const NAME_ID_FAMILY: u16 = 1;
const NAME_ID_SUBFAMILY: u16 = 2;
const NAME_ID_TYPOGRAPHIC_FAMILY: u16 = 16;
const NAME_ID_TYPOGRAPHIC_SUBFAMILY: u16 = 17;

/// A single face discovered on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEntry {
    pub path: PathBuf,
    pub face_index: u32,
    pub family: String,
    /// Subfamily name as reported by the font, e.g. "Bold Italic".
    pub style: String,
}

impl FontEntry {
    pub fn new(
        path: impl Into<PathBuf>,
        face_index: u32,
        family: impl Into<String>,
        style: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            face_index,
            family: family.into(),
            style: style.into(),
        }
    }

    pub fn is_bold(&self) -> bool {
        let style = self.style.to_lowercase();
        BOLD_TOKENS.iter().any(|token| style.contains(token))
    }

    pub fn is_italic(&self) -> bool {
        let style = self.style.to_lowercase();
        ITALIC_TOKENS.iter().any(|token| style.contains(token))
    }

    /// Match score against a request. Higher is better.
    pub fn score(&self, bold: bool, italic: bool, style_hint: Option<&str>) -> u32 {
        let style = self.style.to_lowercase();
        let face_bold = self.is_bold();
        let face_italic = self.is_italic();
        let mut score = 0;

        if bold == face_bold {
            score += 2;
        }
        if italic == face_italic {
            score += 2;
        }
        if bold && face_bold {
            score += 1;
        }
        if italic && face_italic {
            score += 1;
        }
        if !bold && !italic && (style.is_empty() || style.contains("regular")) {
            score += 1;
        }

        if let Some(hint) = style_hint.map(str::trim).filter(|h| !h.is_empty()) {
            let hint = hint.to_lowercase();
            if style == hint {
                score += 5;
            } else if style.contains(&hint) {
                score += 3;
            }
        }

        score
    }
}

/// Family name with spaces, punctuation and case removed.
pub fn normalize_family(family: &str) -> String {
    family
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Font directories searched on the current platform.
pub fn platform_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let home = std::env::var_os("HOME").map(PathBuf::from);

    if cfg!(target_os = "windows") {
        let windir = std::env::var_os("WINDIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("C:\\Windows"));
        dirs.push(windir.join("Fonts"));
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join("Microsoft").join("Windows").join("Fonts"));
        }
    } else if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Some(home) = &home {
            dirs.push(home.join("Library").join("Fonts"));
        }
    } else {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(home) = &home {
            dirs.push(home.join(".fonts"));
            dirs.push(home.join(".local").join("share").join("fonts"));
        }
    }

    dirs
}

#[derive(Debug, Default)]
struct FontIndex {
    entries: Vec<FontEntry>,
    /// Lowercase family name to entry positions, in discovery order.
    by_family: HashMap<String, Vec<usize>>,
    /// Normalized family name to entry positions.
    by_normalized: HashMap<String, Vec<usize>>,
    /// Lowercase file stem to every scanned font file carrying it, parsable
    /// or not, in walk order.
    by_stem: HashMap<String, Vec<PathBuf>>,
}

impl FontIndex {
    fn from_entries(entries: Vec<FontEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    fn insert(&mut self, entry: FontEntry) {
        let position = self.entries.len();
        self.by_family
            .entry(entry.family.to_lowercase())
            .or_default()
            .push(position);
        self.by_normalized
            .entry(normalize_family(&entry.family))
            .or_default()
            .push(position);
        self.entries.push(entry);
    }

    fn insert_file(&mut self, path: &Path) {
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            self.by_stem
                .entry(stem.to_lowercase())
                .or_default()
                .push(path.to_path_buf());
        }
    }

    fn candidates(&self, family: &str) -> Option<&[usize]> {
        self.by_family
            .get(&family.to_lowercase())
            .or_else(|| self.by_normalized.get(&normalize_family(family)))
            .map(Vec::as_slice)
            .filter(|positions| !positions.is_empty())
    }
}

type LookupKey = (String, bool, bool, Option<String>);

/// Process-lifetime index of installed fonts.
///
/// The directory scan runs at most once, on the first call that needs it.
/// Resolutions are memoized per exact request.
#[derive(Debug)]
pub struct FontCatalog {
    dirs: Vec<PathBuf>,
    index: OnceLock<FontIndex>,
    memo: RwLock<HashMap<LookupKey, Option<(PathBuf, u32)>>>,
}

impl FontCatalog {
    /// Catalog over an explicit list of directories.
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            index: OnceLock::new(),
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Catalog over the platform font directories.
    pub fn system() -> Self {
        Self::with_dirs(platform_font_dirs())
    }

    /// Catalog that never finds anything. Text falls back to the built-in face.
    pub fn empty() -> Self {
        Self::from_entries(Vec::new())
    }

    /// Catalog over a pre-built list of faces; no directory is scanned.
    pub fn from_entries(entries: Vec<FontEntry>) -> Self {
        let catalog = Self::with_dirs(Vec::new());
        let _ = catalog.index.set(FontIndex::from_entries(entries));
        catalog
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn index(&self) -> &FontIndex {
        self.index.get_or_init(|| {
            let index = scan_dirs(&self.dirs);
            debug!(
                dirs = self.dirs.len(),
                files = index.by_stem.values().map(Vec::len).sum::<usize>(),
                faces = index.entries.len(),
                families = index.by_family.len(),
                "Font index built"
            );
            index
        })
    }

    /// All indexed faces in discovery order.
    pub fn entries(&self) -> &[FontEntry] {
        &self.index().entries
    }

    /// Scanned font files named `stem` (extension aside), ignoring case.
    ///
    /// Files in nested directories are included. Catalogs built with
    /// [`FontCatalog::from_entries`] have no files.
    pub fn files_with_stem(&self, stem: &str) -> &[PathBuf] {
        self.index()
            .by_stem
            .get(&stem.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Sorted, de-duplicated family names.
    pub fn families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .index()
            .entries
            .iter()
            .map(|entry| entry.family.clone())
            .collect();
        families.sort_by_key(|family| family.to_lowercase());
        families.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        families
    }

    /// Best matching face for the request, or `None` when the family is unknown.
    pub fn resolve(
        &self,
        family: &str,
        bold: bool,
        italic: bool,
        style_hint: Option<&str>,
    ) -> Option<(PathBuf, u32)> {
        let key: LookupKey = (
            family.to_string(),
            bold,
            italic,
            style_hint.map(str::to_string),
        );
        if let Some(hit) = self.memo.read().get(&key) {
            return hit.clone();
        }

        let resolved = self.best_match(family, bold, italic, style_hint);
        debug!(
            family,
            bold,
            italic,
            style_hint,
            resolved = ?resolved.as_ref().map(|(path, index)| (path.display().to_string(), *index)),
            "Font family resolved"
        );

        self.memo.write().insert(key, resolved.clone());
        resolved
    }

    fn best_match(
        &self,
        family: &str,
        bold: bool,
        italic: bool,
        style_hint: Option<&str>,
    ) -> Option<(PathBuf, u32)> {
        let index = self.index();
        let candidates = index.candidates(family)?;

        let mut best: Option<(&FontEntry, u32)> = None;
        for &position in candidates {
            let entry = &index.entries[position];
            let score = entry.score(bold, italic, style_hint);
            // strict comparison keeps the first-seen entry on ties
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((entry, score));
            }
        }

        best.map(|(entry, _)| (entry.path.clone(), entry.face_index))
    }
}

impl Default for FontCatalog {
    fn default() -> Self {
        Self::system()
    }
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FONT_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

fn scan_dirs(dirs: &[PathBuf]) -> FontIndex {
    let mut index = FontIndex::default();

    for dir in dirs {
        if !dir.is_dir() {
            continue;
        }
        // Permission errors and broken links are skipped silently
        for file in WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file() && has_font_extension(e.path()))
        {
            index.insert_file(file.path());
            for entry in read_font_file(file.path()) {
                index.insert(entry);
            }
        }
    }

    index
}

/// Every face in a font file. Unreadable or unparsable files yield nothing.
pub fn read_font_file(path: &Path) -> Vec<FontEntry> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Skipping unreadable font file");
            return Vec::new();
        }
    };

    let face_count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
    let mut entries = Vec::new();

    for face_index in 0..face_count {
        let face = match ttf_parser::Face::parse(&data, face_index) {
            Ok(face) => face,
            Err(e) => {
                debug!(path = %path.display(), face_index, error = %e, "Skipping unparsable face");
                continue;
            }
        };

        let family = face_name(&face, NAME_ID_FAMILY);
        let style = face_name(&face, NAME_ID_SUBFAMILY).unwrap_or_default();
        let Some(family) = family else {
            continue;
        };

        // Typographic names group weights that legacy names split into
        // separate families, e.g. "Noto Sans SemiBold" under "Noto Sans".
        if let Some(typographic) = face_name(&face, NAME_ID_TYPOGRAPHIC_FAMILY) {
            if !typographic.eq_ignore_ascii_case(&family) {
                let typographic_style =
                    face_name(&face, NAME_ID_TYPOGRAPHIC_SUBFAMILY).unwrap_or_else(|| style.clone());
                entries.push(FontEntry::new(path, face_index, typographic, typographic_style));
            }
        }

        entries.push(FontEntry::new(path, face_index, family, style));
    }

    entries
}

fn face_name(face: &ttf_parser::Face<'_>, name_id: u16) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == name_id && name.is_unicode())
        .find_map(|name| name.to_string())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}
