// Font catalog and fallback chain unit tests
// Tests that need a real font copy one from the system catalog and skip when none is installed

use photo_watermark::watermark::font_catalog::read_font_file;
use photo_watermark::watermark::font_loader::{FontRequest, LoadStrategy};
use photo_watermark::watermark::{FontCatalog, FontEntry, FontLoader, FontSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn installed_font() -> Option<PathBuf> {
    FontCatalog::system()
        .entries()
        .iter()
        .filter(|entry| entry.face_index == 0)
        .map(|entry| entry.path.clone())
        .find(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"))
                .unwrap_or(false)
        })
}

fn copy_font(font: &Path, dir: &Path, file_name: &str) -> PathBuf {
    let target = dir.join(file_name);
    std::fs::copy(font, &target).unwrap();
    target
}

fn isolated_loader(dirs: Vec<PathBuf>) -> FontLoader {
    FontLoader::new(Arc::new(FontCatalog::with_dirs(dirs))).with_default_fonts(Vec::new())
}

#[test]
fn test_unknown_family_falls_back_to_builtin_without_fonts() {
    let loader = isolated_loader(Vec::new());
    let font = loader.load(&FontRequest {
        family: "Definitely Not A Real Family",
        bold: true,
        ..Default::default()
    });
    assert_eq!(font.source, FontSource::Builtin);
}

#[test]
fn test_strategy_order() {
    assert_eq!(LoadStrategy::ORDER[0], LoadStrategy::ExplicitPath);
    assert_eq!(LoadStrategy::ORDER[4], LoadStrategy::Builtin);
}

#[test]
fn test_catalog_ignores_broken_font_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.ttf"), b"not a font").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

    let catalog = FontCatalog::with_dirs(vec![dir.path().to_path_buf()]);
    assert!(catalog.entries().is_empty());
    assert!(catalog.families().is_empty());
    assert!(read_font_file(&dir.path().join("broken.ttf")).is_empty());
}

#[test]
fn test_resolve_prefers_exact_family_over_normalized() {
    let catalog = FontCatalog::from_entries(vec![
        FontEntry::new("/fonts/NotoSans.ttf", 0, "NotoSans", "Regular"),
        FontEntry::new("/fonts/Noto Sans.ttf", 0, "Noto Sans", "Regular"),
    ]);

    let (path, _) = catalog.resolve("Noto Sans", false, false, None).unwrap();
    assert_eq!(path, PathBuf::from("/fonts/Noto Sans.ttf"));

    let (path, _) = catalog.resolve("noto-sans", false, false, None).unwrap();
    assert!(path.starts_with("/fonts"));
}

#[test]
fn test_catalog_scans_nested_directories() {
    let Some(font) = installed_font() else {
        eprintln!("Skipping test: no TrueType/OpenType font installed");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    std::fs::create_dir_all(&nested).unwrap();
    let copied = copy_font(&font, &nested, "copied.ttf");

    let catalog = FontCatalog::with_dirs(vec![dir.path().to_path_buf()]);
    let entry = catalog
        .entries()
        .iter()
        .find(|entry| entry.path == copied)
        .cloned()
        .expect("copied font indexed");

    let (path, index) = catalog
        .resolve(&entry.family, entry.is_bold(), entry.is_italic(), None)
        .unwrap();
    assert_eq!((path, index), (copied, 0));
}

#[test]
fn test_explicit_path_wins_over_catalog() {
    let Some(font) = installed_font() else {
        eprintln!("Skipping test: no TrueType/OpenType font installed");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let explicit = copy_font(&font, dir.path(), "explicit.ttf");

    let loader = isolated_loader(Vec::new());
    let loaded = loader.load(&FontRequest {
        family: "Whatever",
        font_path: Some(&explicit),
        ..Default::default()
    });
    assert_eq!(loaded.source.path(), Some(explicit.as_path()));
}

#[test]
fn test_explicit_path_with_bad_index_still_loads_file() {
    let Some(font) = installed_font() else {
        eprintln!("Skipping test: no TrueType/OpenType font installed");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let explicit = copy_font(&font, dir.path(), "single.ttf");

    let loader = isolated_loader(Vec::new());
    let loaded = loader
        .attempt(
            LoadStrategy::ExplicitPath,
            &FontRequest {
                font_path: Some(&explicit),
                font_index: 42,
                ..Default::default()
            },
        )
        .expect("face 0 is used when the index does not exist");
    assert_eq!(loaded.source.path(), Some(explicit.as_path()));
}

#[test]
fn test_name_variant_found_when_catalog_misses() {
    let Some(font) = installed_font() else {
        eprintln!("Skipping test: no TrueType/OpenType font installed");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let variant = copy_font(&font, dir.path(), "Zzyzx-Bold.ttf");

    let loader = isolated_loader(vec![dir.path().to_path_buf()]);
    let request = FontRequest {
        family: "Zzyzx",
        bold: true,
        ..Default::default()
    };

    assert!(loader.attempt(LoadStrategy::Catalog, &request).is_none());
    assert_eq!(loader.load(&request).source.path(), Some(variant.as_path()));
}

#[test]
fn test_platform_defaults_skip_missing_files() {
    let Some(font) = installed_font() else {
        eprintln!("Skipping test: no TrueType/OpenType font installed");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let fallback = copy_font(&font, dir.path(), "fallback.ttf");

    let loader = FontLoader::new(Arc::new(FontCatalog::empty()))
        .with_default_fonts(vec![dir.path().join("missing.ttf"), fallback.clone()]);
    let loaded = loader.load(&FontRequest {
        family: "No Such Family",
        ..Default::default()
    });

    assert_eq!(
        loaded.source,
        FontSource::File {
            path: fallback,
            index: 0
        }
    );
}
