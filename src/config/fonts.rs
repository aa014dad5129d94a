//! Font discovery configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::watermark::font_catalog::{platform_font_dirs, FontCatalog};
use crate::watermark::font_loader::FontLoader;

/// Where fonts are looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontsConfig {
    /// Directories scanned in addition to the platform font directories.
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,
    /// Skip the platform font directories and default fonts entirely.
    #[serde(default)]
    pub disable_system_scan: bool,
}

impl FontsConfig {
    /// Directories the catalog will scan, in order.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = if self.disable_system_scan {
            Vec::new()
        } else {
            platform_font_dirs()
        };
        dirs.extend(self.extra_dirs.iter().cloned());
        dirs
    }

    pub fn build_loader(&self) -> FontLoader {
        let catalog = Arc::new(FontCatalog::with_dirs(self.search_dirs()));
        let loader = FontLoader::new(catalog);
        if self.disable_system_scan {
            loader.with_default_fonts(Vec::new())
        } else {
            loader
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(dir) = self.extra_dirs.iter().find(|d| d.as_os_str().is_empty()) {
            return Err(format!("Font directory '{}' cannot be empty", dir.display()));
        }
        Ok(())
    }
}
