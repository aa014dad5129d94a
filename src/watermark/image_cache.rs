//! Decoded watermark image cache.
//!
//! Image watermarks are read from local files and decoded once per path.
//! Concurrent first requests for the same path share a single decode.
//! Entries live until explicitly cleared; there is no time-based expiry. A
//! capacity bound is opt-in through [`ImageCacheConfig::max_cache_entries`].

use super::error::WatermarkError;
use image::{ImageFormat, RgbaImage};
use moka::sync::Cache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Configuration for the image cache.
#[derive(Debug, Clone, Default)]
pub struct ImageCacheConfig {
    /// Maximum number of decoded images kept. `None` (the default) keeps
    /// every image for the life of the cache.
    pub max_cache_entries: Option<u64>,
}

/// A decoded watermark image shared between callers.
#[derive(Clone)]
pub struct CachedImage {
    pub image: Arc<RgbaImage>,
}

impl std::fmt::Debug for CachedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedImage")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .finish()
    }
}

impl CachedImage {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }
}

/// Read-through cache of decoded watermark images keyed by file path.
#[derive(Clone)]
pub struct ImageCache {
    cache: Cache<PathBuf, CachedImage>,
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(ImageCacheConfig::default())
    }
}

impl ImageCache {
    pub fn new(config: ImageCacheConfig) -> Self {
        let mut builder = Cache::builder();
        if let Some(max) = config.max_cache_entries {
            builder = builder.max_capacity(max);
        }
        Self {
            cache: builder.build(),
        }
    }

    /// Decoded image for `path`, loading it on first use.
    ///
    /// # Errors
    ///
    /// - `WatermarkError::SourceUnreadable` if the file is missing or unreadable
    /// - `WatermarkError::Decode` if the file is not a supported image
    ///
    /// Failed loads are not cached.
    pub fn get_or_load(&self, path: &Path) -> Result<CachedImage, WatermarkError> {
        self.cache
            .try_get_with(path.to_path_buf(), || -> Result<_, WatermarkError> {
                let image = load_image(path)?;
                debug!(
                    path = %path.display(),
                    width = image.width(),
                    height = image.height(),
                    "Watermark image decoded and cached"
                );
                Ok(CachedImage::new(image))
            })
            .map_err(|e: Arc<WatermarkError>| (*e).clone())
    }

    /// Check if an image is cached.
    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache.contains_key(path)
    }

    /// Get the number of cached images.
    pub fn cache_size(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Clear all cached images.
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }
}

/// Read and decode an image file into RGBA8.
pub fn load_image(path: &Path) -> Result<RgbaImage, WatermarkError> {
    let data = std::fs::read(path).map_err(|e| WatermarkError::source_unreadable(path, e))?;
    let format = detect_image_format(&data, path)?;

    image::load_from_memory_with_format(&data, format)
        .map(|image| image.to_rgba8())
        .map_err(|e| WatermarkError::Decode(format!("{}: {e}", path.display())))
}

/// Detect image format from bytes or filename extension.
fn detect_image_format(data: &[u8], path: &Path) -> Result<ImageFormat, WatermarkError> {
    if let Ok(format) = image::guess_format(data) {
        return Ok(format);
    }

    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "gif" => Ok(ImageFormat::Gif),
        "webp" => Ok(ImageFormat::WebP),
        _ => Err(WatermarkError::Decode(format!(
            "Unsupported image format for {}",
            path.display()
        ))),
    }
}
