// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::watermark::WatermarkConfig;

pub mod export;
pub mod fonts;

pub use export::{ExportConfig, OutputFormat};
pub use fonts::FontsConfig;

/// On-disk configuration for the `photo-watermark` binary.
///
/// ```yaml
/// watermark:
///   text: "© ${STUDIO_NAME}"
///   position_type: bottom-right
/// fonts:
///   extra_dirs: ["./fonts"]
/// export:
///   output_format: jpeg
///   jpeg_quality: 90
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub fonts: FontsConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Replace `${VAR_NAME}` references with environment variable values.
///
/// Every referenced variable must be set.
pub fn substitute_env_vars(raw: &str) -> Result<String, String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

    // First, check that all referenced environment variables exist
    for caps in re.captures_iter(raw) {
        let var_name = &caps[1];
        std::env::var(var_name).map_err(|_| {
            format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            )
        })?;
    }

    let substituted = re.replace_all(raw, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_default()
    });
    Ok(substituted.into_owned())
}

impl AppConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        let substituted = substitute_env_vars(yaml)?;
        // An empty document means "all defaults"
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_json_with_env(json: &str) -> Result<Self, String> {
        let substituted = substitute_env_vars(json)?;
        serde_json::from_str(&substituted).map_err(|e| e.to_string())
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_with_env(&raw)
        } else {
            Self::from_yaml_with_env(&raw)
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.watermark.validate()?;
        self.fonts.validate()?;
        self.export.validate()?;
        Ok(())
    }
}
