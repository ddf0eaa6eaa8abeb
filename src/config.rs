//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user file only needs the keys it wants to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_root = "content"
//!
//! [images]
//! widths = [50, 200, 500, 1000, 1500, 2000]  # Variant ladder (ascending)
//! quality = 85                                # Lossy encoding quality (1-100)
//! extensions = ["jpg", "jpeg", "png", "webp", "gif"]
//!
//! [render]
//! url_prefix = "/content"     # Public URL prefix for post attachments
//! fallback_max_width = 500    # Widest variant used for the plain <img>
//!
//! [processing]
//! max_processes = 4           # Max parallel workers (omit for auto = CPU cores)
//!
//! [watch]
//! poll_interval_ms = 500      # How often source files are fingerprinted
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::imaging::ImageFormat;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Path to the content root directory.
    #[serde(default = "default_content_root")]
    pub content_root: String,
    /// Variant ladder and encoding settings.
    pub images: ImagesConfig,
    /// Markdown image rendering settings.
    pub render: RenderConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Change feed settings.
    pub watch: WatchConfig,
}

fn default_content_root() -> String {
    "content".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            images: ImagesConfig::default(),
            render: RenderConfig::default(),
            processing: ProcessingConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.widths.is_empty() {
            return Err(ConfigError::Validation(
                "images.widths must not be empty".into(),
            ));
        }
        if self.images.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "images.widths values must be non-zero".into(),
            ));
        }
        if !self.images.widths.windows(2).all(|w| w[0] < w[1]) {
            return Err(ConfigError::Validation(
                "images.widths must be strictly ascending".into(),
            ));
        }
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if let Some(ext) = self
            .images
            .extensions
            .iter()
            .find(|ext| ImageFormat::from_extension(ext).is_none())
        {
            return Err(ConfigError::Validation(format!(
                "images.extensions: unsupported image format {ext:?}"
            )));
        }
        if self.render.fallback_max_width == 0 {
            return Err(ConfigError::Validation(
                "render.fallback_max_width must be non-zero".into(),
            ));
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.poll_interval_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Variant ladder and encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Candidate variant widths, strictly ascending. Only widths below the
    /// source width are generated.
    pub widths: Vec<u32>,
    /// Lossy encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// File extensions treated as images.
    pub extensions: Vec<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            widths: vec![50, 200, 500, 1000, 1500, 2000],
            quality: 85,
            extensions: ["jpg", "jpeg", "png", "webp", "gif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Markdown image rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Public URL prefix under which post attachments are served.
    pub url_prefix: String,
    /// Ceiling for the plain `<img>` fallback: the widest same-format
    /// candidate not exceeding this is used.
    pub fallback_max_width: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            url_prefix: "/content".to_string(),
            fallback_max_width: 500,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Change feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    pub poll_interval_ms: u64,
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the base, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a `config.toml` file.
///
/// A missing file yields the validated stock defaults.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = if path.exists() {
        let content = fs::read_to_string(path)?;
        Some(toml::from_str::<toml::Value>(&content)?)
    } else {
        None
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Path to the content directory (posts and their attachments)
content_root = "content"

# ---------------------------------------------------------------------------
# Responsive image variants
# ---------------------------------------------------------------------------
[images]
# Candidate widths for scaled variants, strictly ascending.
# Only widths smaller than the source image are generated (no upscaling).
widths = [50, 200, 500, 1000, 1500, 2000]

# Lossy encoding quality (1 = worst, 100 = best).
quality = 85

# File extensions treated as images.
extensions = ["jpg", "jpeg", "png", "webp", "gif"]

# ---------------------------------------------------------------------------
# Markdown image rendering
# ---------------------------------------------------------------------------
[render]
# Public URL prefix under which post attachments are served.
url_prefix = "/content"

# The plain <img> inside <picture> uses the widest variant not exceeding this.
fallback_max_width = 500

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Change feed
# ---------------------------------------------------------------------------
[watch]
# How often watched source files are checked for changes, in milliseconds.
poll_interval_ms = 500
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_ladder() {
        let config = SiteConfig::default();
        assert_eq!(config.images.widths, vec![50, 200, 500, 1000, 1500, 2000]);
        assert_eq!(config.images.quality, 85);
        assert_eq!(config.render.fallback_max_width, 500);
        assert_eq!(config.render.url_prefix, "/content");
        assert_eq!(config.content_root, "content");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[images]
widths = [100, 400]
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.images.widths, vec![100, 400]);
        // Defaults preserved
        assert_eq!(config.images.quality, 85);
        assert_eq!(config.render.fallback_max_width, 500);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.images.widths, vec![50, 200, 500, 1000, 1500, 2000]);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[render]
url_prefix = "/media"
fallback_max_width = 800
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.render.url_prefix, "/media");
        assert_eq!(config.render.fallback_max_width, 800);
        assert_eq!(config.images.quality, 85);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[images]\nwidths = [500, 200]\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig {
            max_processes: None,
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn watch_interval_as_duration() {
        let config = WatchConfig {
            poll_interval_ms: 250,
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[images]
widths = [50, 200]
quality = 85
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[images]\nquality = 70\n").unwrap();
        let merged = merge_toml(base, overlay);
        let images = merged.get("images").unwrap();
        assert_eq!(images.get("quality").unwrap().as_integer(), Some(70));
        assert_eq!(images.get("widths").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn merge_toml_arrays_replace_not_append() {
        let base: toml::Value = toml::from_str("widths = [50, 200, 500]").unwrap();
        let overlay: toml::Value = toml::from_str("widths = [300]").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("widths").unwrap().as_array().unwrap().len(), 1);
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[images]\nqualty = 90\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[imagez]\nquality = 90\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_widths_empty() {
        let mut config = SiteConfig::default();
        config.images.widths = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_widths_must_ascend() {
        let mut config = SiteConfig::default();
        config.images.widths = vec![200, 200];
        assert!(config.validate().is_err());
        config.images.widths = vec![500, 50];
        assert!(config.validate().is_err());
        config.images.widths = vec![0, 50];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_quality_range() {
        let mut config = SiteConfig::default();
        config.images.quality = 101;
        assert!(config.validate().unwrap_err().to_string().contains("quality"));
        config.images.quality = 0;
        assert!(config.validate().is_err());
        config.images.quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unsupported_extension() {
        let mut config = SiteConfig::default();
        config.images.extensions.push("psd".to_string());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("psd"));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config.images.widths, vec![50, 200, 500, 1000, 1500, 2000]);
        assert_eq!(config.images.quality, 85);
        assert_eq!(config.images.extensions.len(), 5);
        assert_eq!(config.render.fallback_max_width, 500);
        assert_eq!(config.watch.poll_interval_ms, 500);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        assert!(val.is_table());
        for section in ["images", "render", "processing", "watch"] {
            assert!(val.get(section).is_some(), "missing {section}");
        }
    }
}
