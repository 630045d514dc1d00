//! Bake configuration.
//!
//! Two layers:
//!
//! 1. [`SiteConfig`]: process-wide settings loaded from `bake.toml`. Sparse
//!    user files are merged over stock defaults and validated.
//! 2. [`BuildOptions`]: the immutable configuration of one run, resolved
//!    from a `SiteConfig` plus command-line [`BakeArgs`]. Every component
//!    receives what it needs from this value; nothing reads ambient state.
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # build_dir = "build"      # No default: set here or pass --build-dir
//! language_code = "en-us"    # Primary language, promoted to the build root
//! content = "content.json"   # Content manifest exported from the CMS
//!
//! [static_files]
//! root = "static"            # Collected static assets
//! url = "/static/"           # Mounted at <build_dir>/static
//!
//! [media]
//! root = "media"
//! url = "/media/"
//!
//! [render]
//! base_url = "http://127.0.0.1:8000"
//! timeout_secs = 30
//! retries = 0
//! strip_preamble = true
//!
//! [processing]
//! # max_processes = 4       # Parallel render workers (omit for sequential)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::language::{LanguageCode, LanguageError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "bake.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid language_code: {0}")]
    Language(#[from] LanguageError),
    #[error("Build directory unconfigured. Set build_dir in bake.toml or provide it with --build-dir")]
    MissingBuildDir,
}

/// Site configuration loaded from `bake.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Output directory. Overridden by `--build-dir`.
    pub build_dir: Option<PathBuf>,
    /// Primary language; its subtree is promoted to the build root.
    pub language_code: String,
    /// Path to the JSON content manifest.
    pub content: PathBuf,
    pub static_files: AssetConfig,
    pub media: AssetConfig,
    pub render: RenderConfig,
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            build_dir: None,
            language_code: "en-us".to_string(),
            content: PathBuf::from("content.json"),
            static_files: AssetConfig {
                root: PathBuf::from("static"),
                url: "/static/".to_string(),
            },
            media: AssetConfig {
                root: PathBuf::from("media"),
                url: "/media/".to_string(),
            },
            render: RenderConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

/// A directory copied verbatim into the build tree under a URL prefix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetConfig {
    /// Source directory on disk.
    pub root: PathBuf,
    /// URL prefix the files are served under, e.g. `/static/`.
    pub url: String,
}

/// Settings for the HTTP render collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Origin of the live site, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Per-request timeout. Expiry aborts the bake.
    pub timeout_secs: u64,
    /// Extra attempts after a transport failure. HTTP errors are never retried.
    pub retries: u32,
    /// Drop everything up to the first blank line of each response body.
    pub strip_preamble: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
            retries: 0,
            strip_preamble: true,
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parallel rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of content items rendered at once.
    /// When absent, items are rendered one at a time.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → 1 (sequential)
/// - `Some(n)` → `min(n, cores)`
pub fn effective_jobs(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(1)
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        LanguageCode::parse(&self.language_code)?;
        url_subdir("static_files.url", &self.static_files.url)?;
        url_subdir("media.url", &self.media.url)?;
        if self.render.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "render.timeout_secs must be greater than 0".into(),
            ));
        }
        if !(self.render.base_url.starts_with("http://")
            || self.render.base_url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(
                "render.base_url must start with http:// or https://".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn primary_language(&self) -> Result<LanguageCode, ConfigError> {
        Ok(LanguageCode::parse(&self.language_code)?)
    }
}

/// Turn a URL prefix like `/static/` into a relative directory (`static`).
///
/// The prefix must name a real sub-path: `/` would alias the build root,
/// which the remove-then-copy step would wipe.
pub fn url_subdir(key: &str, url: &str) -> Result<PathBuf, ConfigError> {
    let trimmed = url.trim_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{key} must name a sub-path, got {url:?}"
        )));
    }
    let rel = PathBuf::from(trimmed);
    if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
        return Err(ConfigError::Validation(format!(
            "{key} must be a plain relative path, got {url:?}"
        )));
    }
    Ok(rel)
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
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

/// Load a config file as a raw TOML value. `Ok(None)` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
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

/// Load `bake.toml` (or another file) over stock defaults.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        log::debug!("no config at {}, using stock defaults", path.display());
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// A documented stock `bake.toml`, printed by `bakerman gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Bakerman Configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error. Relative paths are resolved against
# the working directory.

# Output directory. No default: set it here or pass --build-dir.
# build_dir = "build"

# Primary language. Its pages are written under build/<base>/ like every
# other language, and additionally promoted to the build root.
language_code = "en-us"

# JSON content manifest listing pages and their per-language titles.
content = "content.json"

# ---------------------------------------------------------------------------
# Static assets (already collected). Skipped with --skip-static.
# ---------------------------------------------------------------------------
[static_files]
root = "static"
url = "/static/"

# ---------------------------------------------------------------------------
# Uploaded media. Skipped with --skip-media.
# ---------------------------------------------------------------------------
[media]
root = "media"
url = "/media/"

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# Origin of the running site that renders each page.
base_url = "http://127.0.0.1:8000"

# Seconds before a page request is abandoned (aborts the bake).
timeout_secs = 30

# Extra attempts after a connection failure. HTTP errors are never retried.
retries = 0

# Discard everything up to the first blank line of each response (a debug
# banner injected by some render pipelines). Set to false for clean output.
strip_preamble = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum content items rendered in parallel. Omit to render sequentially.
# max_processes = 4
"##
}

/// Raw run parameters, as given on the command line.
#[derive(Debug, Clone)]
pub struct BakeArgs {
    /// Comma-separated content keys, e.g. `index,about`.
    pub slugs: Option<String>,
    pub delete_build_dir: bool,
    pub build_dir: Option<PathBuf>,
    pub skip_static: bool,
    pub skip_media: bool,
}

impl Default for BakeArgs {
    fn default() -> Self {
        Self {
            slugs: None,
            delete_build_dir: true,
            build_dir: None,
            skip_static: false,
            skip_media: false,
        }
    }
}

/// Restricts a bake to a set of content keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugFilter(Vec<String>);

impl SlugFilter {
    /// Parse `a,b,c`. Blank entries are dropped; an all-blank list is no filter.
    pub fn parse(list: &str) -> Option<Self> {
        let mut keys: Vec<String> = Vec::new();
        for key in list.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
        (!keys.is_empty()).then_some(Self(keys))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }
}

/// Source root and build-relative destination of an asset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMount {
    pub root: PathBuf,
    pub dest: PathBuf,
}

/// Fully resolved, immutable configuration of one bake.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub build_dir: PathBuf,
    /// Remove and recreate `build_dir` before writing. Always false when
    /// `slug_filter` is set.
    pub delete_existing: bool,
    pub slug_filter: Option<SlugFilter>,
    pub skip_static: bool,
    pub skip_media: bool,
    pub primary_language: LanguageCode,
    pub static_files: AssetMount,
    pub media: AssetMount,
    pub jobs: usize,
}

impl BuildOptions {
    pub fn resolve(config: &SiteConfig, args: BakeArgs) -> Result<Self, ConfigError> {
        let build_dir = args
            .build_dir
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| config.build_dir.clone())
            .ok_or(ConfigError::MissingBuildDir)?;

        let slug_filter = args.slugs.as_deref().and_then(SlugFilter::parse);
        // A partial bake must never wipe output it is not going to rebuild.
        let delete_existing = args.delete_build_dir && slug_filter.is_none();

        Ok(Self {
            static_files: AssetMount {
                root: config.static_files.root.clone(),
                dest: build_dir.join(url_subdir("static_files.url", &config.static_files.url)?),
            },
            media: AssetMount {
                root: config.media.root.clone(),
                dest: build_dir.join(url_subdir("media.url", &config.media.url)?),
            },
            build_dir,
            delete_existing,
            slug_filter,
            skip_static: args.skip_static,
            skip_media: args.skip_media,
            primary_language: config.primary_language()?,
            jobs: effective_jobs(&config.processing),
        })
    }
}
