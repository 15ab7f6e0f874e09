//! Site configuration.
//!
//! Loaded from a single YAML document (default `config.yaml` in the working
//! directory). Every key is optional; a missing file means stock defaults.
//!
//! ## Configuration Options
//!
//! ```yaml
//! source_dir: .            # Where assets/, layouts/, media/, pages/ live
//! build_dir: _out          # Output directory
//! production: false        # Injected into site_context as `production`
//!
//! site_context:            # Extra values available to every template as `site.*`
//!   name: My Site
//!
//! media:                   # Thumbnail sizes, one file per size per image
//!   small:
//!     width: 200
//!     height: 200
//!   large:
//!     width: 1024          # A bound may be omitted (unbounded)
//!
//! compress: false          # true, or a list of file-name globs: ["*.css", "*.js"]
//!
//! pagination:              # Rule name → rule
//!   blog:
//!     pattern: "/blog/*"   # Glob matched against page destinations
//!     per_page: 10
//!     url: "page-{0}"      # Segment for pages > 1; {0} is the page number
//!
//! paths:                   # Conventional directory names under source_dir
//!   assets: assets
//!   layouts: layouts
//!   media: media
//!   pages: pages
//! ```
//!
//! Unknown top-level keys are rejected to catch typos early. Relative
//! `source_dir` and `build_dir` values resolve against the working directory
//! the caller hands to [`Config::resolve`].

use crate::context::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// File names `compress: true` expands to.
pub const DEFAULT_COMPRESS_PATTERNS: &[&str] = &["*.css", "*.js"];

/// The configuration document as written on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Values exposed to templates under `site`.
    pub site_context: Context,
    /// Thumbnail size name → bounding box.
    pub media: BTreeMap<String, MediaSize>,
    pub compress: Compress,
    pub source_dir: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    pub production: bool,
    pub pagination: BTreeMap<String, PaginationRule>,
    pub paths: PathsConfig,
}

/// Bounding box for one thumbnail size. `None` means unbounded on that axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaSize {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// `compress: true|false` or `compress: [globs...]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Compress {
    Toggle(bool),
    Patterns(Vec<String>),
}

impl Default for Compress {
    fn default() -> Self {
        Compress::Toggle(false)
    }
}

impl Compress {
    /// File-name globs to minify; empty when compression is off.
    pub fn patterns(&self) -> Vec<String> {
        match self {
            Compress::Toggle(false) => Vec::new(),
            Compress::Toggle(true) => DEFAULT_COMPRESS_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            Compress::Patterns(p) => p.clone(),
        }
    }
}

/// A pagination rule: which pages to split and how to name the extra pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationRule {
    /// Glob matched against page destinations; `*` also matches `/`.
    pub pattern: String,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
    /// URL segment for pages after the first; `{0}` is the page number.
    #[serde(default = "default_page_url")]
    pub url: String,
}

fn default_per_page() -> usize {
    20
}

fn default_page_url() -> String {
    "page-{0}".to_string()
}

impl PaginationRule {
    pub fn new(pattern: &str, per_page: usize) -> Self {
        Self {
            pattern: pattern.to_string(),
            per_page,
            url: default_page_url(),
        }
    }
}

/// Conventional directory names under the source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub assets: String,
    pub layouts: String,
    pub media: String,
    pub pages: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            assets: "assets".to_string(),
            layouts: "layouts".to_string(),
            media: "media".to_string(),
            pages: "pages".to_string(),
        }
    }
}

impl PathsConfig {
    /// All conventional directory names, in a stable order.
    pub fn all(&self) -> [&str; 4] {
        [&self.assets, &self.layouts, &self.media, &self.pages]
    }
}

/// Command-line overrides applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub no_compress: bool,
}

/// Fully resolved configuration used by the build.
#[derive(Debug, Clone)]
pub struct Config {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    /// Site values with `production` injected.
    pub site_context: Context,
    pub media: BTreeMap<String, MediaSize>,
    /// Minifier globs; empty disables compression.
    pub compress: Vec<String>,
    pub pagination: BTreeMap<String, PaginationRule>,
    pub paths: PathsConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, rule) in &self.pagination {
            if rule.per_page == 0 {
                return Err(ConfigError::Validation(format!(
                    "pagination.{name}.per_page must be at least 1"
                )));
            }
            if rule.pattern.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "pagination.{name}.pattern must not be empty"
                )));
            }
            if let Err(e) = glob::Pattern::new(&rule.pattern) {
                return Err(ConfigError::Validation(format!(
                    "pagination.{name}.pattern is not a valid glob: {e}"
                )));
            }
        }
        for (name, size) in &self.media {
            if size.width == Some(0) || size.height == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "media.{name} dimensions must be non-zero"
                )));
            }
        }
        for pattern in self.compress.patterns() {
            if let Err(e) = glob::Pattern::new(&pattern) {
                return Err(ConfigError::Validation(format!(
                    "compress pattern {pattern:?} is not a valid glob: {e}"
                )));
            }
        }
        if self.paths.all().iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "paths entries must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Apply overrides and resolve directories against `cwd`.
    pub fn resolve(
        site: SiteConfig,
        overrides: &Overrides,
        cwd: &Path,
    ) -> Result<Self, ConfigError> {
        site.validate()?;

        let source_dir = site
            .source_dir
            .map(|p| absolutize(&p, cwd))
            .unwrap_or_else(|| cwd.to_path_buf());
        let build_dir = site
            .build_dir
            .map(|p| absolutize(&p, cwd))
            .unwrap_or_else(|| cwd.join("_out"));

        let compress = if overrides.no_compress {
            Vec::new()
        } else {
            site.compress.patterns()
        };

        let mut site_context = site.site_context;
        site_context.insert("production", site.production);

        Ok(Self {
            source_dir,
            build_dir,
            site_context,
            media: site.media,
            compress,
            pagination: site.pagination,
            paths: site.paths,
        })
    }

    /// Defaults rooted at `cwd`, as if no config file existed.
    pub fn with_defaults(cwd: &Path) -> Self {
        let mut site_context = Context::new();
        site_context.insert("production", false);
        Self {
            source_dir: cwd.to_path_buf(),
            build_dir: cwd.join("_out"),
            site_context,
            media: BTreeMap::new(),
            compress: Vec::new(),
            pagination: BTreeMap::new(),
            paths: PathsConfig::default(),
        }
    }

    pub fn layouts_dir(&self) -> PathBuf {
        self.source_dir.join(&self.paths.layouts)
    }

    pub fn media_dir(&self) -> PathBuf {
        self.source_dir.join(&self.paths.media)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.source_dir.join(&self.paths.assets)
    }

    pub fn build_assets_dir(&self) -> PathBuf {
        self.build_dir.join(&self.paths.assets)
    }

    /// Directories the change monitor watches.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        self.paths
            .all()
            .iter()
            .map(|p| self.source_dir.join(p))
            .collect()
    }
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Parse a configuration document.
pub fn parse_config(text: &str) -> Result<SiteConfig, ConfigError> {
    if text.trim().is_empty() {
        return Ok(SiteConfig::default());
    }
    Ok(serde_yaml::from_str(text)?)
}

/// Load the config file at `path` (defaults if it does not exist) and
/// resolve it.
pub fn load_config(path: &Path, overrides: &Overrides, cwd: &Path) -> Result<Config, ConfigError> {
    let path = absolutize(path, cwd);
    let site = if path.exists() {
        parse_config(&fs::read_to_string(&path)?)?
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        SiteConfig::default()
    };
    Config::resolve(site, overrides, cwd)
}

/// A documented config file with every option at its default.
pub fn stock_config_yaml() -> &'static str {
    r#"# bakehouse configuration
# All options are optional. Unknown keys cause an error.

# Source tree root (assets/, layouts/, media/, pages/). Default: current directory.
# source_dir: .

# Output directory. Default: ./_out
# build_dir: _out

# Exposed to templates as site.production.
production: false

# Extra values available to every template under `site`.
site_context: {}

# Thumbnail sizes. Each image under media/ gets one file per size,
# named <image>-<size>.<ext>. Omit width or height to leave it unbounded.
media: {}
#  small:
#    width: 200
#    height: 200

# Minify copied assets: false, true (*.css and *.js) or a list of globs.
compress: false

# Pagination rules. The first page matching `pattern` is split into pages
# of `per_page` items; later pages live under `url` (with {0} replaced by
# the page number) next to the first.
pagination: {}
#  blog:
#    pattern: "/blog/*"
#    per_page: 10
#    url: "page-{0}"

paths:
  assets: assets
  layouts: layouts
  media: media
  pages: pages
"#
}
