//! Layout rendering.
//!
//! Layouts are Handlebars templates read from the layouts directory at render
//! time, so edits show up on the next rebuild without restarting anything.
//! Every file in that directory is also registered as a partial under its
//! relative path minus the extension:
//!
//! ```text
//! layouts/default.html        {{> default}}
//! layouts/parts/nav.html      {{> parts/nav}}
//! ```
//!
//! Interpolations are not HTML-escaped (`{{content}}` inserts rendered
//! markdown as-is) and missing keys render as empty strings.

use handlebars::{Handlebars, no_escape};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("IO error reading template {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid partial {name}: {message}")]
    Partial { name: String, message: String },
    #[error("Failed to render {name}: {message}")]
    Render { name: String, message: String },
}

pub struct Templates {
    engine: Handlebars<'static>,
    layouts_dir: PathBuf,
}

impl Templates {
    /// Engine with every file under `layouts_dir` registered as a partial.
    /// A missing layouts directory simply means no partials. Dotfiles are
    /// ignored; files that cannot be read or parsed are skipped with a
    /// warning, since a layout a page names is read again at render time.
    pub fn load(layouts_dir: &Path) -> Self {
        let mut templates = Self::empty(layouts_dir);
        if !layouts_dir.is_dir() {
            return templates;
        }

        for entry in WalkDir::new(layouts_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let Some(name) = partial_name(layouts_dir, path) else {
                continue;
            };
            if let Err(e) = templates.register_partial(&name, path) {
                tracing::warn!("skipping partial: {e}");
                continue;
            }
            tracing::debug!(partial = %name, "registered partial");
        }
        templates
    }

    fn register_partial(&mut self, name: &str, path: &Path) -> Result<(), TemplateError> {
        let text = fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.engine
            .register_partial(name, text)
            .map_err(|e| TemplateError::Partial {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Engine without partials.
    pub fn empty(layouts_dir: &Path) -> Self {
        let mut engine = Handlebars::new();
        engine.register_escape_fn(no_escape);
        engine.set_strict_mode(false);
        Self {
            engine,
            layouts_dir: layouts_dir.to_path_buf(),
        }
    }

    pub fn layouts_dir(&self) -> &Path {
        &self.layouts_dir
    }

    /// Render template text directly.
    pub fn render_str(&self, name: &str, text: &str, data: &Value) -> Result<String, TemplateError> {
        self.engine
            .render_template(text, data)
            .map_err(|e| TemplateError::Render {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Render the layout file `layouts_dir/layout`.
    pub fn render_layout(&self, layout: &str, data: &Value) -> Result<String, TemplateError> {
        let path = self.layouts_dir.join(layout.trim_start_matches('/'));
        let text = fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;
        self.render_str(layout, &text, data)
    }
}

/// `parts/nav.html` → `parts/nav`, always `/`-separated.
fn partial_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
