//! Page resources: content files rendered through layouts.
//!
//! A page is a `.md` or `.html` file under the pages directory. Rendering has
//! two stages:
//!
//! 1. **Content**: the body (or the `page_layout` file, when set) is rendered
//!    as a template with the page context and `site`, then converted from
//!    markdown and prettified. The result is kept as `rendered_content`.
//! 2. **Page**: the `layout` file (default `default.html`) is rendered with
//!    the page context plus `content` at the root, and `page`/`site`
//!    namespaces. The result is what [`PageResource::build`] writes.
//!
//! Front matter keys with meaning here: `layout`, `page_layout`, `title`,
//! `build`. Everything else is passed through to templates.

use crate::config::Config;
use crate::context::Context;
use crate::loader::{self, LoadError, Loaded};
use crate::markup;
use crate::pager::Pager;
use crate::resource::{Resource, strip_first_segment, with_extension};
use crate::templates::{TemplateError, Templates};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_LAYOUT: &str = "default.html";

#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Page {page} was built before being rendered")]
    NotRendered { page: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResource {
    source: String,
    id: String,
    context: Context,
    body: String,
    layout_path: String,
    page_layout_path: Option<String>,
    pager: Option<Pager<PageRef>>,
    rendered_content: Option<String>,
    rendered_page: Option<String>,
}

/// Destination of a page source: first segment dropped, extension `.html`.
pub fn page_destination(source: &str) -> String {
    with_extension(strip_first_segment(source), ".html")
}

/// Stable identifier: hex SHA-256 of the source path.
pub fn page_id(source: &str) -> String {
    format!("{:x}", Sha256::digest(source.as_bytes()))
}

impl PageResource {
    /// Load `source` (relative to the configured source directory).
    pub fn new(config: &Config, source: &str) -> Result<Self, PageError> {
        Self::with_context(config, source, Context::new())
    }

    /// Load `source` with a base context; front matter wins on conflicts.
    pub fn with_context(config: &Config, source: &str, context: Context) -> Result<Self, PageError> {
        let loaded = loader::load(&config.source_dir, source)?;
        Ok(Self::from_loaded(source, context, loaded))
    }

    pub fn from_loaded(source: &str, mut context: Context, loaded: Loaded) -> Self {
        context.merge(&loaded.context);
        let layout_path = match context.get_str("layout", "") {
            s if s.is_empty() => DEFAULT_LAYOUT.to_string(),
            s => s,
        };
        let page_layout_path = Some(context.get_str("page_layout", "")).filter(|s| !s.is_empty());

        Self {
            source: source.to_string(),
            id: page_id(source),
            context,
            body: loaded.content,
            layout_path,
            page_layout_path,
            pager: None,
            rendered_content: None,
            rendered_page: None,
        }
    }

    /// Page `N` of a paginated anchor: same content and context under a new
    /// source path, carrying its own pager.
    pub fn paginated_copy(&self, source: &str, pager: Pager<PageRef>) -> Self {
        Self {
            source: source.to_string(),
            id: page_id(source),
            pager: Some(pager),
            rendered_content: None,
            rendered_page: None,
            ..self.clone()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Context lookup; missing keys yield `default`.
    pub fn get(&self, key: &str, default: &str) -> String {
        self.context.get_str(key, default)
    }

    pub fn title(&self) -> String {
        self.get("title", "")
    }

    pub fn is_markdown(&self) -> bool {
        self.source.ends_with(".md")
    }

    /// Front matter `build: false` keeps the page out of the build directory.
    pub fn should_build(&self) -> bool {
        self.context.get_bool("build", true)
    }

    pub fn layout_path(&self) -> &str {
        &self.layout_path
    }

    pub fn page_layout_path(&self) -> Option<&str> {
        self.page_layout_path.as_deref()
    }

    /// Absolute path of the page layout.
    pub fn layout(&self, config: &Config) -> PathBuf {
        config.layouts_dir().join(&self.layout_path)
    }

    /// Absolute path of the content layout, if any.
    pub fn page_layout(&self, config: &Config) -> Option<PathBuf> {
        self.page_layout_path
            .as_ref()
            .map(|p| config.layouts_dir().join(p))
    }

    pub fn pager(&self) -> Option<&Pager<PageRef>> {
        self.pager.as_ref()
    }

    pub fn set_pager(&mut self, pager: Pager<PageRef>) {
        self.pager = Some(pager);
    }

    pub fn rendered_content(&self) -> Option<&str> {
        self.rendered_content.as_deref()
    }

    pub fn rendered_page(&self) -> Option<&str> {
        self.rendered_page.as_deref()
    }

    /// Run both render stages. `pager` is this page's pager as template data
    /// and is stored in the context under `pager`.
    pub fn render(
        &mut self,
        templates: &Templates,
        site: &Value,
        pager: Option<Value>,
    ) -> Result<(), PageError> {
        if let Some(pager) = pager {
            self.context.insert("pager", pager);
        }

        let mut data = self.context.clone();
        data.insert("site", site.clone());
        let data = data.into_value();

        let part = match &self.page_layout_path {
            Some(layout) => templates.render_layout(layout, &data)?,
            None => templates.render_str(&self.source, &self.body, &data)?,
        };
        let content = markup::render_markdown(&part);

        let mut page_context = Context::new();
        page_context.insert("content", content.clone());
        page_context.merge(&self.context);

        let mut data = page_context.clone();
        data.insert("page", page_context.into_value());
        data.insert("site", site.clone());
        let page = templates.render_layout(&self.layout_path, &data.into_value())?;

        self.rendered_content = Some(content);
        self.rendered_page = Some(page);
        Ok(())
    }

    /// Write the rendered page to `build_dir` + destination.
    pub fn build(&self, build_dir: &Path) -> Result<PathBuf, PageError> {
        let page = self
            .rendered_page
            .as_ref()
            .ok_or_else(|| PageError::NotRendered {
                page: self.source.clone(),
            })?;
        let path = build_dir.join(self.destination().trim_start_matches('/'));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PageError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, page).map_err(|source| PageError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// What templates see when this page appears in `articles` or a pager.
    pub fn summary(&self) -> Value {
        let mut data = self.context.clone();
        data.remove("pager");
        data.insert("id", self.id.clone());
        data.insert("source", self.source.clone());
        data.insert("destination", self.destination());
        data.insert("url", self.url());
        data.insert("title", self.title());
        data.insert("belongs_to", self.belongs_to());
        data.insert(
            "content",
            self.rendered_content.clone().unwrap_or_default(),
        );
        data.into_value()
    }
}

impl Resource for PageResource {
    fn source(&self) -> &str {
        &self.source
    }

    fn destination(&self) -> String {
        page_destination(&self.source)
    }
}

/// Handle to a page held by the site, used in trees and pagers so template
/// data can be rebuilt from the page's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub index: usize,
    pub source: String,
}

impl PageRef {
    pub fn new(index: usize, page: &PageResource) -> Self {
        Self {
            index,
            source: page.source.clone(),
        }
    }
}

impl Resource for PageRef {
    fn source(&self) -> &str {
        &self.source
    }

    fn destination(&self) -> String {
        page_destination(&self.source)
    }
}
