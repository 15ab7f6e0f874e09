//! Site orchestration: one full build, phase by phase.
//!
//! ```text
//! Reset → Scan → Index → Paginate → BuildMedia → BuildStatic
//!       → IndexMedia → RenderAll → WriteAll
//! ```
//!
//! Every build starts from empty collections. Scanning visits files before
//! sub-directories and then reverses the list, so descendants render before
//! their ancestors and a listing page sees its children's rendered content.
//!
//! Media and asset failures are logged and skipped; anything else aborts the
//! build.
//!
//! ## Template data
//!
//! Layouts see the site under `site`:
//!
//! ```text
//! site.<key>          every site_context value (plus `production`)
//! site.articles       tree of markdown pages: {"blog": {"list": [...]}, "all": [...]}
//! site.media          tree of media: same shape, items carry `images.<size>`
//! ```

use crate::assets;
use crate::config::Config;
use crate::imaging::{ImageBackend, RustBackend};
use crate::media::MediaResource;
use crate::page::{PageError, PageRef, PageResource};
use crate::pager::{self, PaginateError};
use crate::resource::{Resource, relative_source};
use crate::templates::Templates;
use crate::tree::ResourceTree;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to scan source tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Paginate(#[from] PaginateError),
}

/// Build phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Reset,
    Scan,
    Index,
    Paginate,
    BuildMedia,
    BuildStatic,
    IndexMedia,
    RenderAll,
    WriteAll,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Reset => "Reset",
            Phase::Scan => "Scan",
            Phase::Index => "Index",
            Phase::Paginate => "Paginate",
            Phase::BuildMedia => "Build media",
            Phase::BuildStatic => "Build static",
            Phase::IndexMedia => "Index media",
            Phase::RenderAll => "Render",
            Phase::WriteAll => "Write",
        };
        f.write_str(name)
    }
}

/// Progress reported while a build runs. Formatted by [`crate::output`].
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    PhaseStarted(Phase),
    Scanned {
        pages: usize,
        media: usize,
    },
    Paginated {
        rule: String,
        anchor: String,
        pages: usize,
    },
    MediaBuilt {
        source: String,
        created: usize,
        skipped: usize,
    },
    MediaFailed {
        source: String,
        error: String,
    },
    AssetsSynced {
        copied: usize,
        unchanged: usize,
        minified: usize,
        removed: usize,
        failed: usize,
    },
    PageWritten {
        source: String,
        destination: String,
    },
    PageSkipped {
        source: String,
    },
    Finished {
        written: usize,
        elapsed: Duration,
    },
}

/// Everything a build needs from its caller: the resolved configuration and
/// an optional channel for progress events.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub config: Config,
    pub events: Option<Sender<BuildEvent>>,
}

impl BuildContext {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            events: None,
        }
    }

    pub fn with_events(config: Config, events: Sender<BuildEvent>) -> Self {
        Self {
            config,
            events: Some(events),
        }
    }

    fn emit(&self, event: BuildEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub written: Vec<PathBuf>,
    pub skipped: usize,
    pub media_built: usize,
    pub media_failed: usize,
    pub assets_copied: usize,
    pub elapsed: Duration,
}

/// State of one build.
#[derive(Debug, Default)]
pub struct Site {
    phase: Option<Phase>,
    pages: Vec<PageResource>,
    articles: Option<ResourceTree<PageRef>>,
    media: Vec<MediaResource>,
    media_index: Option<ResourceTree<MediaResource>>,
}

/// Build the site described by `ctx` with the pure-Rust image backend.
pub fn build(ctx: &BuildContext) -> Result<BuildReport, SiteError> {
    Site::new().build(ctx, &RustBackend::new())
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every phase in order.
    pub fn build(
        &mut self,
        ctx: &BuildContext,
        backend: &dyn ImageBackend,
    ) -> Result<BuildReport, SiteError> {
        let started = Instant::now();
        let config = &ctx.config;
        let mut report = BuildReport::default();

        self.enter(ctx, Phase::Reset);
        self.reset(config)?;

        self.enter(ctx, Phase::Scan);
        self.scan(config)?;
        ctx.emit(BuildEvent::Scanned {
            pages: self.pages.len(),
            media: self.media.len(),
        });

        self.enter(ctx, Phase::Index);
        self.index_articles();

        self.enter(ctx, Phase::Paginate);
        self.paginate(ctx)?;

        self.enter(ctx, Phase::BuildMedia);
        let (built, failed) = self.build_media(ctx, backend);
        report.media_built = built;
        report.media_failed = failed;

        self.enter(ctx, Phase::BuildStatic);
        report.assets_copied = self.build_static(ctx);

        self.enter(ctx, Phase::IndexMedia);
        self.index_media();

        self.enter(ctx, Phase::RenderAll);
        self.render_all(config)?;

        self.enter(ctx, Phase::WriteAll);
        self.write_all(ctx, &mut report)?;

        report.elapsed = started.elapsed();
        ctx.emit(BuildEvent::Finished {
            written: report.written.len(),
            elapsed: report.elapsed,
        });
        Ok(report)
    }

    fn enter(&mut self, ctx: &BuildContext, phase: Phase) {
        tracing::debug!(%phase, "entering phase");
        self.phase = Some(phase);
        ctx.emit(BuildEvent::PhaseStarted(phase));
    }

    /// Last phase entered; `None` before the first build.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn pages(&self) -> &[PageResource] {
        &self.pages
    }

    pub fn media(&self) -> &[MediaResource] {
        &self.media
    }

    pub fn articles(&self) -> Option<&ResourceTree<PageRef>> {
        self.articles.as_ref()
    }

    pub fn media_index(&self) -> Option<&ResourceTree<MediaResource>> {
        self.media_index.as_ref()
    }

    /// The page whose id is `id`.
    pub fn find_resource(&self, id: &str) -> Option<&PageResource> {
        self.pages.iter().find(|p| p.id() == id)
    }

    fn reset(&mut self, config: &Config) -> Result<(), SiteError> {
        self.pages.clear();
        self.media.clear();
        self.articles = None;
        self.media_index = None;
        fs::create_dir_all(&config.build_dir).map_err(|source| SiteError::Io {
            path: config.build_dir.clone(),
            source,
        })
    }

    fn scan(&mut self, config: &Config) -> Result<(), SiteError> {
        let excluded: Vec<String> = [
            config
                .build_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            config.paths.layouts.clone(),
            config.paths.media.clone(),
        ]
        .into_iter()
        .filter(|n| !n.is_empty())
        .collect();

        let walker = WalkDir::new(&config.source_dir)
            .sort_by(|a, b| {
                (a.file_type().is_dir(), a.file_name()).cmp(&(b.file_type().is_dir(), b.file_name()))
            })
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_excluded(e, &excluded));

        let mut discovered = Vec::new();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_page_file(entry.path()) {
                continue;
            }
            let Some(source) = relative_source(&config.source_dir, entry.path()) else {
                continue;
            };
            tracing::debug!(%source, "found page");
            discovered.push(PageResource::new(config, &source)?);
        }
        discovered.reverse();
        self.pages = discovered;

        self.media = scan_media(config)?;
        Ok(())
    }

    fn index_articles(&mut self) {
        let mut refs: Vec<PageRef> = self
            .pages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_markdown())
            .map(|(i, p)| PageRef::new(i, p))
            .collect();
        refs.sort_by_key(|r| r.destination().len());
        self.articles = Some(ResourceTree::new(&refs));
    }

    fn paginate(&mut self, ctx: &BuildContext) -> Result<(), SiteError> {
        for (name, rule) in &ctx.config.pagination {
            let refs: Vec<PageRef> = self
                .pages
                .iter()
                .enumerate()
                .map(|(i, p)| PageRef::new(i, p))
                .collect();
            let Some(pagination) = pager::paginate(&refs, rule)? else {
                tracing::debug!(rule = %name, "pagination rule matched nothing");
                continue;
            };

            let anchor = refs[pagination.anchor].index;
            let anchor_source = self.pages[anchor].source().to_string();
            let total = pagination.pagers.len();

            let mut pagers = pagination.pagers.into_iter();
            if let Some(first) = pagers.next() {
                self.pages[anchor].set_pager(first);
            }
            for pager in pagers {
                let source = pager::paged_source(&anchor_source, &rule.url, pager.page);
                let copy = self.pages[anchor].paginated_copy(&source, pager);
                self.pages.push(copy);
            }

            ctx.emit(BuildEvent::Paginated {
                rule: name.clone(),
                anchor: anchor_source,
                pages: total,
            });
        }
        Ok(())
    }

    /// Returns `(built, failed)`; failed resources are dropped from the site.
    fn build_media(&mut self, ctx: &BuildContext, backend: &dyn ImageBackend) -> (usize, usize) {
        if ctx.config.media.is_empty() {
            return (0, 0);
        }
        let mut failed = 0;
        self.media.retain(|m| match m.build(&ctx.config, backend) {
            Ok(outcome) => {
                ctx.emit(BuildEvent::MediaBuilt {
                    source: m.source().to_string(),
                    created: outcome.created.len(),
                    skipped: outcome.skipped,
                });
                true
            }
            Err(e) => {
                tracing::warn!(source = m.source(), error = %e, "media build failed");
                ctx.emit(BuildEvent::MediaFailed {
                    source: m.source().to_string(),
                    error: e.to_string(),
                });
                failed += 1;
                false
            }
        });
        (self.media.len(), failed)
    }

    fn build_static(&self, ctx: &BuildContext) -> usize {
        let config = &ctx.config;
        let report = assets::sync(
            &config.assets_dir(),
            &config.build_assets_dir(),
            &config.compress,
        );
        for failure in &report.failures {
            tracing::warn!(error = %failure, "asset sync");
        }
        ctx.emit(BuildEvent::AssetsSynced {
            copied: report.copied.len(),
            unchanged: report.unchanged,
            minified: report.minified.len(),
            removed: report.removed.len(),
            failed: report.failures.len(),
        });
        report.copied.len()
    }

    fn index_media(&mut self) {
        let mut media = self.media.clone();
        media.sort_by_key(|m| std::cmp::Reverse(m.destination()));
        self.media_index = Some(ResourceTree::new(&media));
    }

    /// `site` template data from the pages' current state.
    fn site_value(&self, config: &Config) -> Value {
        let mut site = config.site_context.clone();
        if let Some(articles) = &self.articles {
            site.insert(
                "articles",
                articles.to_json(&|r: &PageRef| self.pages[r.index].summary()),
            );
        }
        if let Some(media) = &self.media_index {
            site.insert(
                "media",
                media.to_json(&|m: &MediaResource| m.summary(config)),
            );
        }
        site.into_value()
    }

    /// Render every page in site order. The `site` value is built once; after
    /// each render only the rendered page's entries under `articles` are
    /// replaced, so later pages see earlier pages' content.
    fn render_all(&mut self, config: &Config) -> Result<(), SiteError> {
        let templates = Templates::load(&config.layouts_dir());
        let mut site = self.site_value(config);

        let mut slots: HashMap<usize, Vec<String>> = HashMap::new();
        if let Some(articles) = &self.articles {
            for (pointer, r) in articles.pointers() {
                slots
                    .entry(r.index)
                    .or_default()
                    .push(format!("/articles{pointer}"));
            }
        }

        for i in 0..self.pages.len() {
            let pager = self.pages[i]
                .pager()
                .map(|p| p.to_json(&|r: &PageRef| self.pages[r.index].summary()));
            tracing::debug!(source = self.pages[i].source(), "rendering");
            self.pages[i].render(&templates, &site, pager)?;

            if let Some(pointers) = slots.get(&i) {
                let summary = self.pages[i].summary();
                for pointer in pointers {
                    if let Some(slot) = site.pointer_mut(pointer) {
                        *slot = summary.clone();
                    }
                }
            }
        }
        Ok(())
    }

    fn write_all(&self, ctx: &BuildContext, report: &mut BuildReport) -> Result<(), SiteError> {
        let mut seen = HashSet::new();
        for page in &self.pages {
            if !page.should_build() {
                report.skipped += 1;
                ctx.emit(BuildEvent::PageSkipped {
                    source: page.source().to_string(),
                });
                continue;
            }
            let destination = page.destination();
            if !seen.insert(destination.clone()) {
                tracing::warn!(
                    %destination,
                    source = page.source(),
                    "destination written twice, last write wins"
                );
            }
            let path = page.build(&ctx.config.build_dir)?;
            ctx.emit(BuildEvent::PageWritten {
                source: page.source().to_string(),
                destination,
            });
            report.written.push(path);
        }
        Ok(())
    }
}

fn is_excluded(entry: &DirEntry, excluded_dirs: &[String]) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') || name.starts_with('_') {
        return true;
    }
    entry.file_type().is_dir() && excluded_dirs.iter().any(|d| *d == name)
}

fn is_page_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("html")
    )
}

fn scan_media(config: &Config) -> Result<Vec<MediaResource>, SiteError> {
    let root = config.media_dir();
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut media = Vec::new();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(source) = relative_source(&config.source_dir, entry.path()) {
            tracing::debug!(%source, "found media");
            media.push(MediaResource::new(&source));
        }
    }
    Ok(media)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{fixture_config, setup_fixtures, write};
    use pretty_assertions::assert_eq;
    use std::sync::mpsc;

    fn run(config: Config) -> (Site, BuildReport) {
        let mut site = Site::new();
        let report = site
            .build(&BuildContext::new(config), &MockBackend::new())
            .unwrap();
        (site, report)
    }

    fn sources(site: &Site) -> Vec<&str> {
        site.pages().iter().map(|p| p.source()).collect()
    }

    #[test]
    fn scan_orders_descendants_first() {
        let tmp = setup_fixtures();
        let (site, _) = run(fixture_config(tmp.path()));
        let order = sources(&site);

        let pos = |s: &str| order.iter().position(|p| *p == s).unwrap();
        assert!(pos("/pages/blog/2012-01-10-hello.md") < pos("/pages/index.md"));
        assert!(pos("/pages/blog/index.md") < pos("/pages/index.md"));
        // Reverse name order within a directory.
        assert!(pos("/pages/blog/index.md") < pos("/pages/blog/2012-03-02-third.md"));
    }

    #[test]
    fn scan_skips_underscore_and_dot_paths() {
        let tmp = setup_fixtures();
        write(&tmp.path().join("pages/_drafts/secret.md"), "hidden");
        write(&tmp.path().join("pages/.hidden.md"), "hidden");
        write(&tmp.path().join("pages/notes.txt"), "not a page");
        let (site, _) = run(fixture_config(tmp.path()));

        assert!(sources(&site).iter().all(|s| !s.contains("_drafts")));
        assert!(sources(&site).iter().all(|s| !s.contains(".hidden")));
        assert!(sources(&site).iter().all(|s| !s.ends_with(".txt")));
        assert!(sources(&site).iter().all(|s| !s.starts_with("/layouts")));
    }

    #[test]
    fn scan_skips_build_dir_on_rebuild() {
        let tmp = setup_fixtures();
        let mut config = fixture_config(tmp.path());
        config.build_dir = tmp.path().join("public");

        let (_, first) = run(config.clone());
        assert!(tmp.path().join("public/index.html").is_file());
        let (site, second) = run(config);

        assert_eq!(second.written.len(), first.written.len());
        assert!(sources(&site).iter().all(|s| !s.starts_with("/public")));
    }

    #[test]
    fn scan_skips_media_dir() {
        let tmp = setup_fixtures();
        write(&tmp.path().join("media/gallery/embed.html"), "<p>not a page</p>");
        write(&tmp.path().join("media/notes.md"), "# not a page");
        let (site, _) = run(fixture_config(tmp.path()));

        assert!(sources(&site).iter().all(|s| !s.starts_with("/media")));
        assert!(!tmp.path().join("_out/gallery/embed.html").exists());
    }

    #[test]
    fn pagination_appends_copies() {
        let tmp = setup_fixtures();
        let config = fixture_config(tmp.path());
        let mut without = config.clone();
        without.pagination.clear();
        let (plain, _) = run(without);
        let (site, _) = run(config);

        // 4 blog pages, 3 per page: one extra page.
        assert_eq!(site.pages().len(), plain.pages().len() + 1);
        let extra = site.pages().last().unwrap();
        assert_eq!(extra.destination(), "/blog/page-2/index.html");
        assert_eq!(extra.pager().unwrap().page, 2);

        let anchor = site
            .pages()
            .iter()
            .find(|p| p.source() == "/pages/blog/index.md")
            .unwrap();
        assert_eq!(anchor.pager().unwrap().page, 1);
    }

    #[test]
    fn writes_pages_and_skips_unbuilt() {
        let tmp = setup_fixtures();
        let config = fixture_config(tmp.path());
        let out = config.build_dir.clone();
        let (_, report) = run(config);

        assert!(out.join("index.html").is_file());
        assert!(out.join("about.html").is_file());
        assert!(out.join("blog/page-2/index.html").is_file());
        assert!(!out.join("draft.html").exists());
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn listing_pages_show_their_slice() {
        let tmp = setup_fixtures();
        let config = fixture_config(tmp.path());
        let out = config.build_dir.clone();
        run(config);

        let blog = fs::read_to_string(out.join("blog/index.html")).unwrap();
        assert!(blog.contains("Third post"));
        assert!(blog.contains("Second post"));
        assert!(!blog.contains("Hello, world"));
        assert!(blog.contains("href=\"/blog/page-2\""));

        let page2 = fs::read_to_string(out.join("blog/page-2/index.html")).unwrap();
        assert!(page2.contains("Hello, world"));
        assert!(page2.contains("href=\"/blog/\""));
    }

    #[test]
    fn ancestors_see_rendered_descendants() {
        let tmp = setup_fixtures();
        let config = fixture_config(tmp.path());
        let out = config.build_dir.clone();
        run(config);

        // The home page embeds each post's rendered body.
        let home = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(home.contains("harbour"));
    }

    #[test]
    fn flat_article_list_carries_rendered_content() {
        let tmp = setup_fixtures();
        // Sorts before index.md, so it renders after it and after the posts.
        write(
            &tmp.path().join("pages/aaa.md"),
            "{{#each site.articles.all}}{{#if content}}[{{source}}]{{/if}}{{/each}}\n",
        );
        let config = fixture_config(tmp.path());
        let out = config.build_dir.clone();
        run(config);

        let page = fs::read_to_string(out.join("aaa.html")).unwrap();
        assert!(page.contains("[/pages/blog/2012-01-10-hello.md]"));
        assert!(page.contains("[/pages/index.md]"));
        assert!(!page.contains("[/pages/about.html]"));
    }

    #[test]
    fn failed_media_is_pruned() {
        let tmp = setup_fixtures();
        write(&tmp.path().join("media/cats/tabby.jpg"), "pixels");
        write(&tmp.path().join("media/cats/broken.jpg"), "junk");
        let config = fixture_config(tmp.path());

        let mut site = Site::new();
        let report = site
            .build(
                &BuildContext::new(config),
                &MockBackend::failing_on(&["broken.jpg"]),
            )
            .unwrap();

        assert_eq!(report.media_built, 1);
        assert_eq!(report.media_failed, 1);
        assert_eq!(site.media().len(), 1);
        let index = site.media_index().unwrap();
        assert_eq!(index.all().len(), 1);
        assert_eq!(index.all()[0].source(), "/media/cats/tabby.jpg");
    }

    #[test]
    fn find_resource_by_id() {
        let tmp = setup_fixtures();
        let (site, _) = run(fixture_config(tmp.path()));
        let index = &site.pages()[0];
        assert_eq!(
            site.find_resource(index.id()).map(|p| p.source()),
            Some(index.source())
        );
        assert!(site.find_resource("nope").is_none());
    }

    #[test]
    fn rebuild_starts_from_empty() {
        let tmp = setup_fixtures();
        let ctx = BuildContext::new(fixture_config(tmp.path()));
        let mut site = Site::new();
        site.build(&ctx, &MockBackend::new()).unwrap();
        let first = site.pages().len();
        site.build(&ctx, &MockBackend::new()).unwrap();
        assert_eq!(site.pages().len(), first);
        assert_eq!(site.phase(), Some(Phase::WriteAll));
    }

    #[test]
    fn events_follow_phase_order() {
        let tmp = setup_fixtures();
        let (tx, rx) = mpsc::channel();
        let ctx = BuildContext::with_events(fixture_config(tmp.path()), tx);
        Site::new().build(&ctx, &MockBackend::new()).unwrap();
        drop(ctx);

        let phases: Vec<Phase> = rx
            .iter()
            .filter_map(|e| match e {
                BuildEvent::PhaseStarted(p) => Some(p),
                _ => None,
            })
            .collect();
        let mut sorted = phases.clone();
        sorted.sort();
        assert_eq!(phases, sorted);
        assert_eq!(phases.len(), 9);
    }

    #[test]
    fn missing_layout_aborts_build() {
        let tmp = setup_fixtures();
        fs::remove_file(tmp.path().join("layouts/default.html")).unwrap();
        let mut site = Site::new();
        let result = site.build(
            &BuildContext::new(fixture_config(tmp.path())),
            &MockBackend::new(),
        );
        assert!(matches!(result, Err(SiteError::Page(_))));
    }
}
