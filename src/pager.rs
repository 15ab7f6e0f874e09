//! Pagination over an ordered set of resources.
//!
//! A [`PaginationRule`] selects resources by destination glob. The first
//! selected resource in site order becomes the *anchor*: page 1 is the anchor
//! itself, pages 2..N are copies of it placed under the rule's URL segment:
//!
//! ```text
//! anchor source     /pages/blog/index.md        → /blog/index.html
//! page 2 source     /pages/blog/page-2/index.md → /blog/page-2/index.html
//! ```
//!
//! Each page carries a [`Pager`] describing its slice and its neighbours.

use crate::config::PaginationRule;
use crate::resource::{Resource, dirname, split};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaginateError {
    #[error("Invalid pagination pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },
    #[error("Pagination rule {pattern:?} has per_page 0")]
    ZeroPerPage { pattern: String },
}

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Pager<T> {
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
    /// URL segment template, e.g. `page-{0}`.
    pub url: String,
    items: Vec<T>,
}

impl<T: Resource + Clone> Pager<T> {
    pub fn new(page: usize, items: Vec<T>, per_page: usize, url: &str) -> Self {
        Self {
            page,
            per_page,
            url: url.to_string(),
            items,
        }
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.items.len(), self.per_page)
    }

    pub fn total_resources(&self) -> usize {
        self.items.len()
    }

    fn bounds(&self) -> (usize, usize) {
        let len = self.items.len();
        let total = self.total_pages();
        let start = if total > 0 {
            self.per_page * self.page.saturating_sub(1)
        } else {
            0
        };
        let stop = if self.page == total {
            len
        } else {
            self.page * self.per_page
        };
        (start.min(len), stop.min(len))
    }

    /// The resources on this page.
    pub fn resources(&self) -> &[T] {
        let (start, stop) = self.bounds();
        &self.items[start..stop.max(start)]
    }

    pub fn previous_page(&self) -> Option<usize> {
        if self.page <= 1 { None } else { Some(self.page - 1) }
    }

    pub fn next_page(&self) -> Option<usize> {
        if self.page >= self.total_pages() {
            None
        } else {
            Some(self.page + 1)
        }
    }

    /// Directory of the first resource's destination, with a trailing `/`.
    pub fn belongs_to(&self) -> String {
        let mut base = self
            .items
            .first()
            .map(|r| dirname(&r.destination()).to_string())
            .unwrap_or_default();
        if !base.ends_with('/') {
            base.push('/');
        }
        base
    }

    /// URL path of `page`: the base directory for page 1, the base plus the
    /// formatted segment otherwise.
    pub fn path(&self, page: Option<usize>) -> Option<String> {
        match page {
            None | Some(0) => None,
            Some(1) => Some(self.belongs_to()),
            Some(n) => Some(format!("{}{}", self.belongs_to(), format_url(&self.url, n))),
        }
    }

    pub fn previous_path(&self) -> Option<String> {
        self.path(self.previous_page())
    }

    pub fn next_path(&self) -> Option<String> {
        self.path(self.next_page())
    }

    /// Template data; `render` turns each resource on the page into a value.
    pub fn to_json(&self, render: &impl Fn(&T) -> Value) -> Value {
        json!({
            "page": self.page,
            "per_page": self.per_page,
            "total_pages": self.total_pages(),
            "total_resources": self.total_resources(),
            "resources": self.resources().iter().map(render).collect::<Vec<_>>(),
            "previous_page": self.previous_page(),
            "next_page": self.next_page(),
            "previous_page_path": self.previous_path(),
            "next_page_path": self.next_path(),
            "belongs_to": self.belongs_to(),
        })
    }
}

/// `ceil(len / per_page)`; zero for an empty collection.
pub fn total_pages(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    len.div_ceil(per_page)
}

/// Substitute the page number for `{0}` (or `{}`) in a URL template.
pub fn format_url(url: &str, page: usize) -> String {
    let n = page.to_string();
    url.replace("{0}", &n).replace("{}", &n)
}

/// Source path of page `page` of an anchor: the formatted URL segment is
/// inserted between the anchor's directory and its file name.
pub fn paged_source(anchor_source: &str, url: &str, page: usize) -> String {
    let (head, tail) = split(anchor_source);
    format!(
        "{}/{}/{}",
        head.trim_end_matches('/'),
        format_url(url, page),
        tail
    )
}

/// Result of applying one rule to the site's resources.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination<T> {
    /// Index of the anchor in the resource slice that was paginated.
    pub anchor: usize,
    /// One pager per page, page 1 first.
    pub pagers: Vec<Pager<T>>,
}

/// Select resources matching `rule` and build one pager per page.
///
/// Returns `None` when nothing matches. `*` in the pattern also matches `/`.
pub fn paginate<T: Resource + Clone>(
    resources: &[T],
    rule: &PaginationRule,
) -> Result<Option<Pagination<T>>, PaginateError> {
    if rule.per_page == 0 {
        return Err(PaginateError::ZeroPerPage {
            pattern: rule.pattern.clone(),
        });
    }
    let pattern = glob::Pattern::new(&rule.pattern).map_err(|e| PaginateError::Pattern {
        pattern: rule.pattern.clone(),
        message: e.to_string(),
    })?;

    let mut anchor = None;
    let mut matched = Vec::new();
    for (i, resource) in resources.iter().enumerate() {
        if pattern.matches(&resource.destination()) {
            anchor.get_or_insert(i);
            matched.push(resource.clone());
        }
    }
    let Some(anchor) = anchor else {
        return Ok(None);
    };

    let pages = total_pages(matched.len(), rule.per_page);
    let pagers = (1..=pages)
        .map(|page| Pager::new(page, matched.clone(), rule.per_page, &rule.url))
        .collect();
    Ok(Some(Pagination { anchor, pagers }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::tests::Plain;
    use pretty_assertions::assert_eq;

    fn posts(n: usize) -> Vec<Plain> {
        (0..n)
            .map(|i| Plain(format!("/pages/blog/post-{i:02}.md")))
            .collect()
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(20, 10), 2);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(0, 10), 0);
    }

    #[test]
    fn slices_cover_collection() {
        let items = posts(25);
        let pagers: Vec<_> = (1..=3).map(|p| Pager::new(p, items.clone(), 10, "page-{0}")).collect();

        assert_eq!(pagers[0].resources().len(), 10);
        assert_eq!(pagers[1].resources().len(), 10);
        assert_eq!(pagers[2].resources().len(), 5);
        assert_eq!(pagers[1].resources()[0], items[10]);
        assert_eq!(pagers[1].resources()[9], items[19]);

        let joined: Vec<Plain> = pagers.iter().flat_map(|p| p.resources().to_vec()).collect();
        assert_eq!(joined, items);
    }

    #[test]
    fn neighbours_and_paths() {
        let items = posts(25);
        let first = Pager::new(1, items.clone(), 10, "page-{0}");
        let middle = Pager::new(2, items.clone(), 10, "page-{0}");
        let last = Pager::new(3, items, 10, "page-{0}");

        assert_eq!(first.previous_page(), None);
        assert_eq!(first.previous_path(), None);
        assert_eq!(first.next_path(), Some("/blog/page-2".to_string()));

        assert_eq!(middle.previous_path(), Some("/blog/".to_string()));
        assert_eq!(middle.next_page(), Some(3));

        assert_eq!(last.next_page(), None);
        assert_eq!(last.next_path(), None);
    }

    #[test]
    fn belongs_to_gets_trailing_slash() {
        let root = Pager::new(1, vec![Plain("/pages/a.md".into())], 10, "page-{0}");
        assert_eq!(root.belongs_to(), "/");
        let nested = Pager::new(1, posts(1), 10, "page-{0}");
        assert_eq!(nested.belongs_to(), "/blog/");
    }

    #[test]
    fn url_formatting() {
        assert_eq!(format_url("page-{0}", 2), "page-2");
        assert_eq!(format_url("p{}", 3), "p3");
        assert_eq!(format_url("fixed", 3), "fixed");
    }

    #[test]
    fn paged_source_inserts_segment() {
        assert_eq!(
            paged_source("/pages/blog/index.md", "page-{0}", 2),
            "/pages/blog/page-2/index.md"
        );
        assert_eq!(paged_source("/index.md", "page-{0}", 3), "/page-3/index.md");
    }

    #[test]
    fn paginate_picks_first_match_as_anchor() {
        let mut items = vec![Plain("/pages/about.md".into())];
        items.extend(posts(25));
        let rule = PaginationRule::new("/blog/*", 10);

        let result = paginate(&items, &rule).unwrap().unwrap();
        assert_eq!(result.anchor, 1);
        assert_eq!(result.pagers.len(), 3);
        assert_eq!(result.pagers[2].resources().len(), 5);
    }

    #[test]
    fn paginate_star_crosses_directories() {
        let items = vec![Plain("/pages/blog/2012/deep.md".into())];
        let rule = PaginationRule::new("/blog/*", 10);
        assert!(paginate(&items, &rule).unwrap().is_some());
    }

    #[test]
    fn paginate_without_matches() {
        let rule = PaginationRule::new("/news/*", 10);
        assert_eq!(paginate(&posts(3), &rule).unwrap(), None);
    }

    #[test]
    fn paginate_rejects_bad_rules() {
        let zero = PaginationRule::new("*", 0);
        assert!(matches!(
            paginate(&posts(1), &zero),
            Err(PaginateError::ZeroPerPage { .. })
        ));
        let bad = PaginationRule::new("[", 10);
        assert!(matches!(
            paginate(&posts(1), &bad),
            Err(PaginateError::Pattern { .. })
        ));
    }
}
