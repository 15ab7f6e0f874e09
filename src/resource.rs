//! The resource model: where a source file lands in the build, and where it
//! sits in the hierarchy.
//!
//! Every discovered file is a resource identified by its `source` path,
//! relative to the source root and `/`-separated. Everything else is derived
//! from it:
//!
//! ```text
//! source              /pages/blog/2012/hello.md
//! destination         /blog/2012/hello.html     (first directory dropped)
//! belongs_to          2012                      (immediate directory)
//! belongs_to_parent   blog                      (grandparent directory)
//! ```
//!
//! Grouping works on the *destination*, so the tree built from resources
//! mirrors the output structure rather than the source layout.

use std::path::Path;

/// Something discovered in the source tree.
///
/// Implementors supply `source` and `destination`; the hierarchy position is
/// derived from the destination with POSIX `dirname`/`basename` semantics.
pub trait Resource {
    /// Path relative to the source root, e.g. `/pages/about.md`.
    fn source(&self) -> &str;

    /// Path relative to the build root. Must be a pure function of `source`.
    fn destination(&self) -> String {
        strip_first_segment(self.source()).to_string()
    }

    /// Public URL; identical to the destination.
    fn url(&self) -> String {
        self.destination()
    }

    /// Name of the directory containing the destination (`""` at the root).
    fn belongs_to(&self) -> String {
        basename(dirname(&self.destination())).to_string()
    }

    /// Name of the directory above [`belongs_to`](Self::belongs_to), or
    /// `None` when the destination sits at or directly below the root.
    fn belongs_to_parent(&self) -> Option<String> {
        let destination = self.destination();
        let parent = basename(dirname(dirname(&destination)));
        if parent.is_empty() {
            None
        } else {
            Some(parent.to_string())
        }
    }
}

/// Drop the first path segment of a source path.
///
/// - `/pages/a/b.md` → `/a/b.md` (leading separator kept)
/// - `pages/a.md` → `a.md`
/// - `/about.md`, `about.md` → unchanged (nothing to drop)
pub fn strip_first_segment(source: &str) -> &str {
    let Some(first) = source.find('/') else {
        return source;
    };
    if first == 0 {
        match source[1..].find('/') {
            // Offset is relative to the tail; applied to the full string it
            // lands on the separator, which keeps the leading `/`.
            Some(i) => &source[i + 1..],
            None => source,
        }
    } else {
        &source[first + 1..]
    }
}

/// Replace the extension of the final path component.
pub fn with_extension(path: &str, ext: &str) -> String {
    let (head, tail) = split(path);
    let stem = match tail.rfind('.') {
        Some(i) if i > 0 => &tail[..i],
        _ => tail,
    };
    let sep = if head.is_empty() || head.ends_with('/') {
        ""
    } else {
        "/"
    };
    format!("{head}{sep}{stem}{ext}")
}

/// Split off the extension of the final component (including the dot).
pub fn split_extension(path: &str) -> (&str, &str) {
    let name_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[name_start..].rfind('.') {
        Some(i) if i > 0 => path.split_at(name_start + i),
        _ => (path, ""),
    }
}

/// POSIX `dirname`: everything before the final `/`, trailing slashes trimmed
/// unless the head consists only of slashes.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => {
            let head = &path[..=i];
            if head.chars().all(|c| c == '/') {
                head
            } else {
                head.trim_end_matches('/')
            }
        }
        None => "",
    }
}

/// POSIX `basename`: everything after the final `/`.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// `(dirname, basename)` in one call.
pub fn split(path: &str) -> (&str, &str) {
    (dirname(path), basename(path))
}

/// Source path of `path` under `root`: `/`-separated with a leading `/`.
/// `None` when `path` is not inside `root`.
pub fn relative_source(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut source = String::new();
    for component in relative.components() {
        source.push('/');
        source.push_str(&component.as_os_str().to_string_lossy());
    }
    if source.is_empty() { None } else { Some(source) }
}
