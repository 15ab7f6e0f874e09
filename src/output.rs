//! CLI status output.
//!
//! Each message has a `format_*` function returning lines, so the wording is
//! testable without capturing stdout, and most have a `print_*` wrapper.
//! Build progress arrives as [`BuildEvent`]s and is printed by a dedicated
//! thread in the binary.
//!
//! ```text
//! Building to /site/_out
//! ==> Scan
//!     9 pages, 2 media files
//! ==> Paginate
//!     blog: /pages/blog/index.md → 2 pages
//! ==> Build media
//!     /media/cats/tabby.jpg: 2 created, 0 up to date
//! ==> Build static
//!     2 copied, 0 unchanged, 0 minified, 0 removed
//! ...
//! ==> Write
//!     /pages/index.md → /index.html
//!     /pages/draft.md skipped (build: false)
//! Built 8 pages in 0.04s
//! ```

use crate::monitor::Snapshot;
use crate::site::BuildEvent;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn seconds(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

/// Display lines for one build event.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::PhaseStarted(phase) => vec![format!("==> {phase}")],
        BuildEvent::Scanned { pages, media } => vec![format!(
            "{}{}, {}",
            indent(1),
            plural(*pages, "page", "pages"),
            plural(*media, "media file", "media files")
        )],
        BuildEvent::Paginated {
            rule,
            anchor,
            pages,
        } => vec![format!(
            "{}{rule}: {anchor} \u{2192} {}",
            indent(1),
            plural(*pages, "page", "pages")
        )],
        BuildEvent::MediaBuilt {
            source,
            created,
            skipped,
        } => vec![format!(
            "{}{source}: {created} created, {skipped} up to date",
            indent(1)
        )],
        BuildEvent::MediaFailed { source, error } => {
            vec![
                format!("{}{source}: failed, left out", indent(1)),
                format!("{}{error}", indent(2)),
            ]
        }
        BuildEvent::AssetsSynced {
            copied,
            unchanged,
            minified,
            removed,
            failed,
        } => {
            let mut lines = vec![format!(
                "{}{copied} copied, {unchanged} unchanged, {minified} minified, {removed} removed",
                indent(1)
            )];
            if *failed > 0 {
                lines.push(format!(
                    "{}{} (see log)",
                    indent(1),
                    plural(*failed, "failure", "failures")
                ));
            }
            lines
        }
        BuildEvent::PageWritten {
            source,
            destination,
        } => vec![format!("{}{source} \u{2192} {destination}", indent(1))],
        BuildEvent::PageSkipped { source } => {
            vec![format!("{}{source} skipped (build: false)", indent(1))]
        }
        BuildEvent::Finished { written, elapsed } => vec![format!(
            "Built {} in {}",
            plural(*written, "page", "pages"),
            seconds(*elapsed)
        )],
    }
}

pub fn format_building(build_dir: &Path) -> Vec<String> {
    vec![format!("Building to {}", build_dir.display())]
}

pub fn print_building(build_dir: &Path) {
    for line in format_building(build_dir) {
        println!("{}", line);
    }
}

/// `+ <dir>` per scaffolded directory.
pub fn format_bootstrap(dirs: &[PathBuf]) -> Vec<String> {
    dirs.iter()
        .map(|d| format!("+ {}", d.display()))
        .collect()
}

pub fn print_bootstrap(dirs: &[PathBuf]) {
    for line in format_bootstrap(dirs) {
        println!("{}", line);
    }
}

pub fn format_serving(addr: SocketAddr, build_dir: &Path) -> Vec<String> {
    vec![
        format!("Running webserver at {} for {}", addr, build_dir.display()),
        "Type control-c to exit".to_string(),
    ]
}

pub fn print_serving(addr: SocketAddr, build_dir: &Path) {
    for line in format_serving(addr, build_dir) {
        println!("{}", line);
    }
}

/// Rebuild banner followed by one line per changed file.
pub fn format_rebuild(changes: &Snapshot) -> Vec<String> {
    let mut lines = vec!["Rebuilding".to_string()];
    lines.extend(
        changes
            .keys()
            .map(|path| format!("Changed {}", path.display())),
    );
    lines
}

pub fn print_rebuild(changes: &Snapshot) {
    for line in format_rebuild(changes) {
        println!("{}", line);
    }
}
