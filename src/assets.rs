//! Static asset mirroring.
//!
//! The assets directory is mirrored into the build directory:
//!
//! 1. Directories are created, files are copied when missing on the build
//!    side or when their modification times differ. Copies keep the source
//!    modification time, so an unchanged file is never copied twice.
//!    Dotfiles and dot-directories are skipped.
//! 2. Files just copied whose name matches a `compress` glob are minified in
//!    place (`.css` via lightningcss, `.js` via oxc). `*.min.css` and
//!    `*.min.js` are left alone.
//! 3. Anything on the build side with no copied counterpart is removed.
//!
//! Failures are per path: they are collected in the [`SyncReport`] and the
//! rest of the tree is still processed.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to copy {path}: {source}")]
    Copy { path: PathBuf, source: io::Error },
    #[error("Failed to remove {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
    #[error("Failed to minify {path}: {message}")]
    Minify { path: PathBuf, message: String },
    #[error("Failed to walk assets: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub copied: Vec<PathBuf>,
    pub unchanged: usize,
    pub minified: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub failures: Vec<AssetError>,
}

/// Mirror `src_root` into `dst_root`, minifying copied files that match one
/// of `compress` (file-name globs). A missing `src_root` is a no-op.
pub fn sync(src_root: &Path, dst_root: &Path, compress: &[String]) -> SyncReport {
    let mut report = SyncReport::default();
    if !src_root.is_dir() {
        return report;
    }

    copy_tree(src_root, dst_root, &mut report);

    let patterns: Vec<glob::Pattern> = compress
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();
    if !patterns.is_empty() {
        let copied = report.copied.clone();
        for path in copied.iter().filter(|p| wants_minify(p, &patterns)) {
            match minify_file(path) {
                Ok(true) => report.minified.push(path.clone()),
                Ok(false) => {}
                Err(e) => report.failures.push(e),
            }
        }
    }

    prune(src_root, dst_root, &mut report);
    report
}

fn copy_tree(src_root: &Path, dst_root: &Path, report: &mut SyncReport) {
    let walker = WalkDir::new(src_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                report.failures.push(AssetError::Walk(e));
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(src_root) else {
            continue;
        };
        let dst = dst_root.join(relative);

        if entry.file_type().is_dir() {
            if let Err(source) = fs::create_dir_all(&dst) {
                report.failures.push(AssetError::Copy { path: dst, source });
            }
            continue;
        }

        if !needs_copy(entry.path(), &dst) {
            report.unchanged += 1;
            continue;
        }
        match copy_preserving_mtime(entry.path(), &dst) {
            Ok(()) => report.copied.push(dst),
            Err(source) => report.failures.push(AssetError::Copy {
                path: entry.path().to_path_buf(),
                source,
            }),
        }
    }
}

fn prune(src_root: &Path, dst_root: &Path, report: &mut SyncReport) {
    if !dst_root.is_dir() {
        return;
    }
    for entry in WalkDir::new(dst_root).min_depth(1).contents_first(true) {
        let Ok(entry) = entry else {
            continue;
        };
        let Ok(relative) = entry.path().strip_prefix(dst_root) else {
            continue;
        };
        let hidden = relative.components().any(|c| is_hidden(c.as_os_str()));
        if !hidden && src_root.join(relative).exists() {
            continue;
        }
        let result = if entry.file_type().is_dir() {
            fs::remove_dir_all(entry.path())
        } else {
            fs::remove_file(entry.path())
        };
        match result {
            Ok(()) => report.removed.push(entry.path().to_path_buf()),
            Err(source) => report.failures.push(AssetError::Remove {
                path: entry.path().to_path_buf(),
                source,
            }),
        }
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn needs_copy(src: &Path, dst: &Path) -> bool {
    match (modified(src), modified(dst)) {
        (Some(s), Some(d)) => s != d,
        _ => true,
    }
}

fn copy_preserving_mtime(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    let mtime = fs::metadata(src)?.modified()?;
    set_modified(dst, mtime)
}

fn set_modified(path: &Path, mtime: SystemTime) -> io::Result<()> {
    fs::OpenOptions::new()
        .write(true)
        .open(path)?
        .set_modified(mtime)
}

fn wants_minify(path: &Path, patterns: &[glob::Pattern]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.ends_with(".min.js") || name.ends_with(".min.css") {
        return false;
    }
    patterns.iter().any(|p| p.matches(name))
}

/// Minify in place. `Ok(false)` when there is no minifier for the extension.
fn minify_file(path: &Path) -> Result<bool, AssetError> {
    let minifier: fn(&str) -> Result<String, String> =
        match path.extension().and_then(|e| e.to_str()) {
            Some("css") => minify_stylesheet,
            Some("js") => minify_script,
            _ => {
                tracing::debug!(path = %path.display(), "no minifier for extension");
                return Ok(false);
            }
        };

    let io_err = |source: io::Error| AssetError::Copy {
        path: path.to_path_buf(),
        source,
    };
    let content = fs::read_to_string(path).map_err(io_err)?;
    let minified = minifier(&content).map_err(|message| AssetError::Minify {
        path: path.to_path_buf(),
        message,
    })?;

    // Keep the source mtime so the next sync sees the file as unchanged.
    let mtime = fs::metadata(path).and_then(|m| m.modified()).map_err(io_err)?;
    fs::write(path, minified).map_err(io_err)?;
    set_modified(path, mtime).map_err(io_err)?;
    Ok(true)
}

fn minify_stylesheet(source: &str) -> Result<String, String> {
    let sheet = StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(printed.code)
}

/// Scripts are parsed as ES modules; names are mangled and comments dropped.
fn minify_script(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if let Some(first) = parsed.errors.first() {
        return Err(first.to_string());
    }
    let mut program = parsed.program;
    let minified = Minifier::new(MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    })
    .minify(&allocator, &mut program);

    let options = CodegenOptions {
        minify: true,
        comments: CommentOptions::disabled(),
        ..CodegenOptions::default()
    };
    Ok(Codegen::new()
        .with_options(options)
        .with_scoping(minified.scoping)
        .build(&program)
        .code)
}
