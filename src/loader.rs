//! Front matter loading.
//!
//! A content file may start with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Home
//! layout: wide.html
//! ---
//! Welcome to **the site**.
//! ```
//!
//! The block becomes the page [`Context`]; everything after the closing fence
//! is the body. Files without a complete block are returned untouched.

use crate::context::Context;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid front matter in {path}: {message}")]
    FrontMatter { path: PathBuf, message: String },
}

/// Body text plus the context parsed from its front matter.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub content: String,
    pub context: Context,
}

/// Read `root` + `relative` and split off its front matter.
///
/// `relative` is a source path such as `/pages/index.md`; a leading `/` is
/// treated as relative to `root`.
pub fn load(root: &Path, relative: &str) -> Result<Loaded, LoadError> {
    let path = root.join(relative.trim_start_matches('/'));
    let text = fs::read_to_string(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    parse(&text).map_err(|message| LoadError::FrontMatter { path, message })
}

/// Parse already-loaded text. Errors carry the YAML diagnostic.
pub fn parse(text: &str) -> Result<Loaded, String> {
    match split_front_matter(text) {
        Some((yaml, body)) => Ok(Loaded {
            content: body.to_string(),
            context: parse_mapping(yaml)?,
        }),
        None => Ok(Loaded {
            content: text.to_string(),
            context: Context::new(),
        }),
    }
}

/// Split `text` into `(front_matter, body)`.
///
/// Returns `None` unless the first line is a `---` fence and a later line is
/// a closing `---` fence. The first closing fence wins.
pub fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let (first, rest) = next_line(text)?;
    if !is_fence(first) {
        return None;
    }
    let block_start = text.len() - rest.len();

    let mut cursor = block_start;
    while cursor < text.len() {
        let (line, after) = next_line(&text[cursor..])?;
        if is_fence(line) {
            let body_start = text.len() - after.len();
            return Some((&text[block_start..cursor], &text[body_start..]));
        }
        cursor = text.len() - after.len();
    }
    None
}

/// Take one line (without its terminator) and the remainder after it.
fn next_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    match text.find('\n') {
        Some(i) => Some((&text[..i], &text[i + 1..])),
        None => Some((text, "")),
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_end() == "---"
}

fn parse_mapping(yaml: &str) -> Result<Context, String> {
    if yaml.trim().is_empty() {
        return Ok(Context::new());
    }
    let value: Value = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
    match value {
        Value::Object(map) => Ok(Context::from(map)),
        Value::Null => Ok(Context::from(Map::new())),
        other => Err(format!("expected a mapping, found {other}")),
    }
}
