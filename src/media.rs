//! Media resources: source images and their thumbnails.
//!
//! Every file under the media directory is a [`MediaResource`]. Building it
//! writes one thumbnail per configured size next to where the image itself
//! would land, with the size name appended and the path slugified:
//!
//! ```text
//! /media/Trips/Beach Day.jpg  +  size "small"
//!   → /trips/beach-day-small.jpg
//! ```
//!
//! A thumbnail is regenerated only when missing or older than its source.

use crate::config::{Config, MediaSize};
use crate::imaging::{BackendError, ImageBackend, Quality, ThumbnailParams};
use crate::resource::{Resource, split_extension};
use crate::slug::slugify;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to create thumbnail {size} of {path}: {source}")]
    Thumbnail {
        path: PathBuf,
        size: String,
        source: BackendError,
    },
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResource {
    source: String,
}

/// What a single [`MediaResource::build`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaOutcome {
    pub created: Vec<PathBuf>,
    pub skipped: usize,
}

impl MediaResource {
    /// `source` is relative to the source root, e.g. `/media/cats/tabby.jpg`.
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
        }
    }

    /// Public URL of the thumbnail for `size_name`.
    pub fn image_url(&self, size_name: &str) -> String {
        let destination = self.destination();
        let (root, ext) = split_extension(&destination);
        format!("{}{}", slugify(&format!("{root}-{size_name}")), ext)
    }

    /// Create every configured thumbnail. Stops at the first failure.
    pub fn build(
        &self,
        config: &Config,
        backend: &dyn ImageBackend,
    ) -> Result<MediaOutcome, MediaError> {
        let src = config.source_dir.join(self.source.trim_start_matches('/'));
        let mut outcome = MediaOutcome::default();

        for (size_name, size) in &config.media {
            let dst = config
                .build_dir
                .join(self.image_url(size_name).trim_start_matches('/'));
            if is_fresh(&src, &dst) {
                outcome.skipped += 1;
                continue;
            }
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent).map_err(|source| MediaError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            create_thumbnail(backend, &src, &dst, *size).map_err(|source| {
                MediaError::Thumbnail {
                    path: src.clone(),
                    size: size_name.clone(),
                    source,
                }
            })?;
            outcome.created.push(dst);
        }
        Ok(outcome)
    }

    /// Template data: paths plus `images.<size>` URLs.
    pub fn summary(&self, config: &Config) -> Value {
        let images: Map<String, Value> = config
            .media
            .keys()
            .map(|name| (name.clone(), Value::String(self.image_url(name))))
            .collect();
        json!({
            "source": self.source,
            "destination": self.destination(),
            "url": self.url(),
            "belongs_to": self.belongs_to(),
            "images": images,
        })
    }
}

impl Resource for MediaResource {
    fn source(&self) -> &str {
        &self.source
    }
}

fn create_thumbnail(
    backend: &dyn ImageBackend,
    src: &Path,
    dst: &Path,
    size: MediaSize,
) -> Result<(), BackendError> {
    backend.thumbnail(&ThumbnailParams {
        source: src.to_path_buf(),
        output: dst.to_path_buf(),
        max_width: size.width,
        max_height: size.height,
        quality: Quality::default(),
    })
}

/// Output exists and is at least as new as the source.
fn is_fresh(src: &Path, dst: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(src), modified(dst)) {
        (Some(s), Some(d)) => d >= s,
        (None, Some(_)) => true,
        _ => false,
    }
}
