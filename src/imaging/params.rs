//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the media build (which decides which thumbnails to
//! create) and the [`backend`](super::backend) (which does the pixel work),
//! so a mock can stand in for the real backend in tests.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for a thumbnail: shrink `source` to fit the bounds and write
/// it to `output`. A `None` bound leaves that axis unconstrained.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub quality: Quality,
}
