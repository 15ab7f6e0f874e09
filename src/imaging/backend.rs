//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the one operation the media build needs:
//! thumbnail. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests use the mock
//! below, which records operations instead of touching pixels.

use super::params::ThumbnailParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Shrink an image to fit the requested bounds and write it out.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
