//! Image processing for media thumbnails, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, GIF, TIFF, WebP) |
//! | **Thumbnail** | fit within bounds, `Lanczos3` resize, no upscaling |
//! | **Encode** | format chosen by output extension; JPEG with explicit quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::calculate_fit_dimensions;
pub use params::{Quality, ThumbnailParams};
pub use rust_backend::RustBackend;
