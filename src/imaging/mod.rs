//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` (header only) |
//! | **Plan** | [`plan_variants`] over the configured ladder |
//! | **Resize** | Lanczos3, re-encoded in the source format |
//! | **Compress** | full-size re-encode, format-aware settings |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for the ladder and dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Fan-out/fan-in functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, ImageFormat, ImageMeta};
pub use calculations::{VariantSpec, plan_variants, scaled_height};
pub use operations::{BuiltImage, ScaledImage, build_image, compress, get_meta, produce_variants};
pub use params::{CompressParams, Quality, ResizeParams};
pub use rust_backend::RustBackend;
