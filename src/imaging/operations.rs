//! High-level image operations.
//!
//! These functions combine the ladder calculations with backend execution.
//! Variant production fans out over the rayon pool and fans back in before
//! returning; a single failing resize fails the whole call. The compression
//! pass runs alongside the variants via [`rayon::join`]. The source is decoded
//! once per build and shared read-only; each task encodes into its own buffer.
//!
//! Nothing here writes to disk. Persisting the bytes is the caller's job.

use super::backend::{BackendError, ImageBackend, ImageFormat, ImageMeta};
use super::calculations::{VariantSpec, scaled_height};
use super::params::{CompressParams, Quality, ResizeParams};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Read a base image's metadata through the backend.
pub fn get_meta(backend: &impl ImageBackend, path: &Path) -> Result<ImageMeta> {
    backend.identify(path)
}

/// One materialized variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaledImage {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    #[serde(skip)]
    pub content: Vec<u8>,
}

/// Output of a full build: the compressed base plus all its variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltImage {
    pub content: Vec<u8>,
    pub meta: ImageMeta,
    pub scaled: Vec<ScaledImage>,
}

/// Resize the decoded `source` into every planned variant, concurrently.
///
/// Output order matches `specs`. Fails as a unit if any resize fails.
pub fn produce_variants<B: ImageBackend>(
    backend: &B,
    source: &B::Decoded,
    meta: &ImageMeta,
    specs: &[VariantSpec],
    quality: Quality,
) -> Result<Vec<ScaledImage>> {
    specs
        .par_iter()
        .map(|spec| {
            let height = scaled_height((meta.width, meta.height), spec.width);
            debug!(width = spec.width, height, "resizing variant");
            let content = backend.resize(
                source,
                &ResizeParams {
                    width: spec.width,
                    height,
                    format: spec.format,
                    quality,
                },
            )?;
            Ok(ScaledImage {
                width: spec.width,
                height,
                format: spec.format,
                content,
            })
        })
        .collect()
}

/// Full-resolution, format-aware compression of the decoded base image.
pub fn compress<B: ImageBackend>(
    backend: &B,
    source: &B::Decoded,
    format: ImageFormat,
    quality: Quality,
) -> Result<Vec<u8>> {
    debug!(format = format.extension(), "compressing base image");
    backend.compress(source, &CompressParams { format, quality })
}

/// Decode the base once, then compress it and produce all variants
/// concurrently.
pub fn build_image<B: ImageBackend>(
    backend: &B,
    path: &Path,
    meta: ImageMeta,
    specs: &[VariantSpec],
    quality: Quality,
) -> Result<BuiltImage> {
    debug!(source = %path.display(), variants = specs.len(), "decoding source");
    let source = backend.decode(path)?;
    let (content, scaled) = rayon::join(
        || compress(backend, &source, meta.format, quality),
        || produce_variants(backend, &source, &meta, specs, quality),
    );
    Ok(BuiltImage {
        content: content?,
        meta,
        scaled: scaled?,
    })
}
