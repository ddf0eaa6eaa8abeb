//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the operations every backend must
//! support: identify, decode, resize and compress. A source is decoded once
//! per build and every resize and compress reads that shared value. Resize and
//! compress return encoded bytes; the backend never writes output files.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{CompressParams, ResizeParams};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// Image formats the pipeline can read and re-encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::Webp),
            "gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
        }
    }

    pub(crate) fn from_codec(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::WebP => Some(ImageFormat::Webp),
            image::ImageFormat::Gif => Some(ImageFormat::Gif),
            _ => None,
        }
    }
}

/// Intrinsic properties of a base image, read without a full decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared by every rayon worker.
pub trait ImageBackend: Sync {
    /// A decoded source image. Read concurrently by every encode of a build.
    type Decoded: Sync;

    /// Read width, height and format from the image header.
    fn identify(&self, path: &Path) -> Result<ImageMeta, BackendError>;

    /// Decode the full source image.
    fn decode(&self, path: &Path) -> Result<Self::Decoded, BackendError>;

    /// Resize the decoded source to the given dimensions and encode it.
    fn resize(
        &self,
        source: &Self::Decoded,
        params: &ResizeParams,
    ) -> Result<Vec<u8>, BackendError>;

    /// Re-encode the decoded source at full resolution with format-aware
    /// compression.
    fn compress(
        &self,
        source: &Self::Decoded,
        params: &CompressParams,
    ) -> Result<Vec<u8>, BackendError>;
}
