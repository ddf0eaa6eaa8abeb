//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::with_guessed_format` + `into_dimensions` (header only) |
//! | Decode | `image` crate (JPEG, PNG, WebP, GIF) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode JPEG | `JpegEncoder::new_with_quality` |
//! | Encode PNG | `PngEncoder` with `CompressionType::Best` |
//! | Encode WebP | `WebPEncoder::new_lossless` |
//! | Encode GIF | `DynamicImage::write_to` |

use super::backend::{BackendError, ImageBackend, ImageFormat, ImageMeta};
use super::params::{CompressParams, Quality, ResizeParams};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    open(path)?.decode().map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
    })
}

/// Encode an image into an in-memory buffer in the requested format.
fn encode(img: &DynamicImage, format: ImageFormat, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let result = match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(
                &mut buf,
                quality.value() as u8,
            ))
        }
        ImageFormat::Png => img.write_with_encoder(PngEncoder::new_with_quality(
            &mut buf,
            CompressionType::Best,
            PngFilter::Adaptive,
        )),
        ImageFormat::Webp => {
            // The lossless encoder only accepts 8-bit RGB(A)
            let normalized = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            normalized.write_with_encoder(WebPEncoder::new_lossless(&mut buf))
        }
        ImageFormat::Gif => img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Gif),
    };
    result.map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "{} encode failed: {}",
            format.extension(),
            e
        ))
    })?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    type Decoded = DynamicImage;

    fn identify(&self, path: &Path) -> Result<ImageMeta, BackendError> {
        let reader = open(path)?;
        let format = reader
            .format()
            .and_then(ImageFormat::from_codec)
            .ok_or_else(|| BackendError::UnsupportedFormat(path.display().to_string()))?;
        let (width, height) = reader.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(ImageMeta {
            width,
            height,
            format,
        })
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        load_image(path)
    }

    fn resize(&self, source: &DynamicImage, params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
        let resized = source.resize_exact(params.width, params.height, FilterType::Lanczos3);
        encode(&resized, params.format, params.quality)
    }

    fn compress(
        &self,
        source: &DynamicImage,
        params: &CompressParams,
    ) -> Result<Vec<u8>, BackendError> {
        encode(source, params.format, params.quality)
    }
}
