//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations), which decides which
//! images to produce, and the [`backend`](super::backend), which does the
//! pixel work. Operations can therefore be tested against a mock backend.
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`ResizeParams`]: Target dimensions, output format, quality.
//! - [`CompressParams`]: Output format and quality for the full-size pass.
//!
//! The decoded source travels separately, so one decode serves every call.

use super::backend::ImageFormat;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Parameters for resizing a source image into one variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub quality: Quality,
}

/// Parameters for the full-resolution compression pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressParams {
    pub format: ImageFormat,
    pub quality: Quality,
}
