//! Pure calculation functions for the variant ladder.
//!
//! All functions here are pure and testable without any I/O or images. The
//! catalog relies on that: it re-derives a base image's variant ids from its
//! metadata alone, and must arrive at the same set the build produced.

use super::backend::{ImageFormat, ImageMeta};
use serde::{Deserialize, Serialize};

/// One planned output of the scaling engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    pub width: u32,
    pub format: ImageFormat,
}

/// Plan the scaled variants for a base image.
///
/// Keeps every ladder width strictly below the base width, in ladder order,
/// each in the base format. An image narrower than every rung gets no
/// variants; the base itself is always a candidate at render time.
///
/// ```
/// # use folio::imaging::{ImageFormat, ImageMeta, plan_variants};
/// let meta = ImageMeta { width: 1200, height: 800, format: ImageFormat::Jpeg };
/// let widths: Vec<u32> = plan_variants(&meta, &[50, 200, 500, 1000, 1500, 2000])
///     .iter()
///     .map(|v| v.width)
///     .collect();
/// assert_eq!(widths, vec![50, 200, 500, 1000]);
/// ```
pub fn plan_variants(meta: &ImageMeta, ladder: &[u32]) -> Vec<VariantSpec> {
    ladder
        .iter()
        .filter(|&&w| w < meta.width)
        .map(|&width| VariantSpec {
            width,
            format: meta.format,
        })
        .collect()
}

/// Height of a variant scaled to `width`, preserving the aspect ratio.
///
/// Rounded to the nearest pixel, never less than 1.
pub fn scaled_height(original: (u32, u32), width: u32) -> u32 {
    let (orig_w, orig_h) = original;
    if orig_w == 0 {
        return orig_h.max(1);
    }
    let h = (orig_h as f64 * width as f64 / orig_w as f64).round() as u32;
    h.max(1)
}
