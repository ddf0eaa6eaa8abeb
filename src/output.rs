//! CLI output formatting.
//!
//! Every entity leads with its content id; dimensions, variants and written
//! files follow as indented context lines.
//!
//! # Output Format
//!
//! ## Probe
//!
//! ```text
//! image@posts/cats/tabby.jpg
//!     1200x800 jpeg
//!     Variants: 50w, 200w, 500w, 1000w
//! ```
//!
//! ## Build
//!
//! ```text
//! image@posts/cats/tabby.jpg
//!     1200x800 jpeg
//!     base: posts/cats/tabby.jpg (48213 bytes)
//!     50w: posts/cats/tabby.jpg.v1-50w.jpg (1022 bytes)
//! ```
//!
//! ## Catalog
//!
//! ```text
//! 001 image@posts/cats/tabby.jpg
//!     1200x800 jpeg, 4 variants
//! 002 image@posts/dogs/rex.png
//!     40x40 png, no variants
//!
//! Failed to identify content/posts/other/broken.jpg: ...
//! 2 images, 4 variants, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::catalog::CatalogScan;
use crate::content::ImageMetaContent;
use crate::id::ContentId;
use crate::imaging::{BuiltImage, ImageFormat, ImageMeta};
use crate::watch::{ChangeEvent, ChangeKind};
use std::path::{Path, PathBuf};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::Webp => "webp",
        ImageFormat::Gif => "gif",
    }
}

/// `1200x800 jpeg`
fn meta_line(meta: &ImageMeta) -> String {
    format!("{}x{} {}", meta.width, meta.height, format_name(meta.format))
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{} {}", n, one)
    } else {
        format!("{} {}", n, many)
    }
}

// ============================================================================
// Probe
// ============================================================================

pub fn format_probe_output(probe: &ImageMetaContent) -> Vec<String> {
    let widths: Vec<String> = probe
        .scaled_image_list
        .iter()
        .filter_map(crate::id::decode_variant_id)
        .map(|(_, width)| format!("{}w", width))
        .collect();
    let variants = if widths.is_empty() {
        "none".to_string()
    } else {
        widths.join(", ")
    };
    vec![
        probe.id.to_string(),
        format!("{}{}", indent(1), meta_line(&probe.meta)),
        format!("{}Variants: {}", indent(1), variants),
    ]
}

pub fn print_probe_output(probe: &ImageMetaContent) {
    for line in format_probe_output(probe) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format a persisted build. `written` is what [`persist`](crate::content::persist)
/// returned: the base first, then one path per variant.
pub fn format_build_output(
    id: &ContentId,
    built: &BuiltImage,
    written: &[PathBuf],
    out_dir: &Path,
) -> Vec<String> {
    let display = |path: &PathBuf| {
        path.strip_prefix(out_dir)
            .unwrap_or(path)
            .display()
            .to_string()
    };

    let mut lines = vec![id.to_string(), format!("{}{}", indent(1), meta_line(&built.meta))];
    let mut paths = written.iter();
    if let Some(base) = paths.next() {
        lines.push(format!(
            "{}base: {} ({} bytes)",
            indent(1),
            display(base),
            built.content.len()
        ));
    }
    for (scaled, path) in built.scaled.iter().zip(paths) {
        lines.push(format!(
            "{}{}w: {} ({} bytes)",
            indent(1),
            scaled.width,
            display(path),
            scaled.content.len()
        ));
    }
    lines
}

pub fn print_build_output(id: &ContentId, built: &BuiltImage, written: &[PathBuf], out_dir: &Path) {
    for line in format_build_output(id, built, written, out_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Catalog
// ============================================================================

pub fn format_catalog_output(scan: &CatalogScan) -> Vec<String> {
    let catalog = &scan.catalog;
    let mut lines = Vec::new();
    for (i, record) in catalog.image_metas.iter().enumerate() {
        let variants = catalog
            .scaled_image_ids
            .iter()
            .filter_map(crate::id::decode_variant_id)
            .filter(|(original, _)| original == &record.id)
            .count();
        let variants = if variants == 0 {
            "no variants".to_string()
        } else {
            plural(variants, "variant", "variants")
        };
        lines.push(format!("{} {}", format_index(i + 1), record.id));
        lines.push(format!("{}{}, {}", indent(1), meta_line(&record.meta), variants));
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    for failure in &scan.failures {
        lines.push(failure.to_string());
    }
    let mut summary = format!(
        "{}, {}",
        plural(catalog.image_metas.len(), "image", "images"),
        plural(catalog.scaled_image_ids.len(), "variant", "variants")
    );
    if !scan.failures.is_empty() {
        summary.push_str(&format!(", {} failed", scan.failures.len()));
    }
    lines.push(summary);
    lines
}

pub fn print_catalog_output(scan: &CatalogScan) {
    for line in format_catalog_output(scan) {
        println!("{}", line);
    }
}

// ============================================================================
// Watch
// ============================================================================

pub fn format_change_event(event: &ChangeEvent) -> String {
    let kind = match event.kind {
        ChangeKind::Created => "created",
        ChangeKind::Modified => "modified",
        ChangeKind::Removed => "removed",
    };
    format!("{}: {}", kind, event.path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogError};
    use crate::id::{IdKind, encode_variant_id};
    use crate::imaging::{BackendError, ScaledImage};

    fn image(path: &str) -> ContentId {
        ContentId::new(IdKind::Image, path)
    }

    fn jpeg(width: u32, height: u32) -> ImageMeta {
        ImageMeta {
            width,
            height,
            format: ImageFormat::Jpeg,
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "image", "images"), "1 image");
        assert_eq!(plural(0, "image", "images"), "0 images");
        assert_eq!(plural(3, "image", "images"), "3 images");
    }

    // =========================================================================
    // Probe
    // =========================================================================

    #[test]
    fn probe_lists_variant_widths() {
        let id = image("posts/cats/tabby.jpg");
        let probe = ImageMetaContent {
            id: id.clone(),
            meta: jpeg(1200, 800),
            scaled_image_list: [50, 200, 500, 1000]
                .iter()
                .map(|&w| encode_variant_id(&id, w))
                .collect(),
        };
        assert_eq!(
            format_probe_output(&probe),
            vec![
                "image@posts/cats/tabby.jpg",
                "    1200x800 jpeg",
                "    Variants: 50w, 200w, 500w, 1000w",
            ]
        );
    }

    #[test]
    fn probe_without_variants() {
        let probe = ImageMetaContent {
            id: image("icon.png"),
            meta: ImageMeta {
                width: 32,
                height: 32,
                format: ImageFormat::Png,
            },
            scaled_image_list: vec![],
        };
        assert_eq!(format_probe_output(&probe)[2], "    Variants: none");
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[test]
    fn build_shows_relative_paths_and_sizes() {
        let id = image("p/a.jpg");
        let built = BuiltImage {
            content: vec![0; 100],
            meta: jpeg(600, 400),
            scaled: vec![ScaledImage {
                width: 50,
                height: 33,
                format: ImageFormat::Jpeg,
                content: vec![0; 7],
            }],
        };
        let out = Path::new("/out");
        let written = vec![out.join("p/a.jpg"), out.join("p/a.jpg.v1-50w.jpg")];

        assert_eq!(
            format_build_output(&id, &built, &written, out),
            vec![
                "image@p/a.jpg",
                "    600x400 jpeg",
                "    base: p/a.jpg (100 bytes)",
                "    50w: p/a.jpg.v1-50w.jpg (7 bytes)",
            ]
        );
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    #[test]
    fn catalog_lists_images_with_variant_counts() {
        let mut scan = CatalogScan::default();
        scan.catalog.insert(image("a.jpg"), jpeg(600, 400), &[50, 200, 500, 1000]);
        scan.catalog.insert(image("b.jpg"), jpeg(40, 40), &[50, 200, 500, 1000]);

        assert_eq!(
            format_catalog_output(&scan),
            vec![
                "001 image@a.jpg",
                "    600x400 jpeg, 3 variants",
                "002 image@b.jpg",
                "    40x40 jpeg, no variants",
                "",
                "2 images, 3 variants",
            ]
        );
    }

    #[test]
    fn empty_catalog() {
        assert_eq!(format_catalog_output(&CatalogScan::default()), vec!["0 images, 0 variants"]);
    }

    #[test]
    fn catalog_lists_failures_before_summary() {
        let mut catalog = Catalog::default();
        catalog.insert(image("a.jpg"), jpeg(40, 40), &[50]);
        let scan = CatalogScan {
            catalog,
            failures: vec![CatalogError::Backend {
                path: PathBuf::from("c/broken.jpg"),
                source: BackendError::UnsupportedFormat("c/broken.jpg".into()),
            }],
        };

        assert_eq!(
            format_catalog_output(&scan),
            vec![
                "001 image@a.jpg",
                "    40x40 jpeg, no variants",
                "",
                "Failed to identify c/broken.jpg: Unsupported image format: c/broken.jpg",
                "1 image, 0 variants, 1 failed",
            ]
        );
    }

    // =========================================================================
    // Watch
    // =========================================================================

    #[test]
    fn change_event_line() {
        let event = ChangeEvent {
            path: PathBuf::from("/c/a.jpg"),
            kind: ChangeKind::Modified,
        };
        assert_eq!(format_change_event(&event), "modified: /c/a.jpg");
    }
}
