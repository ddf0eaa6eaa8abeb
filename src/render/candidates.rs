//! Candidate sizes for one logical image.
//!
//! The candidates are every generated variant of an image plus the base
//! image itself. From them come the `<source>` groups (one per MIME type)
//! and the single fallback `<img>` URL.

use super::RenderError;
use crate::catalog::ImageRecord;
use crate::id::{ContentId, PathResolver, decode_variant_id};
use crate::mime::{self, MimeError};

/// One renderable size of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSize {
    pub id: ContentId,
    /// File extension, without the dot.
    pub ext: String,
    pub width: u32,
}

impl CandidateSize {
    pub fn mime(&self) -> Result<&'static str, MimeError> {
        mime::mime_for_extension(&self.ext)
    }
}

/// All sizes available for `target`.
///
/// Scaled variants come first, in the order of `scaled_image_ids`, and the
/// base image last. Empty when `target` is not a known base image.
pub fn available_sizes(
    target: &ContentId,
    image_metas: &[ImageRecord],
    scaled_image_ids: &[ContentId],
) -> Vec<CandidateSize> {
    let Some(base) = image_metas.iter().find(|record| &record.id == target) else {
        return Vec::new();
    };

    let mut candidates: Vec<CandidateSize> = scaled_image_ids
        .iter()
        .filter_map(|scaled| {
            let (original, width) = decode_variant_id(scaled)?;
            (original.path() == target.path()).then(|| CandidateSize {
                id: scaled.clone(),
                ext: mime::extension_of(scaled.path()).to_string(),
                width,
            })
        })
        .collect();

    candidates.push(CandidateSize {
        id: base.id.clone(),
        ext: mime::extension_of(base.id.path()).to_string(),
        width: base.meta.width,
    });
    candidates
}

/// Pick the candidate for the plain `<img>`.
///
/// Among candidates with the same MIME type as `requested_url`, this is the
/// widest one not exceeding `ceiling`, or the narrowest one if all are wider.
pub fn fallback_candidate<'a>(
    candidates: &'a [CandidateSize],
    requested_url: &str,
    ceiling: u32,
) -> Result<&'a CandidateSize, RenderError> {
    let wanted = mime::mime_for_path(requested_url)?;
    let mut same_mime: Vec<&CandidateSize> = candidates
        .iter()
        .filter(|c| c.mime().is_ok_and(|m| m == wanted))
        .collect();
    same_mime.sort_by_key(|c| c.width);

    let mut best = *same_mime.first().ok_or_else(|| RenderError::FallbackNotFound {
        url: requested_url.to_string(),
    })?;
    for &candidate in &same_mime {
        if candidate.width > best.width && candidate.width <= ceiling {
            best = candidate;
        }
    }
    Ok(best)
}

/// Candidates of one MIME type, as `(url, width)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeGroup {
    pub mime: &'static str,
    pub sources: Vec<(String, u32)>,
}

impl MimeGroup {
    /// `"<url> <width>w"` descriptors joined by `", "`.
    pub fn srcset(&self) -> String {
        self.sources
            .iter()
            .map(|(url, width)| format!("{url} {width}w"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Group candidates by MIME type. Groups and their entries keep first-seen
/// order.
pub fn group_by_mime(
    candidates: &[CandidateSize],
    resolver: &PathResolver,
) -> Result<Vec<MimeGroup>, RenderError> {
    let mut groups: Vec<MimeGroup> = Vec::new();
    for candidate in candidates {
        let mime = candidate.mime()?;
        let source = (resolver.url_for_attachment(&candidate.id), candidate.width);
        match groups.iter_mut().find(|g| g.mime == mime) {
            Some(group) => group.sources.push(source),
            None => groups.push(MimeGroup {
                mime,
                sources: vec![source],
            }),
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::id::{IdKind, encode_variant_id};
    use crate::imaging::{ImageFormat, ImageMeta};

    const LADDER: &[u32] = &[50, 200, 500, 1000, 1500, 2000];

    fn image(path: &str) -> ContentId {
        ContentId::new(IdKind::Image, path)
    }

    fn catalog_with(entries: &[(&str, u32)]) -> Catalog {
        let mut catalog = Catalog::default();
        for &(path, width) in entries {
            let format = ImageFormat::from_extension(mime::extension_of(path)).unwrap();
            catalog.insert(
                image(path),
                ImageMeta {
                    width,
                    height: width / 2,
                    format,
                },
                LADDER,
            );
        }
        catalog
    }

    fn candidate(path: &str, width: u32) -> CandidateSize {
        CandidateSize {
            id: image(path),
            ext: mime::extension_of(path).to_string(),
            width,
        }
    }

    fn widths(candidates: &[CandidateSize]) -> Vec<u32> {
        candidates.iter().map(|c| c.width).collect()
    }

    // =========================================================================
    // available_sizes
    // =========================================================================

    #[test]
    fn sizes_are_variants_then_base() {
        let catalog = catalog_with(&[("p/cat.jpg", 1200)]);
        let sizes = available_sizes(&image("p/cat.jpg"), &catalog.image_metas, &catalog.scaled_image_ids);

        assert_eq!(widths(&sizes), vec![50, 200, 500, 1000, 1200]);
        assert_eq!(sizes.last().unwrap().id, image("p/cat.jpg"));
        assert!(sizes.iter().all(|c| c.ext == "jpg"));
    }

    #[test]
    fn base_is_included_without_variants() {
        let catalog = catalog_with(&[("tiny.png", 40)]);
        let sizes = available_sizes(&image("tiny.png"), &catalog.image_metas, &catalog.scaled_image_ids);
        assert_eq!(sizes, vec![candidate("tiny.png", 40)]);
    }

    #[test]
    fn size_count_is_one_plus_matching_variants() {
        let catalog = catalog_with(&[("a.jpg", 600), ("b.jpg", 3000)]);
        let a = available_sizes(&image("a.jpg"), &catalog.image_metas, &catalog.scaled_image_ids);
        let b = available_sizes(&image("b.jpg"), &catalog.image_metas, &catalog.scaled_image_ids);
        assert_eq!(a.len(), 1 + 3);
        assert_eq!(b.len(), 1 + 6);
    }

    #[test]
    fn unknown_target_has_no_sizes() {
        let catalog = catalog_with(&[("a.jpg", 600)]);
        let sizes = available_sizes(&image("missing.jpg"), &catalog.image_metas, &catalog.scaled_image_ids);
        assert!(sizes.is_empty());
    }

    #[test]
    fn variants_of_similar_names_do_not_leak() {
        let catalog = catalog_with(&[("a.jpg", 600), ("aa.jpg", 600)]);
        let mut scaled = catalog.scaled_image_ids.clone();
        // Not decodable as a variant: ignored
        scaled.push(ContentId::new(IdKind::ScaledImage, "a.jpg.v9-50w.jpg"));

        let sizes = available_sizes(&image("a.jpg"), &catalog.image_metas, &scaled);
        assert!(sizes.iter().all(|c| !c.id.path().starts_with("aa.jpg")));
        assert_eq!(sizes.len(), 4);
    }

    // =========================================================================
    // fallback_candidate
    // =========================================================================

    #[test]
    fn fallback_is_largest_not_exceeding_ceiling() {
        let catalog = catalog_with(&[("p/cat.jpg", 1200)]);
        let sizes = available_sizes(&image("p/cat.jpg"), &catalog.image_metas, &catalog.scaled_image_ids);
        let chosen = fallback_candidate(&sizes, "/content/p/cat.jpg", 500).unwrap();
        assert_eq!(chosen.width, 500);
        assert_eq!(chosen.id, encode_variant_id(&image("p/cat.jpg"), 500));
    }

    #[test]
    fn fallback_defaults_to_smallest() {
        let sizes = vec![candidate("a.jpg", 1600), candidate("a.jpg", 800)];
        assert_eq!(fallback_candidate(&sizes, "a.jpg", 500).unwrap().width, 800);
    }

    #[test]
    fn fallback_ignores_insertion_order() {
        let sizes = vec![
            candidate("a.jpg", 1000),
            candidate("a.jpg", 50),
            candidate("a.jpg", 400),
            candidate("a.jpg", 200),
        ];
        assert_eq!(fallback_candidate(&sizes, "a.jpg", 500).unwrap().width, 400);
    }

    #[test]
    fn fallback_is_idempotent() {
        let catalog = catalog_with(&[("x.png", 2500)]);
        let sizes = available_sizes(&image("x.png"), &catalog.image_metas, &catalog.scaled_image_ids);
        let first = fallback_candidate(&sizes, "x.png", 500).unwrap();
        let second = fallback_candidate(&sizes, "x.png", 500).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn fallback_matches_mime_not_extension() {
        let sizes = vec![candidate("a.jpeg", 300), candidate("a.png", 450)];
        assert_eq!(fallback_candidate(&sizes, "a.jpg", 500).unwrap().width, 300);
    }

    #[test]
    fn fallback_respects_configured_ceiling() {
        let sizes = vec![candidate("a.jpg", 200), candidate("a.jpg", 1000)];
        assert_eq!(fallback_candidate(&sizes, "a.jpg", 1000).unwrap().width, 1000);
        assert_eq!(fallback_candidate(&sizes, "a.jpg", 999).unwrap().width, 200);
    }

    #[test]
    fn fallback_without_same_mime_fails() {
        let sizes = vec![candidate("a.png", 300)];
        assert_eq!(
            fallback_candidate(&sizes, "/content/a.jpg", 500),
            Err(RenderError::FallbackNotFound {
                url: "/content/a.jpg".into()
            })
        );
    }

    #[test]
    fn fallback_unknown_requested_mime_fails() {
        let sizes = vec![candidate("a.jpg", 300)];
        assert!(matches!(
            fallback_candidate(&sizes, "a.bmp", 500),
            Err(RenderError::UnknownMime(_))
        ));
    }

    // =========================================================================
    // group_by_mime
    // =========================================================================

    #[test]
    fn groups_in_first_seen_order() {
        let resolver = PathResolver::new("/site", "/content");
        let sizes = vec![
            candidate("a.webp", 200),
            candidate("a.jpg", 200),
            candidate("a.webp", 500),
            candidate("a.jpeg", 500),
        ];
        let groups = group_by_mime(&sizes, &resolver).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].mime, "image/webp");
        assert_eq!(groups[0].srcset(), "/content/a.webp 200w, /content/a.webp 500w");
        assert_eq!(groups[1].mime, "image/jpeg");
        assert_eq!(groups[1].srcset(), "/content/a.jpg 200w, /content/a.jpeg 500w");
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let resolver = PathResolver::new("/site", "/content");
        let sizes = vec![candidate("a.jpg", 200), candidate("a.tiff", 500)];
        assert_eq!(
            group_by_mime(&sizes, &resolver),
            Err(RenderError::UnknownMime(MimeError::Unknown("tiff".into())))
        );
    }
}
