//! The universe of known images.
//!
//! Rendering needs to know, for every image a post may reference, its
//! metadata and the ids of the variants that exist for it. The catalog is
//! that list. It is built by walking the content root, identifying each
//! image (header read only), and deriving the variant ids from the ladder.
//! No pixels are decoded, so a catalog is cheap to rebuild.
//!
//! Files that are themselves generated variants (`*.v1-500w.jpg`) are
//! skipped, so a content root that also holds build output scans cleanly.
//!
//! An image that cannot be identified is left out of the catalog and reported
//! in [`CatalogScan::failures`]. Posts that never reference it still render;
//! posts that do get [`ContentNotFound`](crate::render::RenderError::ContentNotFound).

use crate::config::ImagesConfig;
use crate::id::{
    ContentId, IdError, IdKind, PathResolver, decode_variant_id, encode_variant_id, is_image_path,
};
use crate::imaging::{BackendError, ImageBackend, ImageMeta, plan_variants};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Failed to identify {path}: {source}")]
    Backend {
        path: PathBuf,
        source: BackendError,
    },
    #[error(transparent)]
    Id(#[from] IdError),
}

/// Metadata of one base image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ContentId,
    pub meta: ImageMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub image_metas: Vec<ImageRecord>,
    pub scaled_image_ids: Vec<ContentId>,
}

impl Catalog {
    pub fn meta_for(&self, id: &ContentId) -> Option<&ImageMeta> {
        self.image_metas
            .iter()
            .find(|record| &record.id == id)
            .map(|record| &record.meta)
    }

    /// Add a base image and the ids of its planned variants.
    pub fn insert(&mut self, id: ContentId, meta: ImageMeta, ladder: &[u32]) {
        self.scaled_image_ids.extend(
            plan_variants(&meta, ladder)
                .iter()
                .map(|spec| encode_variant_id(&id, spec.width)),
        );
        self.image_metas.push(ImageRecord { id, meta });
    }
}

/// Outcome of a scan: every image that could be identified, plus one error
/// per image that could not.
#[derive(Debug, Default)]
pub struct CatalogScan {
    pub catalog: Catalog,
    pub failures: Vec<CatalogError>,
}

/// Walk the content root and catalog every image in it.
///
/// Traversal is sorted by file name, so the output is deterministic. Only a
/// failure to walk the tree fails the scan; unidentifiable images land in
/// [`CatalogScan::failures`].
pub fn scan_catalog(
    backend: &impl ImageBackend,
    resolver: &PathResolver,
    config: &ImagesConfig,
) -> Result<CatalogScan, CatalogError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(resolver.content_root()).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let id = resolver.path_to_id(IdKind::Image, entry.path())?;
        if !is_image_path(id.path(), &config.extensions) {
            continue;
        }
        if decode_variant_id(&id.with_kind(IdKind::ScaledImage)).is_some() {
            debug!(path = %entry.path().display(), "skipping generated variant");
            continue;
        }
        found.push((id, entry.into_path()));
    }

    let identified: Vec<_> = found
        .into_par_iter()
        .map(|(id, path)| match backend.identify(&path) {
            Ok(meta) => Ok((id, meta)),
            Err(source) => Err(CatalogError::Backend { path, source }),
        })
        .collect();

    let mut scan = CatalogScan::default();
    for result in identified {
        match result {
            Ok((id, meta)) => scan.catalog.insert(id, meta, &config.widths),
            Err(err) => {
                warn!(error = %err, "leaving image out of the catalog");
                scan.failures.push(err);
            }
        }
    }
    debug!(
        images = scan.catalog.image_metas.len(),
        variants = scan.catalog.scaled_image_ids.len(),
        failures = scan.failures.len(),
        "scanned catalog"
    );
    Ok(scan)
}
