//! Content builds for image ids.
//!
//! An image path can be built two ways, selected by the kind of the id being
//! requested:
//!
//! | Requested id | Build | Output |
//! |---|---|---|
//! | `imageMeta@<path>` | metadata probe | `{id, meta, scaled_image_list}` |
//! | `image@<path>` | full build | compressed base + every variant |
//!
//! The probe reads only the image header and derives the variant ids from
//! the ladder; it never touches pixels. The full build runs the scaling
//! engine. [`persist`] writes a full build to disk, each file at the path of
//! its id.

use crate::config::ImagesConfig;
use crate::id::{ContentId, IdKind, PathResolver, encode_variant_id};
use crate::imaging::{
    BackendError, BuiltImage, ImageBackend, ImageMeta, Quality, build_image, get_meta,
    plan_variants,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// A failed build. Always names the content id it was building.
#[derive(Error, Debug)]
#[error("Failed to build {id}: {source}")]
pub struct BuildError {
    pub id: ContentId,
    pub source: BuildFailure,
}

#[derive(Error, Debug)]
pub enum BuildFailure {
    #[error("{0}")]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} ids are not image content")]
    NotAnImage(&'static str),
}

/// Which build an id asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    ImageMeta,
    Image,
}

impl ContentKind {
    /// Discriminate on the id's kind. `None` for non-image ids.
    pub fn of(id: &ContentId) -> Option<Self> {
        match id.kind() {
            IdKind::ImageMeta => Some(ContentKind::ImageMeta),
            IdKind::Image => Some(ContentKind::Image),
            _ => None,
        }
    }
}

/// Output of a metadata probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMetaContent {
    /// Always the `image@` id of the probed file.
    pub id: ContentId,
    pub meta: ImageMeta,
    /// Ids of the variants a full build would produce, in ladder order.
    pub scaled_image_list: Vec<ContentId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageContent {
    Meta(ImageMetaContent),
    Full(BuiltImage),
}

/// Build the content for `id` as the given kind.
pub fn build_content(
    backend: &impl ImageBackend,
    resolver: &PathResolver,
    id: &ContentId,
    kind: ContentKind,
    config: &ImagesConfig,
) -> Result<ImageContent, BuildError> {
    let wrap = |source: BuildFailure| BuildError {
        id: id.clone(),
        source,
    };
    if ContentKind::of(id).is_none() {
        return Err(wrap(BuildFailure::NotAnImage(id.kind().as_str())));
    }

    let image_id = id.with_kind(IdKind::Image);
    let source = resolver.id_to_path(&image_id);
    let meta = get_meta(backend, &source).map_err(|e| wrap(e.into()))?;
    let specs = plan_variants(&meta, &config.widths);

    match kind {
        ContentKind::ImageMeta => {
            let scaled_image_list = specs
                .iter()
                .map(|spec| encode_variant_id(&image_id, spec.width))
                .collect();
            Ok(ImageContent::Meta(ImageMetaContent {
                id: image_id,
                meta,
                scaled_image_list,
            }))
        }
        ContentKind::Image => {
            let built = build_image(backend, &source, meta, &specs, Quality::new(config.quality))
                .map_err(|e| wrap(e.into()))?;
            info!(
                id = %image_id,
                width = meta.width,
                height = meta.height,
                variants = built.scaled.len(),
                "built image"
            );
            Ok(ImageContent::Full(built))
        }
    }
}

/// Write a full build under `out_dir`: the base at the image's own path and
/// each variant at the path of its derived id. Returns the written paths,
/// base first.
pub fn persist(
    built: &BuiltImage,
    id: &ContentId,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, BuildError> {
    let image_id = id.with_kind(IdKind::Image);
    let write = |target: &ContentId, bytes: &[u8]| -> Result<PathBuf, BuildError> {
        let path = out_dir.join(target.path());
        let result = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&path, bytes));
        result.map_err(|e| BuildError {
            id: target.clone(),
            source: e.into(),
        })?;
        Ok(path)
    };

    let mut written = Vec::with_capacity(built.scaled.len() + 1);
    written.push(write(&image_id, &built.content)?);
    for scaled in &built.scaled {
        let variant_id = encode_variant_id(&image_id, scaled.width);
        written.push(write(&variant_id, &scaled.content)?);
    }
    info!(id = %image_id, files = written.len(), out = %out_dir.display(), "persisted image");
    Ok(written)
}
