//! Content identifiers and their mapping to paths and URLs.
//!
//! Every unit of content is keyed by a [`ContentId`] of the form
//! `<kind>@<path>`, where `<path>` is relative to the content root and always
//! uses forward slashes:
//!
//! ```text
//! post@posts/2019-cats/index.md
//! image@posts/2019-cats/tabby.jpg
//! imageMeta@posts/2019-cats/tabby.jpg
//! scaledImage@posts/2019-cats/tabby.jpg.v1-500w.jpg
//! ```
//!
//! ## Variant ids
//!
//! Generated images embed their origin in their own path. The encoding is
//! explicit and versioned so it can be decoded without any lookup:
//!
//! ```text
//! <original path>.v<version>-<width>w.<original ext>
//! ```
//!
//! [`encode_variant_id`] and [`decode_variant_id`] are exact inverses. Ids
//! written with an unknown version decode to `None` rather than being guessed.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::mime;

/// Current version of the variant id encoding.
pub const VARIANT_ENCODING_VERSION: u32 = 1;

/// Bytes escaped in attachment URL path segments. Besides the usual URL
/// delimiters this covers space and comma, which separate `srcset` entries.
const URL_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b',')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Malformed content id: {0:?}")]
    Malformed(String),
    #[error("Unknown content kind: {0:?}")]
    UnknownKind(String),
    #[error("Path escapes the content root: {0}")]
    EscapesRoot(String),
    #[error("Path is outside the content root: {0}")]
    OutsideRoot(PathBuf),
    #[error("Not an attachment URL: {0}")]
    NotAttachmentUrl(String),
}

/// What a [`ContentId`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Post,
    Image,
    /// Same file as [`IdKind::Image`], but built as a metadata-only probe.
    ImageMeta,
    ScaledImage,
    File,
}

impl IdKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IdKind::Post => "post",
            IdKind::Image => "image",
            IdKind::ImageMeta => "imageMeta",
            IdKind::ScaledImage => "scaledImage",
            IdKind::File => "file",
        }
    }

    pub fn parse(s: &str) -> Result<Self, IdError> {
        match s {
            "post" => Ok(IdKind::Post),
            "image" => Ok(IdKind::Image),
            "imageMeta" => Ok(IdKind::ImageMeta),
            "scaledImage" => Ok(IdKind::ScaledImage),
            "file" => Ok(IdKind::File),
            other => Err(IdError::UnknownKind(other.to_string())),
        }
    }
}

/// Opaque, stable key for a unit of content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Build an id from a kind and a content-root-relative path.
    ///
    /// Backslashes are normalized to `/` and leading slashes are dropped.
    pub fn new(kind: IdKind, path: &str) -> Self {
        let path = path.replace('\\', "/");
        Self(format!("{}@{}", kind.as_str(), path.trim_start_matches('/')))
    }

    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let (kind, path) = raw
            .split_once('@')
            .ok_or_else(|| IdError::Malformed(raw.to_string()))?;
        if path.is_empty() {
            return Err(IdError::Malformed(raw.to_string()));
        }
        Ok(Self::new(IdKind::parse(kind)?, path))
    }

    pub fn kind(&self) -> IdKind {
        // Constructors guarantee a valid prefix.
        let (kind, _) = self.0.split_once('@').unwrap_or(("file", ""));
        IdKind::parse(kind).unwrap_or(IdKind::File)
    }

    pub fn path(&self) -> &str {
        self.0.split_once('@').map(|(_, p)| p).unwrap_or("")
    }

    /// Same path, different kind.
    pub fn with_kind(&self, kind: IdKind) -> Self {
        Self::new(kind, self.path())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

// ============================================================================
// Variant id encoding
// ============================================================================

/// Derive the id of the generated variant of `original` at `width`.
pub fn encode_variant_id(original: &ContentId, width: u32) -> ContentId {
    let path = original.path();
    let ext = mime::extension_of(path);
    let encoded = if ext.is_empty() {
        format!("{path}.v{VARIANT_ENCODING_VERSION}-{width}w")
    } else {
        format!("{path}.v{VARIANT_ENCODING_VERSION}-{width}w.{ext}")
    };
    ContentId::new(IdKind::ScaledImage, &encoded)
}

/// Recover `(original image id, width)` from a variant id.
///
/// Returns `None` for ids that are not scaled images or that were written with
/// a different encoding version.
pub fn decode_variant_id(id: &ContentId) -> Option<(ContentId, u32)> {
    if id.kind() != IdKind::ScaledImage {
        return None;
    }
    let marker = format!(".v{VARIANT_ENCODING_VERSION}-");
    let (original, rest) = id.path().rsplit_once(marker.as_str())?;
    let (width_part, ext) = match rest.split_once('.') {
        Some((w, ext)) => (w, Some(ext)),
        None => (rest, None),
    };
    let width: u32 = width_part.strip_suffix('w')?.parse().ok()?;

    let original_ext = mime::extension_of(original);
    match ext {
        Some(ext) if ext != original_ext => return None,
        None if !original_ext.is_empty() => return None,
        _ => {}
    }
    if original.is_empty() {
        return None;
    }
    Some((ContentId::new(IdKind::Image, original), width))
}

// ============================================================================
// Post attachments
// ============================================================================

/// Resolve an attachment URL found in a post against that post's location.
///
/// A post id may name a markdown file (`posts/cats/index.md`) or the post's
/// directory (`posts/cats`). Relative URLs resolve against that directory,
/// absolute ones (`/shared/logo.png`) against the content root. Segments are
/// percent-decoded first, then `.` and `..` are resolved lexically; escaping
/// the root is an error.
pub fn post_attachment_id(
    post_id: &ContentId,
    relative_url: &str,
    kind: IdKind,
) -> Result<ContentId, IdError> {
    let url_path = relative_url
        .split(['?', '#'])
        .next()
        .unwrap_or(relative_url);

    let mut segments: Vec<String> = Vec::new();
    if !url_path.starts_with('/') {
        let post_path = post_id.path();
        let post_dir = if mime::extension_of(post_path).eq_ignore_ascii_case("md") {
            post_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
        } else {
            post_path
        };
        segments.extend(
            post_dir
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }

    for raw in url_path.split('/') {
        let segment = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| IdError::Malformed(relative_url.to_string()))?;
        match &*segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(IdError::EscapesRoot(relative_url.to_string()));
                }
            }
            s if s.contains(['/', '\\']) => {
                return Err(IdError::Malformed(relative_url.to_string()));
            }
            s => segments.push(s.to_string()),
        }
    }

    if segments.is_empty() {
        return Err(IdError::Malformed(relative_url.to_string()));
    }
    Ok(ContentId::new(kind, &segments.join("/")))
}

/// Whether a content path names an image in one of the configured formats.
pub fn is_image_path(path: &str, extensions: &[String]) -> bool {
    let ext = mime::extension_of(path);
    !ext.is_empty() && extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

// ============================================================================
// Path and URL resolution
// ============================================================================

/// Maps ids to filesystem paths under a content root and to public URLs.
#[derive(Debug, Clone)]
pub struct PathResolver {
    content_root: PathBuf,
    url_prefix: String,
}

impl PathResolver {
    pub fn new(content_root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            content_root: content_root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    pub fn id_to_path(&self, id: &ContentId) -> PathBuf {
        self.content_root.join(id.path())
    }

    pub fn path_to_id(&self, kind: IdKind, path: &Path) -> Result<ContentId, IdError> {
        let relative = path
            .strip_prefix(&self.content_root)
            .map_err(|_| IdError::OutsideRoot(path.to_path_buf()))?;
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(s) => segments.push(s.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return Err(IdError::OutsideRoot(path.to_path_buf())),
            }
        }
        if segments.is_empty() {
            return Err(IdError::OutsideRoot(path.to_path_buf()));
        }
        Ok(ContentId::new(kind, &segments.join("/")))
    }

    /// Public URL under which an attachment is served, with each path
    /// segment percent-encoded.
    pub fn url_for_attachment(&self, id: &ContentId) -> String {
        let encoded: Vec<String> = id
            .path()
            .split('/')
            .map(|segment| utf8_percent_encode(segment, URL_SEGMENT).to_string())
            .collect();
        format!("{}/{}", self.url_prefix, encoded.join("/"))
    }

    /// Inverse of [`url_for_attachment`](Self::url_for_attachment): the
    /// decoded content path of an attachment URL.
    pub fn url_to_path(&self, url: &str) -> Result<String, IdError> {
        let rest = url
            .strip_prefix(&self.url_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| IdError::NotAttachmentUrl(url.to_string()))?;
        percent_decode_str(rest)
            .decode_utf8()
            .map(|path| path.into_owned())
            .map_err(|_| IdError::NotAttachmentUrl(url.to_string()))
    }
}

// ============================================================================
// External URLs
// ============================================================================

/// True for URLs with a scheme (`https:`, `mailto:`, …) or protocol-relative
/// URLs (`//host/path`).
pub fn is_external_url(url: &str) -> bool {
    url.starts_with("//") || Url::parse(url).is_ok()
}

const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

fn parse_external(url: &str) -> Option<Url> {
    if url.starts_with("//") {
        Url::parse(&format!("https:{url}")).ok()
    } else {
        Url::parse(url).ok()
    }
}

/// Extract the video id from a YouTube watch, embed, shorts or short-link URL.
pub fn youtube_video_id(url: &str) -> Option<String> {
    let parsed = parse_external(url)?;
    let host = parsed.host_str()?;
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

    let id = if host == "youtu.be" {
        segments.next().map(str::to_string)
    } else if YOUTUBE_HOSTS.contains(&host) {
        match segments.next() {
            Some("watch") => parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("embed" | "shorts" | "v" | "live") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };
    id.filter(|id| !id.is_empty())
}
