//! File extension → MIME type lookup.
//!
//! A pure function over a static table. Unknown extensions are an error, never
//! a silent default: the `<source>` grouping in [`render`](crate::render)
//! depends on every candidate resolving to a real type.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MimeError {
    #[error("No MIME type known for extension {0:?}")]
    Unknown(String),
}

const MIME_TABLE: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("avif", "image/avif"),
    ("svg", "image/svg+xml"),
];

/// Resolve the MIME type for a file extension (without the dot).
///
/// Matching is ASCII case-insensitive: `JPG` and `jpg` resolve the same.
pub fn mime_for_extension(ext: &str) -> Result<&'static str, MimeError> {
    MIME_TABLE
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .ok_or_else(|| MimeError::Unknown(ext.to_string()))
}

/// Extension of the last path segment of a path or URL, without the dot.
///
/// Query strings and fragments are ignored. Returns `""` when there is none.
pub fn extension_of(path_or_url: &str) -> &str {
    let path = path_or_url
        .split(['?', '#'])
        .next()
        .unwrap_or(path_or_url);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}

/// MIME type for the extension of a path or URL.
pub fn mime_for_path(path_or_url: &str) -> Result<&'static str, MimeError> {
    mime_for_extension(extension_of(path_or_url))
}
