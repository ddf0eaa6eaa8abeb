//! Markdown image rendering.
//!
//! Turns `![caption](url)` tokens into responsive `<picture>` markup, plain
//! `<img>` tags, or video embeds. Everything here is synchronous and pure:
//! the facts about which images and variants exist come from a
//! [`Catalog`](crate::catalog::Catalog) built beforehand.
//!
//! - [`caption`]: `text|nolink|left` directive parsing
//! - [`candidates`]: which sizes exist for an image, and which one is the fallback
//! - [`markup`]: the HTML fragments, built with maud
//! - [`rule`]: the [`ImageRule`] hook and the pulldown-cmark driver

pub mod candidates;
pub mod caption;
pub mod markup;
pub mod rule;

pub use candidates::{CandidateSize, MimeGroup, available_sizes, fallback_candidate, group_by_mime};
pub use caption::{Align, CaptionDirectives};
pub use rule::{ImageRule, ImageToken, PostImageRule, render_markdown};

use crate::id::IdError;
use crate::mime::MimeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Image with url {url:?} not found")]
    ContentNotFound { url: String },
    #[error(transparent)]
    UnknownMime(#[from] MimeError),
    #[error("No candidate shares the format of {url:?}")]
    FallbackNotFound { url: String },
    #[error(transparent)]
    Id(#[from] IdError),
}
