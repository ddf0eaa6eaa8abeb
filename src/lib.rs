//! # Folio
//!
//! The image half of a personal-site content pipeline. Source images live next
//! to the markdown posts that reference them; folio turns them into
//! responsive variants at build time and turns `![caption](image.jpg)` into
//! `<picture>` markup at render time.
//!
//! # Pipeline
//!
//! ```text
//! build time    image@posts/cats/tabby.jpg
//!                 identify ─► plan ladder ─► resize (parallel) + compress
//!                 └─► tabby.jpg, tabby.jpg.v1-50w.jpg, … tabby.jpg.v1-1000w.jpg
//!
//! render time   catalog (metas + variant ids) + post markdown
//!                 caption directives ─► candidates ─► fallback ─► <picture>
//! ```
//!
//! The two halves share nothing but ids. A variant's id encodes its original
//! and width, so rendering can work from a [`catalog::Catalog`] alone: no
//! filesystem access, no image decoding.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`id`] | Content ids, variant id encoding, post-relative resolution, URL classification |
//! | [`mime`] | Extension → MIME type table |
//! | [`imaging`] | Metadata, ladder planning, parallel resize and compression |
//! | [`content`] | Metadata probe and full build per image id, plus persisting the result |
//! | [`catalog`] | Walks the content root into the universe of known images |
//! | [`watch`] | Per-file change feed driven by content fingerprints |
//! | [`render`] | Caption directives, candidate selection and markdown image rendering |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Variants Only Scale Down
//!
//! The ladder (`50/200/500/1000/1500/2000` by default) is filtered to widths
//! strictly below the source width. The source itself is always a candidate,
//! so the largest entry in a `srcset` is the original, never an upscale.
//!
//! ## All-or-Nothing Builds
//!
//! Every variant of an image is produced in parallel on the rayon pool, and
//! compression of the base runs alongside. If any of them fails, the whole
//! build for that id fails and nothing is persisted. Builds of different ids
//! are independent.
//!
//! ## Rendering Fails Loudly
//!
//! A post that references an image the catalog does not know is an error,
//! not a broken `<img>`. The render aborts and returns no HTML.

pub mod catalog;
pub mod config;
pub mod content;
pub mod id;
pub mod imaging;
pub mod mime;
pub mod output;
pub mod render;
pub mod watch;
