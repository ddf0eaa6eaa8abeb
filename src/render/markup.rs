//! HTML fragments for rendered images.
//!
//! Pure functions over already-resolved facts. Attribute values are escaped
//! by maud.

use super::candidates::MimeGroup;
use super::caption::Align;
use maud::{Markup, html};

/// Fallback `<img>` attributes shared by the plain and picture forms.
#[derive(Debug, Clone, Copy)]
pub struct ImgAttrs<'a> {
    pub src: &'a str,
    /// Used for both `title` and `alt`.
    pub caption: &'a str,
    pub align: Option<Align>,
    /// Intrinsic `(width, height)` of the base image, when known.
    pub dimensions: Option<(u32, u32)>,
}

fn img(attrs: ImgAttrs<'_>) -> Markup {
    html! {
        img src=(attrs.src)
            title=(attrs.caption)
            alt=(attrs.caption)
            class=[attrs.align.map(Align::as_str)]
            width=[attrs.dimensions.map(|(w, _)| w)]
            height=[attrs.dimensions.map(|(_, h)| h)];
    }
}

pub fn plain_img(attrs: ImgAttrs<'_>) -> Markup {
    img(attrs)
}

/// `<picture>` with one `<source>` per MIME group and the fallback `<img>`.
pub fn picture(groups: &[MimeGroup], fallback: ImgAttrs<'_>) -> Markup {
    html! {
        picture {
            @for group in groups {
                source type=(group.mime) srcset=(group.srcset());
            }
            (img(fallback))
        }
    }
}

pub fn link_wrap(href: &str, inner: Markup) -> Markup {
    html! {
        a href=(href) target="_blank" { (inner) }
    }
}

/// Wrap in a link only when asked to.
pub fn maybe_link(href: &str, inner: Markup, render_as_link: bool) -> Markup {
    if render_as_link {
        link_wrap(href, inner)
    } else {
        inner
    }
}

pub fn youtube_embed(video_id: &str, align: Option<Align>) -> Markup {
    let class = match align {
        Some(align) => format!("youtube video {}", align.as_str()),
        None => "youtube video".to_string(),
    };
    let src = format!("https://www.youtube.com/embed/{video_id}?modestbranding=1&showinfo=0&rel=0");
    html! {
        div class=(class) {
            iframe type="text/html" src=(src) frameborder="0" allowfullscreen="allowfullscreen" {}
        }
    }
}
