//! The markdown image hook.
//!
//! [`render_markdown`] drives pulldown-cmark and hands every image it meets
//! to an [`ImageRule`], splicing the returned HTML in place of the image.
//! [`PostImageRule`] is the production rule: it resolves post attachments
//! against the catalog and emits responsive `<picture>` markup.
//!
//! | Reference | Output |
//! |---|---|
//! | external, YouTube | video embed |
//! | external, other | plain `<img>` |
//! | internal, not an image | plain `<img>` |
//! | internal image, unknown | [`RenderError::ContentNotFound`] |
//! | internal image, known | `<picture>` |
//!
//! Everything except the video embed is wrapped in a link to the full-size
//! URL unless the caption says `nolink`.

use super::RenderError;
use super::candidates::{available_sizes, fallback_candidate, group_by_mime};
use super::caption::CaptionDirectives;
use super::markup::{ImgAttrs, maybe_link, picture, plain_img, youtube_embed};
use crate::catalog::Catalog;
use crate::config::SiteConfig;
use crate::id::{
    ContentId, IdKind, PathResolver, is_external_url, is_image_path, post_attachment_id,
    youtube_video_id,
};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};

/// An image as it appears in markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageToken {
    /// Destination URL, as written.
    pub src: String,
    /// Flattened alt text: the raw caption, directives included.
    pub content: String,
}

pub trait ImageRule {
    fn render(&self, token: &ImageToken) -> Result<String, RenderError>;
}

/// Renders the images of one post.
pub struct PostImageRule<'a> {
    pub post_id: &'a ContentId,
    pub catalog: &'a Catalog,
    pub resolver: &'a PathResolver,
    pub config: &'a SiteConfig,
}

impl<'a> PostImageRule<'a> {
    pub fn new(
        post_id: &'a ContentId,
        catalog: &'a Catalog,
        resolver: &'a PathResolver,
        config: &'a SiteConfig,
    ) -> Self {
        Self {
            post_id,
            catalog,
            resolver,
            config,
        }
    }

    fn render_picture(
        &self,
        image_id: &ContentId,
        url: &str,
        caption: &CaptionDirectives,
    ) -> Result<String, RenderError> {
        let candidates = available_sizes(
            image_id,
            &self.catalog.image_metas,
            &self.catalog.scaled_image_ids,
        );
        if candidates.is_empty() {
            return Err(RenderError::ContentNotFound {
                url: url.to_string(),
            });
        }

        let groups = group_by_mime(&candidates, self.resolver)?;
        let fallback = fallback_candidate(&candidates, url, self.config.render.fallback_max_width)?;
        let fallback_url = self.resolver.url_for_attachment(&fallback.id);
        let dimensions = self
            .catalog
            .meta_for(image_id)
            .map(|meta| (meta.width, meta.height));

        let markup = picture(
            &groups,
            ImgAttrs {
                src: &fallback_url,
                caption: &caption.text,
                align: caption.align,
                dimensions,
            },
        );
        Ok(maybe_link(url, markup, caption.render_as_link).into_string())
    }
}

fn render_plain(url: &str, caption: &CaptionDirectives) -> String {
    let img = plain_img(ImgAttrs {
        src: url,
        caption: &caption.text,
        align: caption.align,
        dimensions: None,
    });
    maybe_link(url, img, caption.render_as_link).into_string()
}

impl ImageRule for PostImageRule<'_> {
    fn render(&self, token: &ImageToken) -> Result<String, RenderError> {
        let caption = CaptionDirectives::parse(&token.content);

        if is_external_url(&token.src) {
            if let Some(video_id) = youtube_video_id(&token.src) {
                return Ok(youtube_embed(&video_id, caption.align).into_string());
            }
            return Ok(render_plain(&token.src, &caption));
        }

        let image_id = post_attachment_id(self.post_id, &token.src, IdKind::Image)?;
        let url = self.resolver.url_for_attachment(&image_id);
        if !is_image_path(image_id.path(), &self.config.images.extensions) {
            return Ok(render_plain(&url, &caption));
        }
        self.render_picture(&image_id, &url, &caption)
    }
}

/// Render markdown to HTML, replacing every image with the rule's output.
///
/// The first error aborts the whole render; no partial HTML is returned.
pub fn render_markdown(markdown: &str, rule: &dyn ImageRule) -> Result<String, RenderError> {
    let mut events = Vec::new();
    let mut pending: Option<ImageToken> = None;
    // Images nested in an image's alt text only contribute their text.
    let mut nested = 0usize;

    for event in Parser::new_ext(markdown, Options::empty()) {
        if pending.is_none() {
            match event {
                Event::Start(Tag::Image { dest_url, .. }) => {
                    pending = Some(ImageToken {
                        src: dest_url.into_string(),
                        content: String::new(),
                    });
                }
                other => events.push(other),
            }
            continue;
        }
        let Some(token) = pending.as_mut() else {
            continue;
        };
        match event {
            Event::Start(Tag::Image { .. }) => nested += 1,
            Event::End(TagEnd::Image) if nested > 0 => nested -= 1,
            Event::End(TagEnd::Image) => {
                let html = rule.render(token)?;
                events.push(Event::InlineHtml(html.into()));
                pending = None;
            }
            Event::Text(text) | Event::Code(text) => token.content.push_str(&text),
            Event::SoftBreak | Event::HardBreak => token.content.push(' '),
            _ => {}
        }
    }

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    Ok(out)
}
