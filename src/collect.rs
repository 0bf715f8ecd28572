//! Media collection: container children → slide records.
//!
//! A child is media when it is an `<img>` or carries the video attribute.
//! A child with the caption class directly after a media child is consumed
//! as that media's caption. Everything else is ignored.

use crate::caption::{CaptionSources, TextTransform, resolve_caption};
use crate::config::SlideshowConfig;
use crate::dom::{Document, NodeId};
use crate::probe::{Dimensions, DimensionProbe};
use crate::ratio;
use serde::Serialize;
use tracing::debug;

/// Class every generated video embed carries.
pub const VIDEO_CLASS: &str = "slideshow-video";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// An image slide's source element and what the ratio path needs from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMedia {
    /// The original `<img>` element, serialized unchanged.
    pub markup: String,
    pub src: String,
    pub alt: String,
    /// Percentage-width scale hint, if declared.
    pub scale: Option<f64>,
}

/// A video slide generated from a placeholder element.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMedia {
    pub id: String,
    /// Classes for the generated iframe, always ending with [`VIDEO_CLASS`].
    pub classes: Vec<String>,
    pub embed_src: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaHandle {
    Image(ImageMedia),
    Video(VideoMedia),
}

/// One slide, created once per recognized media item.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideRecord {
    pub handle: MediaHandle,
    /// Resolved caption markup, possibly empty.
    pub caption: String,
    /// Effective width/height ratio; `0.0` until the image has loaded.
    pub ratio: f64,
}

impl SlideRecord {
    pub fn kind(&self) -> MediaKind {
        match self.handle {
            MediaHandle::Image(_) => MediaKind::Image,
            MediaHandle::Video(_) => MediaKind::Video,
        }
    }

    /// Whether this slide still waits for its natural size.
    pub fn is_deferred(&self) -> bool {
        self.ratio <= 0.0
    }

    pub fn has_caption(&self) -> bool {
        !self.caption.trim().is_empty()
    }
}

/// Inputs the collector consults besides the document itself.
pub struct CollectContext<'a> {
    pub config: &'a SlideshowConfig,
    pub transform: Option<&'a dyn TextTransform>,
    pub probe: &'a dyn DimensionProbe,
}

/// Scan a container's children into slide records, in document order.
///
/// An empty result means "no slides": the caller builds nothing.
pub fn collect_slides(doc: &Document, container: NodeId, ctx: &CollectContext<'_>) -> Vec<SlideRecord> {
    let markup = &ctx.config.markup;
    let children = doc.element_children(container);
    let mut slides = Vec::with_capacity(children.len());

    let mut i = 0;
    while i < children.len() {
        let node = children[i];
        i += 1;

        let is_image = doc.tag(node) == Some("img");
        let is_video = !is_image && doc.has_attr(node, &markup.video_attribute);
        if !is_image && !is_video {
            continue;
        }

        let block = match children.get(i) {
            Some(&next) if doc.has_class(next, &markup.caption_class) => {
                i += 1;
                Some(doc.inner_html(next).trim().to_string())
            }
            _ => None,
        };

        let handle = if is_image {
            image_handle(doc, node)
        } else {
            video_handle(doc, node, ctx.config)
        };
        let Some(handle) = handle else {
            debug!(position = i, "dropping media item without a renderable source");
            continue;
        };

        let sources = CaptionSources {
            block,
            attribute: doc
                .attr(node, &markup.caption_attribute)
                .map(|v| v.into_owned()),
            fallback: doc
                .attr(node, &markup.fallback_attribute)
                .map(|v| v.into_owned()),
        };
        let caption = resolve_caption(&sources, ctx.transform);

        let ratio = match &handle {
            MediaHandle::Video(_) => ctx.config.video.default_ratio(),
            MediaHandle::Image(image) => initial_image_ratio(doc, node, image, ctx.probe),
        };
        if ratio <= 0.0 {
            debug!(src = %image_src(&handle), "image size unknown, deferring ratio");
        }

        slides.push(SlideRecord {
            handle,
            caption,
            ratio,
        });
    }

    slides
}

fn image_src(handle: &MediaHandle) -> &str {
    match handle {
        MediaHandle::Image(image) => &image.src,
        MediaHandle::Video(video) => &video.embed_src,
    }
}

fn image_handle(doc: &Document, node: NodeId) -> Option<MediaHandle> {
    let src = doc.attr(node, "src")?.trim().to_string();
    if src.is_empty() {
        return None;
    }
    let style_width = doc.inline_style(node, "width");
    let attr_width = doc.attr(node, "width");
    Some(MediaHandle::Image(ImageMedia {
        markup: doc.outer_html(node),
        alt: doc.attr(node, "alt").map(|v| v.into_owned()).unwrap_or_default(),
        scale: ratio::scale_hint(style_width.as_deref(), attr_width.as_deref()),
        src,
    }))
}

fn video_handle(doc: &Document, node: NodeId, config: &SlideshowConfig) -> Option<MediaHandle> {
    let id = doc.attr(node, &config.markup.video_attribute)?.trim().to_string();
    if id.is_empty() {
        return None;
    }
    let mut classes: Vec<String> = doc
        .classes(node)
        .into_iter()
        .filter(|c| c != VIDEO_CLASS)
        .collect();
    classes.push(VIDEO_CLASS.to_string());
    Some(MediaHandle::Video(VideoMedia {
        embed_src: config.video.embed_url(&id),
        id,
        classes,
    }))
}

/// Ratio known at collection time: natural size from the probe, else the
/// element's declared pixel `width`/`height`, else `0.0` (deferred).
fn initial_image_ratio(
    doc: &Document,
    node: NodeId,
    image: &ImageMedia,
    probe: &dyn DimensionProbe,
) -> f64 {
    let raw = match probe.identify(&image.src) {
        Ok(dims) => dims.ratio(),
        Err(e) => {
            debug!(src = %image.src, error = %e, "no natural size");
            None
        }
    }
    .or_else(|| {
        let w = ratio::parse_length(&doc.attr(node, "width")?)?;
        let h = ratio::parse_length(&doc.attr(node, "height")?)?;
        Some(w / h)
    });
    raw.map(|r| ratio::effective_ratio(r, image.scale))
        .unwrap_or(0.0)
}

/// Effective ratio of an image once its natural size is known.
pub fn loaded_image_ratio(image: &ImageMedia, natural: Dimensions) -> f64 {
    natural
        .ratio()
        .map(|r| ratio::effective_ratio(r, image.scale))
        .unwrap_or(0.0)
}
