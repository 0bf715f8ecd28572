//! Caption resolution.
//!
//! A slide's caption comes from the first available source:
//!
//! 1. a caption block immediately following the media item,
//! 2. the item's caption attribute,
//! 3. the item's fallback text attribute (alt text),
//! 4. nothing.
//!
//! Whatever wins is passed through a [`TextTransform`]. The stock transform
//! renders markdown with `pulldown-cmark`; [`Identity`] leaves text alone and
//! is what callers get when they have no transform to offer.

use pulldown_cmark::{Parser, html as md_html};

/// Rewrites raw caption text into display markup.
pub trait TextTransform {
    fn render(&self, markup: &str) -> String;
}

/// Passes caption text through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl TextTransform for Identity {
    fn render(&self, markup: &str) -> String {
        markup.to_string()
    }
}

/// Renders caption text as CommonMark. Inline HTML passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Markdown;

impl TextTransform for Markdown {
    fn render(&self, markup: &str) -> String {
        let parser = Parser::new(markup);
        let mut out = String::new();
        md_html::push_html(&mut out, parser);
        out
    }
}

/// Caption candidates gathered for one media item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionSources {
    /// Inner markup of a caption block following the item, already trimmed.
    pub block: Option<String>,
    /// Value of the caption attribute.
    pub attribute: Option<String>,
    /// Value of the fallback text attribute.
    pub fallback: Option<String>,
}

/// Pick the caption for one item and run it through `transform`.
///
/// A caption block always wins, even when empty.
/// Attributes only count when non-empty. With no transform the text is used
/// as-is.
pub fn resolve_caption(sources: &CaptionSources, transform: Option<&dyn TextTransform>) -> String {
    let transform = transform.unwrap_or(&Identity);
    if let Some(block) = &sources.block {
        return if block.is_empty() {
            String::new()
        } else {
            transform.render(block)
        };
    }
    [&sources.attribute, &sources.fallback]
        .into_iter()
        .flatten()
        .find(|text| !text.is_empty())
        .map(|text| transform.render(text))
        .unwrap_or_default()
}
