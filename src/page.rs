//! Page-level widget discovery.
//!
//! A [`Page`] owns one parsed document and every carousel built on it.
//! [`Page::initialize`] scans for containers and builds a carousel for each
//! one not yet marked; the marker lives on the container element itself, so
//! running the scan again (the host fires its lifecycle hook after every
//! navigation) never builds a widget twice. [`Page::navigate`] models a host
//! transition: the old document and its widgets are dropped wholesale and
//! the scan runs on the new one.

use crate::caption::{Markdown, TextTransform};
use crate::carousel::{Carousel, Key, WidgetEvent};
use crate::collect::CollectContext;
use crate::config::SlideshowConfig;
use crate::dom::{Document, DomError, NodeId, Splice};
use crate::probe::DimensionProbe;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Document error: {0}")]
    Dom(#[from] DomError),
}

/// Counts from one initialization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Carousels built.
    pub built: usize,
    /// Containers marked but holding no media.
    pub empty: usize,
    /// Containers already marked by an earlier pass.
    pub skipped: usize,
}

#[derive(Debug)]
struct Widget {
    container: NodeId,
    carousel: Carousel,
}

pub struct Page {
    document: Document,
    widgets: Vec<Widget>,
    config: SlideshowConfig,
    transform: Option<Box<dyn TextTransform>>,
    next_instance: usize,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("widgets", &self.widgets)
            .field("has_transform", &self.transform.is_some())
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Parse a page. The caption transform follows `config.captions`.
    pub fn parse(html: &str, config: SlideshowConfig) -> Result<Self, PageError> {
        let transform: Option<Box<dyn TextTransform>> = if config.captions.markdown {
            Some(Box::new(Markdown))
        } else {
            None
        };
        Ok(Self {
            document: Document::parse(html)?,
            widgets: Vec::new(),
            config,
            transform,
            next_instance: 0,
        })
    }

    /// Replace the caption transform. `None` passes captions through unchanged.
    pub fn with_transform(mut self, transform: Option<Box<dyn TextTransform>>) -> Self {
        self.transform = transform;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &SlideshowConfig {
        &self.config
    }

    /// Build carousels for every unmarked container.
    pub fn initialize(&mut self, probe: &dyn DimensionProbe) -> InitReport {
        let markup = &self.config.markup;
        let marker = markup.initialized_attribute.clone();
        let mut report = InitReport::default();

        for container in self.document.find_by_class(&markup.container_class) {
            if self.document.attr(container, &marker).as_deref() == Some("true") {
                debug!(?container, "already initialized");
                report.skipped += 1;
                continue;
            }
            self.document.set_attr(container, &marker, "true");

            let ctx = CollectContext {
                config: &self.config,
                transform: self.transform.as_deref(),
                probe,
            };
            let instance = self.next_instance;
            match Carousel::build(&self.document, container, &ctx, instance) {
                Some(carousel) => {
                    info!(instance, slides = carousel.len(), "carousel built");
                    self.next_instance += 1;
                    self.widgets.push(Widget {
                        container,
                        carousel,
                    });
                    report.built += 1;
                }
                None => {
                    debug!(?container, "no media, leaving container untouched");
                    report.empty += 1;
                }
            }
        }

        report
    }

    /// Host navigation: drop the current document and widgets, load `html`,
    /// and scan again.
    pub fn navigate(
        &mut self,
        html: &str,
        probe: &dyn DimensionProbe,
    ) -> Result<InitReport, PageError> {
        self.document = Document::parse(html)?;
        self.widgets.clear();
        Ok(self.initialize(probe))
    }

    pub fn carousels(&self) -> impl Iterator<Item = &Carousel> {
        self.widgets.iter().map(|w| &w.carousel)
    }

    pub fn carousel_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn carousel(&self, index: usize) -> Option<&Carousel> {
        self.widgets.get(index).map(|w| &w.carousel)
    }

    pub fn carousel_mut(&mut self, index: usize) -> Option<&mut Carousel> {
        self.widgets.get_mut(index).map(|w| &mut w.carousel)
    }

    /// Deliver an event to one carousel. Returns false for an unknown index.
    pub fn dispatch(&mut self, index: usize, event: WidgetEvent) -> bool {
        match self.carousel_mut(index) {
            Some(carousel) => {
                carousel.handle(event);
                true
            }
            None => false,
        }
    }

    /// Deliver a key press to every carousel, as a document-level listener would.
    pub fn dispatch_key(&mut self, key: Key) {
        for widget in &mut self.widgets {
            widget.carousel.handle(WidgetEvent::Key(key.clone()));
        }
    }

    /// Replay outstanding image loads against `probe`. Returns how many
    /// images resolved.
    pub fn resolve_pending_images(&mut self, probe: &dyn DimensionProbe) -> usize {
        let mut resolved = 0;
        for widget in &mut self.widgets {
            for (slide, src) in widget.carousel.pending_images() {
                match probe.identify(&src) {
                    Ok(dims) => {
                        widget.carousel.handle(WidgetEvent::ImageLoaded {
                            slide,
                            width: dims.width,
                            height: dims.height,
                        });
                        resolved += 1;
                    }
                    Err(e) => debug!(%src, error = %e, "image still pending"),
                }
            }
        }
        resolved
    }

    /// Serialize the page with every carousel rendered in place and the
    /// lightboxes appended to `<body>`.
    pub fn to_html(&self) -> String {
        let overlays: String = self
            .carousels()
            .filter_map(Carousel::render_lightbox)
            .map(|m| m.into_string())
            .collect();
        let body = self.document.find_first("body");
        let splice = PageSplice {
            widgets: &self.widgets,
            body,
            overlays: &overlays,
        };
        let mut html = self.document.to_html_with(&splice);
        if body.is_none() {
            html.push_str(&overlays);
        }
        html
    }
}

struct PageSplice<'a> {
    widgets: &'a [Widget],
    body: Option<NodeId>,
    overlays: &'a str,
}

impl Splice for PageSplice<'_> {
    fn inner(&self, id: NodeId) -> Option<String> {
        self.widgets
            .iter()
            .find(|w| w.container == id)
            .map(|w| w.carousel.render().into_string())
    }

    fn append(&self, id: NodeId) -> Option<String> {
        (Some(id) == self.body && !self.overlays.is_empty()).then(|| self.overlays.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::mock::MockProbe;
    use crate::probe::{FsProbe, NoProbe};
    use crate::test_helpers::*;

    fn page(html: &str) -> Page {
        Page::parse(html, SlideshowConfig::default()).unwrap()
    }

    #[test]
    fn builds_one_carousel_per_container() {
        let html = document(&[
            &slideshow(&[r#"<img src="a.png">"#, r#"<img src="b.png">"#]),
            "<p>between</p>",
            &slideshow(&[r#"<div data-youtube-id="v"></div>"#]),
        ]);
        let mut p = page(&html);
        let report = p.initialize(&NoProbe);
        assert_eq!(report.built, 2);
        assert_eq!(p.carousel(0).unwrap().len(), 2);
        assert_eq!(p.carousel(1).unwrap().len(), 1);
    }

    #[test]
    fn second_scan_is_a_no_op() {
        let mut p = page(&document(&[&slideshow(&[r#"<img src="a.png">"#])]));
        p.initialize(&NoProbe);
        p.carousel_mut(0).unwrap().open_lightbox();

        let report = p.initialize(&NoProbe);
        assert_eq!(report, InitReport { built: 0, empty: 0, skipped: 1 });
        assert_eq!(p.carousel_count(), 1);
        assert!(p.carousel(0).unwrap().lightbox_open());
    }

    #[test]
    fn pre_marked_container_is_skipped() {
        let html = document(&[
            r#"<div class="slideshow" data-slideshow-initialized="true"><img src="a.png"></div>"#,
        ]);
        let mut p = page(&html);
        let report = p.initialize(&NoProbe);
        assert_eq!(report.skipped, 1);
        assert_eq!(p.carousel_count(), 0);
    }

    #[test]
    fn empty_container_left_untouched_but_marked() {
        let html = document(&[&slideshow(&["<p>no media here</p>"])]);
        let mut p = page(&html);
        let report = p.initialize(&NoProbe);
        assert_eq!(report.empty, 1);
        assert_eq!(p.carousel_count(), 0);

        let out = p.to_html();
        assert!(out.contains("<p>no media here</p>"));
        assert!(out.contains(r#"data-slideshow-initialized="true""#));
        assert!(!out.contains("slideshow-lightbox"));
        assert_eq!(p.initialize(&NoProbe).skipped, 1);
    }

    #[test]
    fn navigate_replaces_widgets() {
        let mut p = page(&document(&[&slideshow(&[r#"<img src="a.png">"#])]));
        p.initialize(&NoProbe);
        p.carousel_mut(0).unwrap().open_lightbox();

        let next = document(&[
            &slideshow(&[r#"<img src="x.png">"#, r#"<img src="y.png">"#, r#"<img src="z.png">"#]),
        ]);
        let report = p.navigate(&next, &NoProbe).unwrap();
        assert_eq!(report.built, 1);
        assert_eq!(p.carousel_count(), 1);
        let c = p.carousel(0).unwrap();
        assert_eq!(c.len(), 3);
        assert!(!c.lightbox_open());
    }

    #[test]
    fn instances_are_isolated() {
        let html = document(&[
            &slideshow(&[r#"<img src="a.png">"#, r#"<img src="b.png">"#]),
            &slideshow(&[r#"<img src="c.png">"#, r#"<img src="d.png">"#]),
        ]);
        let mut p = page(&html);
        p.initialize(&NoProbe);
        assert!(p.dispatch(0, WidgetEvent::Next));
        assert_eq!(p.carousel(0).unwrap().current_index(), 1);
        assert_eq!(p.carousel(1).unwrap().current_index(), 0);
        assert!(!p.dispatch(5, WidgetEvent::Next));
    }

    #[test]
    fn document_key_reaches_only_open_lightbox() {
        let html = document(&[
            &slideshow(&[r#"<img src="a.png">"#, r#"<img src="b.png">"#]),
            &slideshow(&[r#"<img src="c.png">"#, r#"<img src="d.png">"#]),
        ]);
        let mut p = page(&html);
        p.initialize(&NoProbe);
        p.dispatch(1, WidgetEvent::FrameActivated(0));
        p.dispatch_key(Key::ArrowRight);
        assert_eq!(p.carousel(0).unwrap().current_index(), 0);
        assert_eq!(p.carousel(1).unwrap().current_index(), 1);
    }

    #[test]
    fn pending_images_resolve_through_probe() {
        let html = document(&[&slideshow(&[
            r#"<img src="a.png" style="width: 50%">"#,
            r#"<img src="b.png">"#,
        ])]);
        let mut p = page(&html);
        p.initialize(&NoProbe);
        assert_eq!(p.carousel(0).unwrap().pending_images().len(), 2);

        let probe = MockProbe::new().with("a.png", 1000, 500);
        assert_eq!(p.resolve_pending_images(&probe), 1);
        let c = p.carousel(0).unwrap();
        assert_eq!(c.frame_ratio(), 4.0);
        assert_eq!(c.pending_images(), vec![(1, "b.png".to_string())]);
    }

    #[test]
    fn pending_images_resolve_from_files() {
        let assets = image_assets(&[("shots/wide.png", 300, 100), ("tall.png", 100, 200)]);
        let html = document(&[&slideshow(&[
            r#"<img src="/shots/wide.png">"#,
            r#"<img src="tall.png">"#,
            r#"<img src="https://cdn.example.com/x.png">"#,
        ])]);
        let mut p = page(&html);
        p.initialize(&NoProbe);
        assert_eq!(p.resolve_pending_images(&FsProbe::new(assets.path())), 2);

        let c = p.carousel(0).unwrap();
        assert_eq!(c.frame_ratio(), 3.0);
        assert_eq!(c.slides()[find_slide(c, "tall.png")].record.ratio, 0.5);
        assert_eq!(
            c.pending_images(),
            vec![(2, "https://cdn.example.com/x.png".to_string())]
        );
    }

    #[test]
    fn slides_keep_document_order() {
        let html = document(&[&slideshow(&[
            r#"<img src="b.png">"#,
            r#"<div data-youtube-id="vid"></div>"#,
            r#"<img src="a.png">"#,
        ])]);
        let mut p = page(&html);
        p.initialize(&NoProbe);
        assert_eq!(slide_srcs(p.carousel(0).unwrap()), vec!["b.png", "vid", "a.png"]);
    }

    #[test]
    fn ratio_override_from_container() {
        let html = document(&[
            r#"<div class="slideshow" data-aspect-ratio="4/3"><img src="a.png" width="2000" height="500"></div>"#,
        ]);
        let mut p = page(&html);
        p.initialize(&NoProbe);
        let c = p.carousel(0).unwrap();
        assert_eq!(c.max_ratio(), 4.0);
        assert_eq!(c.frame_ratio(), 4.0 / 3.0);
    }

    #[test]
    fn unusable_override_falls_back_to_computed() {
        let html = document(&[
            r#"<div class="slideshow" data-aspect-ratio="wide"><img src="a.png" width="300" height="200"></div>"#,
        ]);
        let mut p = page(&html);
        p.initialize(&NoProbe);
        assert_eq!(p.carousel(0).unwrap().frame_ratio(), 1.5);
    }

    #[test]
    fn to_html_replaces_content_and_appends_lightbox() {
        let html = document(&[&slideshow(&[
            r#"<img src="a.png" alt="A">"#,
            r#"<div class="slide-caption">Caption *one*</div>"#,
        ])]);
        let mut p = page(&html);
        p.initialize(&NoProbe);
        let out = p.to_html();

        assert!(out.contains("slideshow-inner"));
        assert!(out.contains("<figcaption><p>Caption <em>one</em></p>"));
        assert!(!out.contains(r#"<div class="slide-caption">"#));
        let lightbox = out.find("slideshow-lightbox").unwrap();
        let body_end = out.find("</body>").unwrap();
        assert!(lightbox < body_end);
        assert!(out.find("slideshow-inner").unwrap() < lightbox);
    }

    #[test]
    fn to_html_without_body_appends_at_end() {
        let mut p = page(&slideshow(&[r#"<img src="a.png">"#]));
        p.initialize(&NoProbe);
        let out = p.to_html();
        assert!(out.trim_end().ends_with("</div></div></div>"));
        assert!(out.contains("slideshow-lightbox"));
    }

    #[test]
    fn plain_captions_when_markdown_disabled() {
        let mut config = SlideshowConfig::default();
        config.captions.markdown = false;
        let html = document(&[&slideshow(&[r#"<img src="a.png" alt="*raw*">"#])]);
        let mut p = Page::parse(&html, config).unwrap();
        p.initialize(&NoProbe);
        assert_eq!(p.carousel(0).unwrap().slides()[0].record.caption, "*raw*");
    }

    #[test]
    fn bare_ampersands_survive_the_page() {
        let html = r#"<body><p>R&D notes</p><pre><code>a && b</code></pre><div class="slideshow"><img src="a.png"></div></body>"#;
        let mut p = page(html);
        assert_eq!(p.initialize(&NoProbe).built, 1);
        let out = p.to_html();
        assert!(out.contains("<p>R&D notes</p>"));
        assert!(out.contains("<code>a && b</code>"));
    }

    #[test]
    fn untouched_lists_keep_their_shape() {
        let html = document(&["<ul><li>a<li>b</ul>", &slideshow(&[r#"<img src="a.png">"#])]);
        let mut p = page(&html);
        p.initialize(&NoProbe);
        assert!(p.to_html().contains("<ul><li>a<li>b</ul>"));
    }

    #[test]
    fn custom_transform_renders_captions() {
        struct Shout;
        impl TextTransform for Shout {
            fn render(&self, markup: &str) -> String {
                markup.to_uppercase()
            }
        }
        let html = document(&[&slideshow(&[r#"<img src="a.png" alt="dawn">"#])]);
        let mut p = page(&html).with_transform(Some(Box::new(Shout)));
        p.initialize(&NoProbe);
        assert_eq!(p.carousel(0).unwrap().slides()[0].record.caption, "DAWN");
    }

    #[test]
    fn no_transform_keeps_raw_markdown() {
        let html = document(&[&slideshow(&[r#"<img src="a.png" alt="*raw*">"#])]);
        let mut p = page(&html).with_transform(None);
        assert!(p.config().captions.markdown);
        p.initialize(&NoProbe);
        assert_eq!(p.carousel(0).unwrap().slides()[0].record.caption, "*raw*");
    }

    #[test]
    fn custom_container_class() {
        let mut config = SlideshowConfig::default();
        config.markup.container_class = "gallery".into();
        let html = document(&[
            r#"<div class="gallery"><img src="a.png"></div>"#,
            &slideshow(&[r#"<img src="b.png">"#]),
        ]);
        let mut p = Page::parse(&html, config).unwrap();
        assert_eq!(p.initialize(&NoProbe).built, 1);
    }
}
