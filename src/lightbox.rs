//! Full-screen preview overlay.
//!
//! The overlay keeps one image element and one video element alive at all
//! times and shows whichever matches the current slide. It holds no index of
//! its own: the carousel repopulates it from the navigation's current slide
//! whenever the two could drift apart.

use crate::collect::{MediaHandle, SlideRecord};

/// Query flag the player needs to accept playback commands.
const JS_API_FLAG: &str = "enablejsapi=1";

/// One of the overlay's two permanent display elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplaySlot {
    pub visible: bool,
    pub src: String,
    pub alt: String,
}

impl DisplaySlot {
    fn show(&mut self, src: &str, alt: &str) {
        self.visible = true;
        self.src = src.to_string();
        self.alt = alt.to_string();
    }

    fn hide(&mut self) {
        self.visible = false;
        self.src.clear();
        self.alt.clear();
    }
}

/// Where a pointer press on the overlay landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// The dimmed backdrop itself.
    Background,
    /// Anything inside the content region.
    Content,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lightbox {
    open: bool,
    image: DisplaySlot,
    video: DisplaySlot,
    caption: String,
}

impl Lightbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn image(&self) -> &DisplaySlot {
        &self.image
    }

    pub fn video(&self) -> &DisplaySlot {
        &self.video
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Open on `slide`.
    pub fn open(&mut self, slide: &SlideRecord) {
        self.open = true;
        self.populate(slide);
    }

    /// Close and stop any playing video. Returns whether anything changed.
    pub fn close(&mut self) -> bool {
        if !self.open {
            return false;
        }
        self.open = false;
        self.video.src.clear();
        true
    }

    /// Show `slide` in the overlay, switching between image and video.
    pub fn populate(&mut self, slide: &SlideRecord) {
        match &slide.handle {
            MediaHandle::Image(image) => {
                self.video.hide();
                self.image.show(&image.src, &image.alt);
            }
            MediaHandle::Video(video) => {
                self.image.hide();
                self.video.show(&with_js_api(&video.embed_src), "");
            }
        }
        self.caption = slide.caption.clone();
    }
}

/// Make sure an embed URL accepts playback commands.
pub fn with_js_api(src: &str) -> String {
    if src.contains(JS_API_FLAG) {
        return src.to_string();
    }
    let separator = if src.contains('?') { '&' } else { '?' };
    format!("{src}{separator}{JS_API_FLAG}")
}
