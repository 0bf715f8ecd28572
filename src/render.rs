//! Carousel markup.
//!
//! Renders a [`Carousel`] snapshot with [maud](https://maud.lambda.xyz/).
//! The output replaces the container's original children:
//!
//! ```text
//! div.slideshow-inner            grid; every slide in cell 1 / 1
//! ├── figure.slide(.active)      one per slide, only the active one visible
//! │   ├── div.slide-image        frame, aspect-ratio = shared frame ratio
//! │   └── figcaption             only for non-empty captions
//! div.slideshow-ui-layer         above the slides, same ratio as the frames,
//! │                              lets pointer input through except on buttons
//! │   ├── button prev
//! │   └── button next
//! div.slideshow-dots             one button per slide
//! ```
//!
//! The lightbox is rendered separately because hosts append it to `<body>`.
//! Controls carry `data-slideshow-action` (and `data-slide-index` where it
//! matters) so a host can translate DOM events into
//! [`WidgetEvent`](crate::carousel::WidgetEvent)s.

use crate::carousel::Carousel;
use crate::collect::MediaHandle;
use crate::lightbox::DisplaySlot;
use crate::navigation::SlideView;
use crate::ratio::css_ratio;
use maud::{Markup, PreEscaped, html};

const PREV_GLYPH: &str = "&#10094;";
const NEXT_GLYPH: &str = "&#10095;";

fn slide_style(view: &SlideView, transition: &str) -> String {
    format!(
        "display: block !important; grid-area: 1 / 1; width: 100%; opacity: {}; visibility: {}; transition: {}; z-index: {};",
        view.opacity(),
        view.visibility(),
        transition,
        view.z_index(),
    )
}

fn ui_layer_style(ratio: &str) -> String {
    format!(
        "position: absolute; top: 0; left: 0; width: 100%; pointer-events: none; z-index: 10; aspect-ratio: {ratio};"
    )
}

fn display_style(slot: &DisplaySlot) -> &'static str {
    if slot.visible {
        "display: block;"
    } else {
        "display: none;"
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

/// Render the in-place carousel structure.
pub fn render_carousel(carousel: &Carousel) -> Markup {
    let ratio = css_ratio(carousel.frame_ratio());
    let frame_style = format!("aspect-ratio: {ratio};");
    let controls = carousel.controls();
    let opens_lightbox = carousel.lightbox().is_some();

    html! {
        div.slideshow-inner style="display: grid; align-items: start;" {
            @for (i, view) in carousel.slides().iter().enumerate() {
                figure.slide.active[view.is_active()]
                    style=(slide_style(view, &controls.transition))
                    data-slide-index=(i) {
                    @match &view.record.handle {
                        MediaHandle::Image(image) => {
                            div.slide-image
                                style=(frame_style)
                                data-slideshow-action=[opens_lightbox.then_some("open-lightbox")] {
                                (PreEscaped(&image.markup))
                            }
                        }
                        MediaHandle::Video(video) => {
                            div.slide-image style=(frame_style) {
                                iframe class=(video.classes.join(" "))
                                    src=(video.embed_src)
                                    frameborder="0"
                                    allowfullscreen {}
                            }
                        }
                    }
                    @if view.record.has_caption() {
                        figcaption { (PreEscaped(&view.record.caption)) }
                    }
                }
            }
        }
        div.slideshow-ui-layer style=(ui_layer_style(&ratio)) {
            @if controls.arrows {
                button.slideshow-nav-btn."slideshow-nav-btn--prev"
                    type="button"
                    style="pointer-events: auto;"
                    aria-label="Previous slide"
                    data-slideshow-action="previous" {
                    (PreEscaped(PREV_GLYPH))
                }
                button.slideshow-nav-btn."slideshow-nav-btn--next"
                    type="button"
                    style="pointer-events: auto;"
                    aria-label="Next slide"
                    data-slideshow-action="next" {
                    (PreEscaped(NEXT_GLYPH))
                }
            }
        }
        @if let Some(active) = carousel.indicator() {
            div.slideshow-dots {
                @for i in 0..carousel.len() {
                    button.slideshow-dot.active[i == active]
                        type="button"
                        aria-label={ "Go to slide " (i + 1) }
                        data-slideshow-action="indicator"
                        data-slide-index=(i) {}
                }
            }
        }
    }
}

/// Render the overlay, `None` when the carousel has no lightbox.
pub fn render_lightbox(carousel: &Carousel) -> Option<Markup> {
    let lightbox = carousel.lightbox()?;
    let image = lightbox.image();
    let video = lightbox.video();

    Some(html! {
        div.slideshow-lightbox.is-open[lightbox.is_open()]
            data-slideshow-instance=(carousel.instance())
            data-slideshow-action="lightbox-backdrop" {
            div.slideshow-lightbox-content {
                button.slideshow-lightbox-close
                    type="button"
                    aria-label="Close"
                    data-slideshow-action="lightbox-close" { "×" }
                div.slideshow-lightbox-image-wrapper {
                    img.slideshow-lightbox-image
                        src=[non_empty(&image.src)]
                        alt=(image.alt)
                        style=(display_style(image));
                    iframe.slideshow-lightbox-video
                        src=[non_empty(&video.src)]
                        style=(display_style(video))
                        allowfullscreen {}
                    button.slideshow-lightbox-nav.slideshow-lightbox-prev
                        type="button"
                        aria-label="Previous slide"
                        data-slideshow-action="lightbox-previous" {
                        (PreEscaped(PREV_GLYPH))
                    }
                    button.slideshow-lightbox-nav.slideshow-lightbox-next
                        type="button"
                        aria-label="Next slide"
                        data-slideshow-action="lightbox-next" {
                        (PreEscaped(NEXT_GLYPH))
                    }
                }
                div.slideshow-lightbox-caption { (PreEscaped(lightbox.caption())) }
            }
        }
    })
}
