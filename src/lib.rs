//! # Docs Slideshow
//!
//! A headless media carousel and lightbox for documentation pages. Authors
//! mark a container with `class="slideshow"` and put images, video
//! placeholders and caption blocks inside it; this crate turns each container
//! into a carousel with a shared frame ratio, previous/next controls,
//! position indicators and a full-screen preview.
//!
//! # Architecture: Document, Model, Markup
//!
//! ```text
//! 1. Parse      page HTML   →  Document      (tolerant element tree)
//! 2. Collect    container   →  SlideRecords  (media + caption + ratio)
//! 3. Drive      WidgetEvent →  Carousel      (navigation, lightbox, layout)
//! 4. Render     Carousel    →  Markup        (maud snapshot, spliced in place)
//! ```
//!
//! The widget is modelled without a browser. Everything a browser would
//! deliver asynchronously (arrow clicks, key presses, image load completion)
//! arrives as a [`carousel::WidgetEvent`], and every visible consequence is
//! state on the [`carousel::Carousel`] that [`render`] turns into markup.
//! That keeps the interesting logic (index wrapping, ratio monotonicity,
//! lightbox sync) testable as plain functions on plain data.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`page`] | Finds containers, builds one carousel each, exactly once; splices the output |
//! | [`dom`] | Tolerant HTML tree built on `quick-xml`, with lossless serialization |
//! | [`collect`] | Container children → slide records (images, videos, captions) |
//! | [`caption`] | Caption precedence and the optional markdown transform |
//! | [`ratio`] | Scale hints, declared sizes, overrides and the running max ratio |
//! | [`navigation`] | Current-slide state machine and player pause messages |
//! | [`lightbox`] | Overlay with one image and one video slot |
//! | [`carousel`] | One widget instance: ties the above together and dispatches events |
//! | [`render`] | Maud markup for the in-place structure and the overlay |
//! | [`probe`] | Natural image dimensions from local files |
//! | [`config`] | `slideshow.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Widest Ratio Wins
//!
//! Every frame in a carousel uses the same aspect ratio: the widest one among
//! its slides, unless the container declares `data-aspect-ratio`. Slides
//! switch by opacity in a single grid cell, so the page below a carousel
//! never moves when navigating. Image sizes that arrive late can only widen
//! the frame, never shrink it.
//!
//! ## One Index, Two Views
//!
//! The lightbox holds no index of its own. Every navigation path funnels
//! through [`carousel::Carousel::go_to`], which also refreshes an open
//! lightbox, so the overlay and the carousel cannot disagree.
//!
//! ## Idempotent Initialization
//!
//! Documentation hosts re-run their page hooks after every client-side
//! navigation. Containers are marked with `data-slideshow-initialized` on
//! first sight and skipped afterwards, so a carousel is never built twice.

pub mod caption;
pub mod carousel;
pub mod collect;
pub mod config;
pub mod dom;
pub mod lightbox;
pub mod navigation;
pub mod output;
pub mod page;
pub mod probe;
pub mod ratio;
pub mod render;

#[cfg(test)]
pub(crate) mod test_helpers;
