//! Shared test utilities for the docs-slideshow test suite.
//!
//! Provides markup builders for container pages, ready-made slide records
//! that skip collection, and lookup helpers over collected slides.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let html = document(&[&slideshow(&[
//!     r#"<img src="a.png">"#,
//!     r#"<div class="slide-caption">Dawn</div>"#,
//! ])]);
//!
//! let carousel = Carousel::from_records(image_records(3), None, &config, 0).unwrap();
//! assert_eq!(slide_srcs(&carousel), vec!["slide-0.png", "slide-1.png", "slide-2.png"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::carousel::Carousel;
use crate::collect::{ImageMedia, MediaHandle, SlideRecord, VIDEO_CLASS, VideoMedia};
use crate::config::VideoConfig;

// =========================================================================
// Markup builders
// =========================================================================

/// Wrap child markup in a default slideshow container.
pub fn slideshow(items: &[&str]) -> String {
    format!(r#"<div class="slideshow">{}</div>"#, items.concat())
}

/// Wrap body content in a minimal page.
pub fn document(body: &[&str]) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>t</title></head><body>{}</body></html>",
        body.concat()
    )
}

/// Temp directory holding solid PNGs of the given sizes.
pub fn image_assets(images: &[(&str, u32, u32)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (name, width, height) in images {
        write_png(&tmp.path().join(name), *width, *height);
    }
    tmp
}

fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    image::RgbImage::new(width, height).save(path).unwrap();
}

// =========================================================================
// Slide records, bypassing collection
// =========================================================================

/// An image slide with a known 3:2 ratio and no caption.
pub fn image_record(src: &str) -> SlideRecord {
    SlideRecord {
        handle: MediaHandle::Image(ImageMedia {
            markup: format!(r#"<img src="{src}">"#),
            src: src.to_string(),
            alt: String::new(),
            scale: None,
        }),
        caption: String::new(),
        ratio: 1.5,
    }
}

/// `n` image slides named `slide-0.png`, `slide-1.png`, ...
pub fn image_records(n: usize) -> Vec<SlideRecord> {
    (0..n).map(|i| image_record(&format!("slide-{i}.png"))).collect()
}

/// A video slide with the stock embed URL.
pub fn video_record(id: &str) -> SlideRecord {
    let video = VideoConfig::default();
    SlideRecord {
        handle: MediaHandle::Video(VideoMedia {
            id: id.to_string(),
            classes: vec![VIDEO_CLASS.to_string()],
            embed_src: video.embed_url(id),
        }),
        caption: String::new(),
        ratio: video.default_ratio(),
    }
}

// =========================================================================
// Lookups: panics with a clear message on miss
// =========================================================================

/// Image sources and video ids in slide order.
pub fn slide_srcs(carousel: &Carousel) -> Vec<&str> {
    carousel
        .slides()
        .iter()
        .map(|view| match &view.record.handle {
            MediaHandle::Image(image) => image.src.as_str(),
            MediaHandle::Video(video) => video.id.as_str(),
        })
        .collect()
}

/// Index of the slide showing `src` (image source or video id). Panics if not found.
pub fn find_slide(carousel: &Carousel, src: &str) -> usize {
    let srcs = slide_srcs(carousel);
    srcs.iter()
        .position(|s| *s == src)
        .unwrap_or_else(|| panic!("slide '{src}' not found. Available: {srcs:?}"))
}
