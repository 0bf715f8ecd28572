//! CLI output formatting for the `render` and `inspect` commands.
//!
//! # Information-First Display
//!
//! Every carousel is listed by its positional index, followed by one line per
//! slide. Media identity (image source or video id) leads each slide line;
//! caption text and pending state are indented context lines.
//!
//! # Output Format
//!
//! ## Inspect
//!
//! ```text
//! Carousels
//! 001 3 slides, frame 1.7778
//!     001 image dawn.png
//!         Caption: Dawn over the ridge
//!     002 video dQw4w9WgXcQ
//!     003 image dusk.png (pending)
//!
//! Skipped: 1 container (1 empty)
//! ```
//!
//! ## Render
//!
//! ```text
//! Rendered 1 carousel, 3 slides → page.out.html
//! Pending: 1 image without a known size
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to the terminal. Format functions
//! are pure: no I/O, no side effects. [`summarize`] produces the same
//! information as serializable data for `inspect --json`.

use crate::carousel::Carousel;
use crate::collect::{MediaHandle, MediaKind};
use crate::page::{InitReport, Page};
use crate::ratio::css_ratio;
use serde::Serialize;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_caption(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

// ============================================================================
// Summaries
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideSummary {
    pub kind: MediaKind,
    /// Image source or video id.
    pub source: String,
    /// Caption as plain text.
    pub caption: String,
    pub ratio: f64,
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarouselSummary {
    pub instance: usize,
    pub frame_ratio: f64,
    pub override_ratio: Option<f64>,
    pub slides: Vec<SlideSummary>,
}

pub fn summarize(carousel: &Carousel) -> CarouselSummary {
    let slides = carousel
        .slides()
        .iter()
        .map(|view| {
            let record = &view.record;
            let source = match &record.handle {
                MediaHandle::Image(image) => image.src.clone(),
                MediaHandle::Video(video) => video.id.clone(),
            };
            SlideSummary {
                kind: record.kind(),
                source,
                caption: strip_html_tags(&record.caption).trim().to_string(),
                ratio: record.ratio,
                pending: record.is_deferred(),
            }
        })
        .collect();
    CarouselSummary {
        instance: carousel.instance(),
        frame_ratio: carousel.frame_ratio(),
        override_ratio: carousel.override_ratio(),
        slides,
    }
}

fn pending_count(page: &Page) -> usize {
    page.carousels().map(|c| c.pending_images().len()).sum()
}

// ============================================================================
// Inspect
// ============================================================================

/// Format the carousels found on a page.
pub fn format_inspect(page: &Page, report: &InitReport) -> Vec<String> {
    let mut lines = vec!["Carousels".to_string()];

    for (i, carousel) in page.carousels().enumerate() {
        let summary = summarize(carousel);
        lines.push(format!(
            "{} {}, frame {}",
            format_index(i + 1),
            plural(summary.slides.len(), "slide"),
            css_ratio(summary.frame_ratio)
        ));
        if let Some(ratio) = summary.override_ratio {
            lines.push(format!("{}Override: {}", indent(1), css_ratio(ratio)));
        }
        for (j, slide) in summary.slides.iter().enumerate() {
            let kind = match slide.kind {
                MediaKind::Image => "image",
                MediaKind::Video => "video",
            };
            let pending = if slide.pending { " (pending)" } else { "" };
            lines.push(format!(
                "{}{} {} {}{}",
                indent(1),
                format_index(j + 1),
                kind,
                slide.source,
                pending
            ));
            if !slide.caption.is_empty() {
                lines.push(format!(
                    "{}Caption: {}",
                    indent(2),
                    truncate_caption(&slide.caption, 60)
                ));
            }
        }
    }

    if page.carousel_count() == 0 {
        lines.push(format!("{}(none)", indent(1)));
    }

    let skipped = report.empty + report.skipped;
    if skipped > 0 {
        lines.push(String::new());
        let mut parts = Vec::new();
        if report.empty > 0 {
            parts.push(format!("{} empty", report.empty));
        }
        if report.skipped > 0 {
            parts.push(format!("{} already initialized", report.skipped));
        }
        lines.push(format!(
            "Skipped: {} ({})",
            plural(skipped, "container"),
            parts.join(", ")
        ));
    }

    lines
}

pub fn print_inspect(page: &Page, report: &InitReport) {
    for line in format_inspect(page, report) {
        println!("{}", line);
    }
}

// ============================================================================
// Render
// ============================================================================

/// Format the summary printed after writing a rendered page.
pub fn format_render_summary(page: &Page, output: Option<&Path>) -> Vec<String> {
    let slides: usize = page.carousels().map(Carousel::len).sum();
    let mut header = format!(
        "Rendered {}, {}",
        plural(page.carousel_count(), "carousel"),
        plural(slides, "slide")
    );
    if let Some(path) = output {
        header.push_str(&format!(" → {}", path.display()));
    }

    let mut lines = vec![header];
    let pending = pending_count(page);
    if pending > 0 {
        lines.push(format!(
            "Pending: {} without a known size",
            plural(pending, "image")
        ));
    }
    lines
}

/// Writes to stderr: the page itself may be going to stdout.
pub fn print_render_summary(page: &Page, output: Option<&Path>) {
    for line in format_render_summary(page, output) {
        eprintln!("{}", line);
    }
}
