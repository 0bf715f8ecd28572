//! Aspect-ratio calculations shared by every slide of one carousel.
//!
//! All functions here are pure and testable without a document.
//!
//! ## Effective Ratio
//!
//! An image shrunk in place with a percentage width (`width="50%"` or
//! `style="width: 50%"`) occupies less of the frame than its pixels suggest.
//! Dividing the raw ratio by the scale fraction makes the frame follow the
//! visual footprint instead: a 2:1 image at 50% needs a 4:1 frame to keep
//! the same height as an unscaled 2:1 neighbour.
//!
//! Only percentage widths are treated as scale hints. Other ways of
//! constraining an image (max-width, container size) are left alone.
//!
//! ## Frame Ratio
//!
//! [`RatioTracker`] keeps the running maximum over all resolved slides. An
//! author override beats the maximum; with neither, the configured default
//! (16:9) applies.

/// Parse a CSS-style percentage (`"50%"`, `" 12.5 %"`) into a fraction.
pub fn parse_percentage(value: &str) -> Option<f64> {
    let number = value.trim().strip_suffix('%')?.trim();
    number.parse::<f64>().ok().map(|p| p / 100.0)
}

/// Pick the scale hint for an image: an inline-style percentage width first,
/// then a percentage `width` attribute.
pub fn scale_hint(style_width: Option<&str>, attr_width: Option<&str>) -> Option<f64> {
    style_width
        .and_then(parse_percentage)
        .or_else(|| attr_width.and_then(parse_percentage))
}

/// Parse a declared pixel length (`"1000"`, `"1000px"`). Percentages are not
/// lengths and yield `None`.
pub fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.ends_with('%') {
        return None;
    }
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f64>().ok().filter(|n| *n > 0.0 && n.is_finite())
}

/// Apply a scale hint to a raw width/height ratio.
///
/// Scales outside `(0, 1]` are ignored, so an enlarged or nonsensical hint
/// never shrinks the frame.
pub fn effective_ratio(raw: f64, scale: Option<f64>) -> f64 {
    match scale {
        Some(s) if s > 0.0 && s <= 1.0 => raw / s,
        _ => raw,
    }
}

/// Parse an author ratio override: `"16/9"`, `"4:3"`, `"1.5"`.
///
/// Returns `None` for anything that does not give a finite, positive ratio.
pub fn parse_ratio_override(value: &str) -> Option<f64> {
    let value = value.trim();
    let ratio = match value.split_once(['/', ':']) {
        Some((w, h)) => {
            let w: f64 = w.trim().parse().ok()?;
            let h: f64 = h.trim().parse().ok()?;
            if h == 0.0 {
                return None;
            }
            w / h
        }
        None => value.parse().ok()?,
    };
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}

/// Running frame ratio for one carousel instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioTracker {
    max_ratio: f64,
    override_ratio: Option<f64>,
    fallback: f64,
}

impl RatioTracker {
    pub fn new(override_ratio: Option<f64>, fallback: f64) -> Self {
        Self {
            max_ratio: 0.0,
            override_ratio,
            fallback,
        }
    }

    /// Record a resolved slide ratio. Returns whether the maximum grew.
    ///
    /// Zero, negative and non-finite ratios are "not determined" and ignored.
    pub fn observe(&mut self, ratio: f64) -> bool {
        if ratio.is_finite() && ratio > self.max_ratio {
            self.max_ratio = ratio;
            true
        } else {
            false
        }
    }

    /// Widest ratio seen so far, `0.0` when nothing resolved yet.
    pub fn max_ratio(&self) -> f64 {
        self.max_ratio
    }

    pub fn override_ratio(&self) -> Option<f64> {
        self.override_ratio
    }

    /// Ratio every frame and the control layer should use right now.
    pub fn applied(&self) -> f64 {
        match self.override_ratio {
            Some(ratio) => ratio,
            None if self.max_ratio > 0.0 => self.max_ratio,
            None => self.fallback,
        }
    }
}

/// Format a ratio for a CSS `aspect-ratio` declaration.
pub fn css_ratio(ratio: f64) -> String {
    let rounded = (ratio * 10_000.0).round() / 10_000.0;
    format!("{rounded}")
}
