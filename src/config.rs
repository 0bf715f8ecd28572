//! Widget configuration module.
//!
//! Handles loading, validating, and merging `slideshow.toml`. Stock defaults
//! match the markup conventions documentation sites already use, so most
//! pages need no config file at all.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [markup]
//! container_class = "slideshow"          # Elements turned into carousels
//! caption_class = "slide-caption"        # Caption block following a media item
//! caption_attribute = "data-caption"     # Per-item caption attribute
//! fallback_attribute = "alt"             # Caption of last resort
//! video_attribute = "data-youtube-id"    # Marks a video placeholder
//! ratio_attribute = "data-aspect-ratio"  # Container-level ratio override
//! initialized_attribute = "data-slideshow-initialized"
//!
//! [video]
//! embed_host = "www.youtube.com"
//! embed_params = "rel=0&controls=1&showinfo=0&vq=hd1080&enablejsapi=1"
//! default_ratio = [16, 9]                # Video ratio and layout fallback
//!
//! [controls]
//! arrows = true                          # Previous/next buttons
//! indicators = true                      # Position dots
//! lightbox = true                        # Full-screen preview
//! transition = "opacity 0.4s ease"
//!
//! [captions]
//! markdown = true                        # Render captions as markdown
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE: &str = "slideshow.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Widget configuration loaded from `slideshow.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlideshowConfig {
    /// Class and attribute names the widget recognizes.
    pub markup: MarkupConfig,
    /// Video embedding settings.
    pub video: VideoConfig,
    /// Which controls get attached.
    pub controls: ControlsConfig,
    /// Caption text transform.
    pub captions: CaptionsConfig,
}

impl SlideshowConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("markup.container_class", &self.markup.container_class),
            ("markup.caption_class", &self.markup.caption_class),
            ("markup.caption_attribute", &self.markup.caption_attribute),
            ("markup.fallback_attribute", &self.markup.fallback_attribute),
            ("markup.video_attribute", &self.markup.video_attribute),
            ("markup.ratio_attribute", &self.markup.ratio_attribute),
            (
                "markup.initialized_attribute",
                &self.markup.initialized_attribute,
            ),
        ];
        for (key, value) in names {
            if value.trim().is_empty() || value.contains(char::is_whitespace) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a single non-empty name"
                )));
            }
        }
        if self.video.default_ratio[0] == 0 || self.video.default_ratio[1] == 0 {
            return Err(ConfigError::Validation(
                "video.default_ratio values must be non-zero".into(),
            ));
        }
        if self.video.embed_host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "video.embed_host must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Class and attribute names the widget recognizes in page markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkupConfig {
    /// Class marking a carousel container.
    pub container_class: String,
    /// Class marking a caption block that follows a media item.
    pub caption_class: String,
    /// Caption attribute on a media item.
    pub caption_attribute: String,
    /// Fallback text attribute used when nothing else provides a caption.
    pub fallback_attribute: String,
    /// Attribute holding a video identifier.
    pub video_attribute: String,
    /// Container attribute overriding the computed aspect ratio.
    pub ratio_attribute: String,
    /// One-shot marker written onto initialized containers.
    pub initialized_attribute: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            container_class: "slideshow".to_string(),
            caption_class: "slide-caption".to_string(),
            caption_attribute: "data-caption".to_string(),
            fallback_attribute: "alt".to_string(),
            video_attribute: "data-youtube-id".to_string(),
            ratio_attribute: "data-aspect-ratio".to_string(),
            initialized_attribute: "data-slideshow-initialized".to_string(),
        }
    }
}

/// Video embedding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoConfig {
    /// Host of the embedding endpoint (`https://<host>/embed/<id>`).
    pub embed_host: String,
    /// Query string appended to every embed URL.
    pub embed_params: String,
    /// Ratio as `[width, height]` for videos, and the layout fallback when no
    /// image ever reports a size.
    pub default_ratio: [u32; 2],
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            embed_host: "www.youtube.com".to_string(),
            embed_params: "rel=0&controls=1&showinfo=0&vq=hd1080&enablejsapi=1".to_string(),
            default_ratio: [16, 9],
        }
    }
}

impl VideoConfig {
    pub fn default_ratio(&self) -> f64 {
        self.default_ratio[0] as f64 / self.default_ratio[1] as f64
    }

    /// Embed URL for a video identifier.
    pub fn embed_url(&self, id: &str) -> String {
        let mut url = format!("https://{}/embed/{}", self.embed_host, id);
        if !self.embed_params.is_empty() {
            url.push('?');
            url.push_str(&self.embed_params);
        }
        url
    }
}

/// Which interactive controls are attached to each carousel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlsConfig {
    /// Previous/next buttons in the control layer.
    pub arrows: bool,
    /// Position-indicator strip.
    pub indicators: bool,
    /// Full-screen preview overlay.
    pub lightbox: bool,
    /// CSS `transition` applied to every slide.
    pub transition: String,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            arrows: true,
            indicators: true,
            lightbox: true,
            transition: "opacity 0.4s ease".to_string(),
        }
    }
}

/// Caption text transform settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionsConfig {
    /// Render caption text as markdown. When false, captions pass through unchanged.
    pub markdown: bool,
}

impl Default for CaptionsConfig {
    fn default() -> Self {
        Self { markdown: true }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SlideshowConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `slideshow.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SlideshowConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SlideshowConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `slideshow.toml` in the given directory, on top of the
/// stock defaults.
pub fn load_config(dir: &Path) -> Result<SlideshowConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `slideshow.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Slideshow Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Markup conventions
# ---------------------------------------------------------------------------
[markup]
# Class marking a carousel container. Its children become slides.
container_class = "slideshow"

# Class of a block placed right after an image or video to caption it.
caption_class = "slide-caption"

# Caption attribute on the media item itself (used when no caption block follows).
caption_attribute = "data-caption"

# Caption of last resort, usually the image alt text.
fallback_attribute = "alt"

# Attribute turning any element into a video placeholder.
video_attribute = "data-youtube-id"

# Container attribute forcing the frame ratio, e.g. "4/3", "16:9" or "1.5".
ratio_attribute = "data-aspect-ratio"

# Marker written onto containers once initialized. Marked containers are skipped.
initialized_attribute = "data-slideshow-initialized"

# ---------------------------------------------------------------------------
# Video embedding
# ---------------------------------------------------------------------------
[video]
# Embed URL is https://<embed_host>/embed/<id>?<embed_params>
embed_host = "www.youtube.com"
embed_params = "rel=0&controls=1&showinfo=0&vq=hd1080&enablejsapi=1"

# Ratio as [width, height] for video slides. Also the frame ratio used when
# no image reports its size.
default_ratio = [16, 9]

# ---------------------------------------------------------------------------
# Controls
# ---------------------------------------------------------------------------
[controls]
arrows = true
indicators = true
lightbox = true

# CSS transition applied when slides change.
transition = "opacity 0.4s ease"

# ---------------------------------------------------------------------------
# Captions
# ---------------------------------------------------------------------------
[captions]
# Render captions as markdown. Set to false to insert caption text unchanged.
markdown = true
"##
}
