//! Natural image dimension lookup.
//!
//! A browser knows an image's natural size once it has loaded. Headless, the
//! same knowledge comes from a [`DimensionProbe`]: the collector asks it at
//! build time, and anything it cannot answer is deferred until the host
//! reports a load (see [`crate::carousel::WidgetEvent::ImageLoaded`]).
//!
//! - [`NoProbe`]: knows nothing; every image waits for a load event.
//! - [`FsProbe`]: reads local files with the `image` crate. Only the header
//!   is parsed, so probing is cheap even for large photographs.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image source: {0}")]
    Unsupported(String),
    #[error("Failed to read dimensions: {0}")]
    Decode(String),
}

/// Natural pixel size of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, `None` when either side is zero.
    pub fn ratio(self) -> Option<f64> {
        (self.width > 0 && self.height > 0).then(|| self.width as f64 / self.height as f64)
    }
}

/// Source of natural image dimensions, keyed by the image's `src`.
pub trait DimensionProbe {
    fn identify(&self, src: &str) -> Result<Dimensions, ProbeError>;
}

/// Probe that never knows anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl DimensionProbe for NoProbe {
    fn identify(&self, src: &str) -> Result<Dimensions, ProbeError> {
        Err(ProbeError::Unsupported(src.to_string()))
    }
}

/// Probe reading image headers from a local asset directory.
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
}

impl FsProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an `src` attribute to a file under the root.
    ///
    /// Remote URLs, protocol-relative URLs and `data:` URIs are not
    /// resolvable. Query strings and fragments are stripped. Paths that
    /// climb out of the root with `..` are rejected.
    pub fn resolve(&self, src: &str) -> Option<PathBuf> {
        let src = src.trim();
        if src.is_empty() || src.starts_with("//") || src.starts_with("data:") || src.contains("://")
        {
            return None;
        }
        let path = src.split(['?', '#']).next().unwrap_or_default();
        let relative = Path::new(path.trim_start_matches('/'));
        if relative.as_os_str().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl DimensionProbe for FsProbe {
    fn identify(&self, src: &str) -> Result<Dimensions, ProbeError> {
        let path = self
            .resolve(src)
            .ok_or_else(|| ProbeError::Unsupported(src.to_string()))?;
        if !path.is_file() {
            return Err(ProbeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        let (width, height) =
            image::image_dimensions(&path).map_err(|e| ProbeError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ratio_of_known_dimensions() {
        assert_eq!(Dimensions::new(1000, 500).ratio(), Some(2.0));
        assert_eq!(Dimensions::new(0, 500).ratio(), None);
        assert_eq!(Dimensions::new(1000, 0).ratio(), None);
    }

    #[test]
    fn no_probe_knows_nothing() {
        assert!(matches!(
            NoProbe.identify("a.png"),
            Err(ProbeError::Unsupported(_))
        ));
    }

    #[test]
    fn fs_probe_resolves_relative_and_rooted_paths() {
        let probe = FsProbe::new("/site");
        assert_eq!(
            probe.resolve("img/a.png?v=2#top"),
            Some(PathBuf::from("/site/img/a.png"))
        );
        assert_eq!(
            probe.resolve("/img/a.png"),
            Some(PathBuf::from("/site/img/a.png"))
        );
    }

    #[test]
    fn fs_probe_rejects_remote_sources() {
        let probe = FsProbe::new("/site");
        assert_eq!(probe.resolve("https://example.com/a.png"), None);
        assert_eq!(probe.resolve("//cdn.example.com/a.png"), None);
        assert_eq!(probe.resolve("data:image/png;base64,AAAA"), None);
        assert_eq!(probe.resolve(""), None);
    }

    #[test]
    fn fs_probe_rejects_parent_traversal() {
        let probe = FsProbe::new("/site");
        assert_eq!(probe.resolve("../../secret.png"), None);
        assert_eq!(probe.resolve("img/../../secret.png"), None);
        assert_eq!(probe.resolve("/../secret.png"), None);
        assert_eq!(
            probe.resolve("./img/a.png"),
            Some(PathBuf::from("/site/./img/a.png"))
        );
    }

    #[test]
    fn fs_probe_will_not_read_outside_root() {
        let outer = TempDir::new().unwrap();
        image::RgbImage::new(4, 4)
            .save(outer.path().join("secret.png"))
            .unwrap();
        let root = outer.path().join("site");
        std::fs::create_dir(&root).unwrap();

        let probe = FsProbe::new(&root);
        assert!(matches!(
            probe.identify("../secret.png"),
            Err(ProbeError::Unsupported(_))
        ));
    }

    #[test]
    fn fs_probe_reads_real_image() {
        let tmp = TempDir::new().unwrap();
        let img = image::RgbImage::new(40, 10);
        img.save(tmp.path().join("wide.png")).unwrap();

        let probe = FsProbe::new(tmp.path());
        let dims = probe.identify("wide.png").unwrap();
        assert_eq!(dims, Dimensions::new(40, 10));
    }

    #[test]
    fn fs_probe_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let probe = FsProbe::new(tmp.path());
        assert!(matches!(
            probe.identify("missing.png"),
            Err(ProbeError::Io(_))
        ));
    }

    #[test]
    fn mock_probe_records_lookups() {
        let probe = mock::MockProbe::new().with("a.png", 4, 3);
        assert_eq!(probe.identify("a.png").unwrap(), Dimensions::new(4, 3));
        assert!(probe.identify("b.png").is_err());
        assert_eq!(probe.lookups(), vec!["a.png", "b.png"]);
    }
}
