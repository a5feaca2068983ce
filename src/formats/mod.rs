//! Image format registry and the per-file transform.
//!
//! Each supported format is one variant of [`ImageFormat`]. A file is
//! transformed by decoding its bytes into pixels and encoding those pixels
//! again, which drops every ancillary block the encoder does not write
//! itself (EXIF, XMP, text chunks, comments).

pub mod jpeg;
pub mod png;

use crate::error::{Error, Result};
use image::DynamicImage;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Every registered format.
    pub const ALL: [ImageFormat; 2] = [ImageFormat::Jpeg, ImageFormat::Png];

    /// Get the format name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
        }
    }

    /// Get the lowercase file extensions for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ImageFormat::Jpeg => &["jpg", "jpeg"],
            ImageFormat::Png => &["png"],
        }
    }

    /// Classify a path by its extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    /// Decode raw file bytes.
    pub fn decode(&self, data: &[u8], path: &Path) -> Result<DynamicImage> {
        match self {
            ImageFormat::Jpeg => jpeg::decode(data, path),
            ImageFormat::Png => png::decode(data, path),
        }
    }

    /// Encode pixels back into file bytes, without metadata.
    pub fn encode(&self, image: &DynamicImage, path: &Path) -> Result<Vec<u8>> {
        match self {
            ImageFormat::Jpeg => jpeg::encode(image, path),
            ImageFormat::Png => png::encode(image, path),
        }
    }
}

/// Size of a file before and after its rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transformed {
    pub bytes_before: u64,
    pub bytes_after: u64,
}

/// A per-file transform, as seen by the worker pool.
pub trait Transformer: Send + Sync {
    /// Whether `path` should be handed to [`Transformer::transform`].
    fn accepts(&self, path: &Path) -> bool;

    /// Rewrite the file at `path`.
    fn transform(&self, path: &Path) -> Result<Transformed>;
}

/// The production transformer: dispatches on [`ImageFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Registry {
    dry_run: bool,
}

impl Registry {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl Transformer for Registry {
    fn accepts(&self, path: &Path) -> bool {
        ImageFormat::from_path(path).is_some()
    }

    fn transform(&self, path: &Path) -> Result<Transformed> {
        let format = ImageFormat::from_path(path).ok_or_else(|| Error::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        transform_file(format, path, self.dry_run)
    }
}

/// Decode the file at `path` and overwrite it with the re-encoded pixels.
///
/// The file is fully read and re-encoded in memory before it is reopened for
/// writing. There is no temp-file-and-rename step: a crash during the final
/// write can leave the file truncated.
pub fn transform_file(format: ImageFormat, path: &Path, dry_run: bool) -> Result<Transformed> {
    let data = fs::read(path).map_err(|e| Error::io_with_path(e, path))?;
    let image = format.decode(&data, path)?;
    let encoded = format.encode(&image, path)?;

    let stats = Transformed {
        bytes_before: data.len() as u64,
        bytes_after: encoded.len() as u64,
    };

    if dry_run {
        debug!(path = %path.display(), format = format.name(), "dry run, leaving file untouched");
        return Ok(stats);
    }

    let mut file = fs::File::create(path).map_err(|e| Error::io_with_path(e, path))?;
    file.write_all(&encoded)
        .map_err(|e| Error::io_with_path(e, path))?;
    file.flush().map_err(|e| Error::io_with_path(e, path))?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn test_from_path_jpeg() {
        assert_eq!(ImageFormat::from_path(Path::new("photo.jpg")), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_path(Path::new("photo.JPEG")), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_path(Path::new("a/b/photo.JpG")), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_from_path_png() {
        assert_eq!(ImageFormat::from_path(Path::new("image.png")), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_path(Path::new("IMAGE.PNG")), Some(ImageFormat::Png));
    }

    #[test]
    fn test_from_path_unknown() {
        assert_eq!(ImageFormat::from_path(Path::new("file.bmp")), None);
        assert_eq!(ImageFormat::from_path(Path::new("file.txt")), None);
        assert_eq!(ImageFormat::from_path(Path::new("jpg")), None);
        assert_eq!(ImageFormat::from_path(Path::new("archive.jpg.gz")), None);
    }

    #[test]
    fn test_format_name() {
        assert_eq!(ImageFormat::Jpeg.name(), "JPEG");
        assert_eq!(ImageFormat::Png.name(), "PNG");
    }

    #[test]
    fn test_registry_accepts() {
        let registry = Registry::default();
        assert!(registry.accepts(Path::new("test.jpg")));
        assert!(registry.accepts(Path::new("test.jpeg")));
        assert!(registry.accepts(Path::new("test.png")));
        assert!(!registry.accepts(Path::new("test.gif")));
        assert!(!registry.accepts(Path::new("test.txt")));
    }

    #[test]
    fn test_registry_rejects_unsupported() {
        let registry = Registry::default();
        let err = registry.transform(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_transform_missing_file() {
        let dir = tempdir().unwrap();
        let err = transform_file(ImageFormat::Png, &dir.path().join("gone.png"), false).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_transform_rewrites_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pixels.png");
        RgbImage::from_pixel(3, 2, Rgb([10, 200, 30])).save(&path).unwrap();

        let stats = transform_file(ImageFormat::Png, &path, false).unwrap();
        assert_eq!(stats.bytes_after, fs::metadata(&path).unwrap().len());

        let reread = image::open(&path).unwrap().to_rgb8();
        assert_eq!(reread.dimensions(), (3, 2));
        assert_eq!(reread.get_pixel(2, 1), &Rgb([10, 200, 30]));
    }

    #[test]
    fn test_transform_dry_run_leaves_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tagged.png");
        let original = png::create_png_with_metadata();
        fs::write(&path, &original).unwrap();

        let stats = transform_file(ImageFormat::Png, &path, true).unwrap();
        assert_eq!(stats.bytes_before, original.len() as u64);
        assert!(stats.bytes_after < stats.bytes_before);
        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_transform_corrupt_does_not_truncate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"definitely not a jpeg").unwrap();

        let err = transform_file(ImageFormat::Jpeg, &path, false).unwrap_err();
        assert!(matches!(err, Error::Decode { format: "JPEG", .. }));
        assert_eq!(fs::read(&path).unwrap(), b"definitely not a jpeg");
    }
}
