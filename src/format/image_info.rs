//! Image metadata needed by the annotation codecs.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageDecoder, ImageReader};

use crate::format::error::FormatError;
use crate::model::Bounds;

/// Supported image extensions
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp", "gif"];

/// The image an annotation file belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    /// Path to the image file.
    pub path: PathBuf,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Number of color channels (3 for RGB, 1 for grayscale).
    pub depth: u8,
}

impl ImageInfo {
    /// Describe an image whose dimensions are already known.
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
            depth: 3,
        }
    }

    /// Set the channel count.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    /// Read the image header to learn its dimensions and channel count.
    ///
    /// Pixel data is not decoded.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self, FormatError> {
        let path = path.into();
        let decoder = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_decoder()
            .map_err(|e| FormatError::invalid_file(&path, format!("Failed to read image: {}", e)))?;
        let (width, height) = decoder.dimensions();
        let depth = decoder.color_type().channel_count();

        log::trace!(
            "ImageInfo: read {:?} as {}x{} ({} channels)",
            path,
            width,
            height,
            depth
        );

        Ok(Self {
            path,
            width,
            height,
            depth,
        })
    }

    /// Read an image file's header from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_bytes(path, &bytes)
    }

    /// Whether both dimensions are known and non-zero.
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Clamp region for shapes drawn on this image.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }

    /// File name of the image, e.g. `img1.jpg`.
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// File name without extension, e.g. `img1`.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Name of the directory containing the image.
    pub fn folder_name(&self) -> String {
        self.path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string()
    }
}

/// Check if a path has a supported image extension
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_from_bytes_reads_dimensions() {
        let info = ImageInfo::from_bytes("dir/img1.png", &png_bytes(64, 48)).unwrap();
        assert_eq!(info.width, 64);
        assert_eq!(info.height, 48);
        assert_eq!(info.depth, 3);
        assert_eq!(info.filename(), "img1.png");
        assert_eq!(info.stem(), "img1");
        assert_eq!(info.folder_name(), "dir");
    }

    #[test]
    fn test_from_bytes_grayscale_depth() {
        let img = image::DynamicImage::ImageLuma8(image::GrayImage::new(10, 7));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let info = ImageInfo::from_bytes("gray.png", &bytes).unwrap();
        assert_eq!((info.width, info.height, info.depth), (10, 7, 1));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let err = ImageInfo::from_bytes("broken.png", b"not an image").unwrap_err();
        assert!(matches!(err, FormatError::InvalidFile { .. }));
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a/b.JPG")));
        assert!(is_image_file(Path::new("b.webp")));
        assert!(!is_image_file(Path::new("b.xml")));
        assert!(!is_image_file(Path::new("classes")));
    }
}
