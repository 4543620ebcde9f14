//! Trait definitions for annotation format implementations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::format::error::FormatError;
use crate::format::image_info::ImageInfo;
use crate::model::Shape;

/// Trait for annotation file codecs.
///
/// Each on-disk format (Pascal VOC, YOLO, CreateML) implements this trait to
/// provide bidirectional conversion between a list of [`Shape`]s and one
/// annotation file.
pub trait LabelCodec: Send + Sync {
    /// Unique identifier for this format (e.g., "voc", "yolo", "createml").
    fn id(&self) -> &'static str;

    /// Human-readable name for UI display.
    fn display_name(&self) -> &'static str;

    /// File extension written by this format, without the dot.
    fn extension(&self) -> &'static str;

    /// Read the shapes stored for `ctx.image` in the file at `path`.
    fn read(&self, path: &Path, ctx: &ReadContext<'_>) -> Result<ReadOutcome, FormatError>;

    /// Write `shapes` for `ctx.image` to `path`.
    ///
    /// The format's extension is appended when `path` lacks it. Returns the
    /// path actually written.
    fn write(
        &self,
        path: &Path,
        shapes: &[Shape],
        ctx: &WriteContext<'_>,
    ) -> Result<PathBuf, FormatError>;
}

/// Inputs needed to interpret an annotation file.
#[derive(Debug, Clone, Copy)]
pub struct ReadContext<'a> {
    /// The image the annotations belong to.
    pub image: &'a ImageInfo,
    /// Ordered class list used when the file has no class list of its own.
    pub classes: &'a [String],
}

impl<'a> ReadContext<'a> {
    pub fn new(image: &'a ImageInfo, classes: &'a [String]) -> Self {
        Self { image, classes }
    }
}

/// Inputs needed to write an annotation file.
#[derive(Debug, Clone, Copy)]
pub struct WriteContext<'a> {
    /// The image the annotations belong to.
    pub image: &'a ImageInfo,
    /// Ordered class list (label history).
    pub classes: &'a [String],
    /// Whether a human verified this image's annotations.
    pub verified: bool,
}

impl<'a> WriteContext<'a> {
    pub fn new(image: &'a ImageInfo, classes: &'a [String]) -> Self {
        Self {
            image,
            classes,
            verified: false,
        }
    }

    /// Set the verified flag.
    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }
}

/// Result of reading an annotation file.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    /// Shapes in file order.
    pub shapes: Vec<Shape>,
    /// Whether the file marks the image as verified.
    pub verified: bool,
    /// Class list the file was interpreted with (YOLO only).
    pub classes: Vec<String>,
    /// Dropped objects per out-of-range class index (YOLO only).
    pub invalid_classes: BTreeMap<i64, usize>,
}

impl ReadOutcome {
    /// Total number of objects dropped for an invalid class index.
    pub fn invalid_total(&self) -> usize {
        self.invalid_classes.values().sum()
    }

    /// Check if the file needs rewriting to drop invalid objects.
    pub fn needs_cleaning(&self) -> bool {
        !self.invalid_classes.is_empty()
    }
}
