//! Annotation file formats.
//!
//! Each on-disk format implements the [`LabelCodec`] trait and is selected
//! through the [`LabelFormat`] enum, so the active format is explicit state
//! rather than a global file suffix.
//!
//! ## Supported Formats
//!
//! - **Pascal VOC XML**: one file per image, integer pixel boxes
//! - **YOLO TXT**: one file per image, normalized boxes, shared `classes.txt`
//! - **CreateML JSON**: one array of image entries, center-based pixel boxes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use labelkit::format::{ImageInfo, LabelFormat, WriteContext};
//!
//! let image = ImageInfo::open("images/img1.jpg")?;
//! let classes = vec!["cat".to_string()];
//! let ctx = WriteContext::new(&image, &classes);
//! let written = LabelFormat::Yolo.codec().write("images/img1".as_ref(), &shapes, &ctx)?;
//! ```

mod common;
mod error;
pub mod formats;
mod image_info;
mod label_format;
mod traits;

pub use common::ensure_extension;
pub use error::FormatError;
pub use image_info::{IMAGE_EXTENSIONS, ImageInfo, is_image_file};
pub use label_format::LabelFormat;
pub use traits::{LabelCodec, ReadContext, ReadOutcome, WriteContext};
