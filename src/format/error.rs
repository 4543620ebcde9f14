//! Error types for annotation format operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading or writing annotation files.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations. Saves surface every failure as this kind.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parsing or serialization error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Unreadable image or malformed label file
    #[error("Invalid file {path:?}: {message}")]
    InvalidFile {
        /// File that could not be interpreted
        path: PathBuf,
        /// Description of the problem
        message: String,
    },

    /// Image dimensions required but not available
    #[error("Image dimensions required for format '{format}' but not available for image {image:?}")]
    MissingDimensions {
        /// The format requiring dimensions
        format: String,
        /// The image missing dimensions
        image: PathBuf,
    },
}

impl FormatError {
    /// Create an invalid file error.
    pub fn invalid_file(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::InvalidFile {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a missing dimensions error.
    pub fn missing_dimensions(format: impl Into<String>, image: impl AsRef<Path>) -> Self {
        Self::MissingDimensions {
            format: format.into(),
            image: image.as_ref().to_path_buf(),
        }
    }

    /// Whether this is an I/O failure (as opposed to bad content).
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
