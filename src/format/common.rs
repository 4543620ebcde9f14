//! Helpers shared by the codec implementations.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::format::error::FormatError;

/// Append `.{ext}` unless `path` already ends with that extension (case-insensitive).
pub fn ensure_extension(path: &Path, ext: &str) -> PathBuf {
    let has_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext));
    if has_ext {
        return path.to_path_buf();
    }

    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Replace the file at `path` with `bytes`, or leave it untouched on failure.
///
/// The content goes to a temporary sibling first and is renamed over the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), FormatError> {
    StagedFile::write(path, bytes)?.commit()
}

/// Content written next to its target but not yet renamed over it.
///
/// Dropping an uncommitted file removes the temporary copy, so several files
/// can be staged and only committed once all of them were written.
#[derive(Debug)]
pub struct StagedFile {
    tmp_path: PathBuf,
    target: PathBuf,
    len: usize,
    committed: bool,
}

impl StagedFile {
    pub fn write(path: &Path, bytes: &[u8]) -> Result<Self, FormatError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| FormatError::invalid_file(path, "Target path has no file name"))?;

        let mut tmp_name = OsString::from(".");
        tmp_name.push(file_name);
        tmp_name.push(".tmp");
        let staged = Self {
            tmp_path: path.with_file_name(tmp_name),
            target: path.to_path_buf(),
            len: bytes.len(),
            committed: false,
        };

        std::fs::write(&staged.tmp_path, bytes)?;
        Ok(staged)
    }

    /// Rename the staged content over the target.
    pub fn commit(mut self) -> Result<(), FormatError> {
        std::fs::rename(&self.tmp_path, &self.target)?;
        self.committed = true;
        log::trace!("Wrote {} bytes to {:?}", self.len, self.target);
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.tmp_path);
        }
    }
}

/// Read a label file as text. Content that is not UTF-8 is an invalid file.
pub fn read_text(path: &Path) -> Result<String, FormatError> {
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes)
        .map_err(|e| FormatError::invalid_file(path, format!("File is not valid UTF-8: {}", e)))
}

/// Parse a numeric field that may be written as an integer or a float.
pub fn parse_number(text: &str) -> Option<f32> {
    text.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}
