//! Project state: the ordered image list of an opened directory.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::format::is_image_file;

/// An opened directory and the position in its image list.
#[derive(Clone, Debug, Default)]
pub struct ProjectState {
    /// Directory the images were scanned from.
    pub folder: PathBuf,
    /// Image files, natural-sorted, including subdirectories.
    pub images: Vec<PathBuf>,
    /// Index into `images`.
    pub current_index: usize,
}

impl ProjectState {
    /// Scan `folder` recursively for images.
    ///
    /// Unreadable subdirectories are logged and skipped; only an unreadable
    /// root is an error. The list may be empty.
    pub fn scan(folder: impl Into<PathBuf>) -> std::io::Result<Self> {
        let folder = folder.into();
        let mut images = Vec::new();
        scan_folder_recursive(&folder, &mut images)?;
        images.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));

        log::info!(
            "Recursively scanned folder {:?}: found {} images",
            folder,
            images.len()
        );

        Ok(Self {
            folder,
            images,
            current_index: 0,
        })
    }

    /// Scan again, keeping the position as close as possible.
    pub fn rescan(&mut self) -> std::io::Result<()> {
        let index = self.current_index;
        *self = Self::scan(self.folder.clone())?;
        self.current_index = index.min(self.images.len().saturating_sub(1));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Get the current image path.
    pub fn current_image(&self) -> Option<&PathBuf> {
        self.images.get(self.current_index)
    }

    /// Image before the current one.
    pub fn previous_image(&self) -> Option<&PathBuf> {
        self.current_index
            .checked_sub(1)
            .and_then(|i| self.images.get(i))
    }

    /// Position of `path` in the list.
    pub fn index_of(&self, path: &Path) -> Option<usize> {
        self.images.iter().position(|p| p == path)
    }

    /// Get the current image name relative to the project folder.
    pub fn current_name(&self) -> String {
        let Some(path) = self.current_image() else {
            return "Unknown".to_string();
        };
        path.strip_prefix(&self.folder)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }

    /// Move to the next image. Stops at the last one.
    pub fn next(&mut self) -> bool {
        if self.current_index + 1 < self.images.len() {
            self.current_index += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous image. Stops at the first one.
    pub fn prev(&mut self) -> bool {
        if self.current_index > 0 && !self.images.is_empty() {
            self.current_index -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to the 1-based position `n`, clamped to the list.
    pub fn go_to(&mut self, n: usize) -> bool {
        if self.images.is_empty() {
            return false;
        }
        let index = n.clamp(1, self.images.len()) - 1;
        let changed = index != self.current_index;
        self.current_index = index;
        changed
    }

    /// Get progress string like "3/15".
    pub fn progress(&self) -> String {
        format!("{}/{}", self.current_index + 1, self.images.len())
    }
}

fn scan_folder_recursive(folder: &Path, images: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(folder)?.filter_map(|e| e.ok()) {
        let path = entry.path();

        if path.is_file() && is_image_file(&path) {
            images.push(path);
        } else if path.is_dir() {
            if let Err(e) = scan_folder_recursive(&path, images) {
                log::warn!("Failed to scan subdirectory {:?}: {}", path, e);
            }
        }
    }
    Ok(())
}

/// Case-insensitive comparison treating digit runs as numbers, so "img2" < "img10".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    let (mut a, mut b) = (a.as_str(), b.as_str());

    loop {
        match (a.chars().next(), b.chars().next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let (na, rest_a) = split_digits(a);
                let (nb, rest_b) = split_digits(b);
                let ord = compare_numbers(na, nb);
                if ord != Ordering::Equal {
                    return ord;
                }
                a = rest_a;
                b = rest_b;
            }
            (Some(ca), Some(cb)) => {
                if ca != cb {
                    return ca.cmp(&cb);
                }
                a = &a[ca.len_utf8()..];
                b = &b[cb.len_utf8()..];
            }
        }
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
