//! Label history: the ordered set of class labels known to a session.

use std::path::Path;

use crate::format::FormatError;
use crate::format::formats::read_class_list;

/// Ordered set of labels, in first-seen order.
///
/// Grows monotonically within a session. Persisted as the predefined classes
/// file (one label per line), and used as the YOLO class list so indices stay
/// stable across saves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelHistory {
    labels: Vec<String>,
}

impl LabelHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label unless it is blank or already known. Returns whether it was added.
    pub fn insert(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || self.contains(label) {
            return false;
        }
        self.labels.push(label.to_string());
        true
    }

    /// Add every label in order, returning how many were new.
    pub fn extend<'a>(&mut self, labels: impl IntoIterator<Item = &'a str>) -> usize {
        labels.into_iter().filter(|l| self.insert(l)).count()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn first(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Load a predefined classes file, appending its labels.
    ///
    /// Blank lines and duplicates are skipped. Returns how many labels were new.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, FormatError> {
        let labels = read_class_list(path)?;
        let added = self.extend(labels.iter().map(String::as_str));
        log::info!(
            "Loaded {} classes from {:?} ({} new)",
            labels.len(),
            path,
            added
        );
        Ok(added)
    }

    /// Write the history as a predefined classes file.
    pub fn save_file(&self, path: &Path) -> Result<(), FormatError> {
        let mut content = self.labels.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        log::info!("Saved {} classes to {:?}", self.labels.len(), path);
        Ok(())
    }
}
