//! Class visibility filter.

use std::collections::BTreeSet;

use crate::model::Shape;

/// Which labels are shown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ClassSelection {
    /// Every label is shown.
    #[default]
    All,
    /// Only these labels are shown.
    Only(BTreeSet<String>),
}

/// Derived show/hide state by label. Never changes the shapes' data.
#[derive(Clone, Debug, Default)]
pub struct ClassFilter {
    selection: ClassSelection,
    known_classes: Vec<String>,
}

impl ClassFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &ClassSelection {
        &self.selection
    }

    /// Classes offered to the user, in first-seen order.
    pub fn known_classes(&self) -> &[String] {
        &self.known_classes
    }

    pub fn set_filter(&mut self, selection: ClassSelection) {
        self.selection = selection;
    }

    pub fn show_all(&mut self) {
        self.selection = ClassSelection::All;
    }

    /// Flip one label.
    ///
    /// Toggling while showing everything switches to an explicit set holding
    /// every known class except `label`.
    pub fn toggle_class(&mut self, label: &str) {
        match &mut self.selection {
            ClassSelection::All => {
                let set = self
                    .known_classes
                    .iter()
                    .filter(|c| *c != label)
                    .cloned()
                    .collect();
                self.selection = ClassSelection::Only(set);
            }
            ClassSelection::Only(set) => {
                if !set.remove(label) {
                    set.insert(label.to_string());
                }
            }
        }
    }

    /// Make a label known. New classes start unchecked under an explicit selection.
    pub fn register_class(&mut self, label: &str) -> bool {
        if self.known_classes.iter().any(|c| c == label) {
            return false;
        }
        self.known_classes.push(label.to_string());
        true
    }

    pub fn is_visible(&self, label: &str) -> bool {
        match &self.selection {
            ClassSelection::All => true,
            ClassSelection::Only(set) => set.contains(label),
        }
    }

    /// Set each shape's `visible` flag from its label.
    pub fn apply(&self, shapes: &mut [Shape]) {
        for shape in shapes {
            shape.visible = self.is_visible(&shape.label);
        }
    }
}
