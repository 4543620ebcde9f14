//! Bijection between shape identities and list-row identities.

use std::collections::HashMap;

use crate::model::ShapeId;

/// Identity of a row in the label list.
pub type RowId = u32;

/// Two-way map between shapes on the canvas and rows in the label list.
///
/// Owned by the annotation store; every insert and removal updates both
/// directions together.
#[derive(Clone, Debug, Default)]
pub struct RowIndex {
    by_shape: HashMap<ShapeId, RowId>,
    by_row: HashMap<RowId, ShapeId>,
    next_row: RowId,
}

impl RowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a fresh row to `shape`, replacing any row it already had.
    pub fn insert(&mut self, shape: ShapeId) -> RowId {
        self.remove_shape(shape);
        let row = self.next_row;
        self.next_row += 1;
        self.by_shape.insert(shape, row);
        self.by_row.insert(row, shape);
        row
    }

    /// Drop the pair for `shape`, returning its row.
    pub fn remove_shape(&mut self, shape: ShapeId) -> Option<RowId> {
        let row = self.by_shape.remove(&shape)?;
        self.by_row.remove(&row);
        Some(row)
    }

    pub fn row_for(&self, shape: ShapeId) -> Option<RowId> {
        self.by_shape.get(&shape).copied()
    }

    pub fn shape_for(&self, row: RowId) -> Option<ShapeId> {
        self.by_row.get(&row).copied()
    }

    pub fn len(&self) -> usize {
        self.by_shape.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_shape.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_shape.clear();
        self.by_row.clear();
        self.next_row = 0;
    }

    /// Check that both directions agree.
    pub fn is_consistent(&self) -> bool {
        self.by_shape.len() == self.by_row.len()
            && self
                .by_shape
                .iter()
                .all(|(shape, row)| self.by_row.get(row) == Some(shape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut index = RowIndex::new();
        let r1 = index.insert(7);
        let r2 = index.insert(9);
        assert_ne!(r1, r2);
        assert_eq!(index.row_for(7), Some(r1));
        assert_eq!(index.shape_for(r2), Some(9));
        assert!(index.is_consistent());
    }

    #[test]
    fn test_reinsert_replaces_row() {
        let mut index = RowIndex::new();
        let old = index.insert(1);
        let new = index.insert(1);
        assert_ne!(old, new);
        assert_eq!(index.shape_for(old), None);
        assert_eq!(index.len(), 1);
        assert!(index.is_consistent());
    }

    #[test]
    fn test_remove() {
        let mut index = RowIndex::new();
        let row = index.insert(3);
        assert_eq!(index.remove_shape(3), Some(row));
        assert_eq!(index.remove_shape(3), None);
        assert!(index.is_empty());
        assert!(index.is_consistent());
    }
}
