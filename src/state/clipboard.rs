//! Copy/paste buffer shared across images.

use std::path::{Path, PathBuf};

use crate::constants::{DUPLICATE_TOLERANCE, PASTE_OFFSET};
use crate::model::{Bounds, Shape};

/// Result of a paste.
#[derive(Clone, Debug, Default)]
pub struct PasteOutcome {
    /// Shapes to insert into the target store.
    pub shapes: Vec<Shape>,
    /// Entries skipped as duplicates of existing shapes.
    pub skipped: usize,
}

/// Detached shape copies and the image they were copied from.
#[derive(Clone, Debug, Default)]
pub struct Clipboard {
    entries: Vec<Entry>,
    source_image: Option<PathBuf>,
}

/// A copied shape and the direction it steps in on same-image pastes.
#[derive(Clone, Debug)]
struct Entry {
    shape: Shape,
    step_x: f32,
    step_y: f32,
}

impl Entry {
    fn new(shape: &Shape) -> Self {
        Self {
            shape: shape.detached_copy(),
            step_x: PASTE_OFFSET,
            step_y: PASTE_OFFSET,
        }
    }

    /// Step away from the last pasted position.
    fn step(&mut self, bounds: Option<Bounds>) {
        (self.step_x, self.step_y) =
            offset_shape(&mut self.shape, self.step_x, self.step_y, bounds);
    }
}

/// Move `shape` by the paste offset `(step_x, step_y)` inside `bounds`.
///
/// An axis pinned against the edge it is heading to reverses direction.
/// Returns the steps actually taken.
pub(crate) fn offset_shape(
    shape: &mut Shape,
    step_x: f32,
    step_y: f32,
    bounds: Option<Bounds>,
) -> (f32, f32) {
    let (mut step_x, mut step_y) = (step_x, step_y);
    if let (Some(bounds), Some(bbox)) = (bounds, shape.bounding_box()) {
        step_x = turn_at_edge(step_x, bbox.x_min, bbox.x_max, bounds.width);
        step_y = turn_at_edge(step_y, bbox.y_min, bbox.y_max, bounds.height);
    }
    shape.move_by(step_x, step_y, bounds);
    (step_x, step_y)
}

fn turn_at_edge(step: f32, min: f32, max: f32, extent: f32) -> f32 {
    let pinned = if step > 0.0 { max >= extent } else { min <= 0.0 };
    if pinned { -step } else { step }
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn source_image(&self) -> Option<&Path> {
        self.source_image.as_deref()
    }

    /// Replace the contents with copies of `shapes`.
    pub fn copy<'a>(
        &mut self,
        shapes: impl IntoIterator<Item = &'a Shape>,
        source_image: &Path,
    ) -> usize {
        self.entries = shapes.into_iter().map(Entry::new).collect();
        self.source_image = Some(source_image.to_path_buf());
        log::debug!(
            "Copied {} shapes from {:?}",
            self.entries.len(),
            source_image
        );
        self.entries.len()
    }

    /// Produce the shapes to paste into `target_image`.
    ///
    /// Into the source image, every entry is offset and the clipboard follows
    /// the pasted positions, so repeated pastes step further. Into another
    /// image, entries matching an `existing` shape are skipped.
    pub fn paste(
        &mut self,
        target_image: &Path,
        existing: &[Shape],
        bounds: Option<Bounds>,
    ) -> PasteOutcome {
        if self.entries.is_empty() {
            return PasteOutcome::default();
        }

        if self.source_image.as_deref() == Some(target_image) {
            for entry in &mut self.entries {
                entry.step(bounds);
            }
            return PasteOutcome {
                shapes: self.entries.iter().map(|e| e.shape.clone()).collect(),
                skipped: 0,
            };
        }

        let mut outcome = PasteOutcome::default();
        for entry in &self.entries {
            if is_duplicate(&entry.shape, existing) {
                outcome.skipped += 1;
            } else {
                outcome.shapes.push(entry.shape.clone());
            }
        }
        if outcome.skipped > 0 {
            log::info!(
                "Skipped {} duplicate shapes pasting into {:?}",
                outcome.skipped,
                target_image
            );
        }
        outcome
    }
}

fn is_duplicate(candidate: &Shape, existing: &[Shape]) -> bool {
    let Some(bbox) = candidate.bounding_box() else {
        return false;
    };
    existing.iter().any(|shape| {
        shape.label == candidate.label
            && shape
                .bounding_box()
                .is_some_and(|other| other.approx_eq(&bbox, DUPLICATE_TOLERANCE))
    })
}
