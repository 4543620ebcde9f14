//! Per-image annotation store.
//!
//! Owns the shapes of the open image together with everything derived from
//! them: the shape/row bijection, the label history, the class colors and the
//! visibility filter. All mutation goes through the store so those stay in sync.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::color_utils::{Rgba, color_for_label, fill_color};
use crate::constants::PASTE_OFFSET;
use crate::state::clipboard::offset_shape;
use crate::format::{FormatError, ImageInfo, LabelFormat, ReadContext, WriteContext};
use crate::model::{Point, Shape, ShapeId};
use crate::state::classes::LabelHistory;
use crate::state::filter::{ClassFilter, ClassSelection};
use crate::state::row_index::{RowId, RowIndex};

/// What happened to a file rewritten to drop invalid class lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CleanupStatus {
    /// The file had no invalid lines.
    NotNeeded,
    /// The file was rewritten without them.
    Rewritten(PathBuf),
    /// The rewrite failed; the file on disk is unchanged.
    Failed(String),
}

/// Summary of a [`AnnotationStore::load`].
#[derive(Clone, Debug)]
pub struct LoadReport {
    pub path: PathBuf,
    pub format: LabelFormat,
    /// Number of shapes loaded.
    pub shapes: usize,
    /// Whether any point had to be moved into the image.
    pub snapped: bool,
    /// Dropped objects per invalid class index.
    pub invalid_classes: BTreeMap<i64, usize>,
    pub cleanup: CleanupStatus,
}

/// Annotation state of the open image.
#[derive(Clone, Debug)]
pub struct AnnotationStore {
    shapes: Vec<Shape>,
    rows: RowIndex,
    next_shape_id: ShapeId,
    image: Option<ImageInfo>,
    labels: LabelHistory,
    class_colors: HashMap<String, Rgba>,
    filter: ClassFilter,
    format: LabelFormat,
    dirty: bool,
    verified: bool,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new(LabelFormat::default())
    }
}

impl AnnotationStore {
    pub fn new(format: LabelFormat) -> Self {
        Self {
            shapes: Vec::new(),
            rows: RowIndex::new(),
            next_shape_id: 1,
            image: None,
            labels: LabelHistory::new(),
            class_colors: HashMap::new(),
            filter: ClassFilter::new(),
            format,
            dirty: false,
            verified: false,
        }
    }

    // --- Accessors ---

    /// Shapes in z-order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn image(&self) -> Option<&ImageInfo> {
        self.image.as_ref()
    }

    pub fn labels(&self) -> &LabelHistory {
        &self.labels
    }

    pub fn filter(&self) -> &ClassFilter {
        &self.filter
    }

    pub fn format(&self) -> LabelFormat {
        self.format
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn row_for(&self, id: ShapeId) -> Option<RowId> {
        self.rows.row_for(id)
    }

    pub fn shape_for_row(&self, row: RowId) -> Option<ShapeId> {
        self.rows.shape_for(row)
    }

    /// Whether the shape list and the row index are in bijection.
    pub fn is_consistent(&self) -> bool {
        self.rows.len() == self.shapes.len()
            && self.rows.is_consistent()
            && self.shapes.iter().all(|s| self.rows.row_for(s.id).is_some())
    }

    // --- Loading and saving ---

    /// Clear the per-image state. Label history, colors, filter and format survive.
    pub fn reset(&mut self) {
        self.shapes.clear();
        self.rows.clear();
        self.next_shape_id = 1;
        self.image = None;
        self.dirty = false;
        self.verified = false;
    }

    /// Start annotating `image` with no shapes.
    pub fn open_image(&mut self, image: ImageInfo) {
        self.reset();
        self.image = Some(image);
    }

    /// Load the annotation file at `path` for `image`.
    ///
    /// Points outside the image are snapped back in, which marks the store
    /// dirty. Objects with an invalid class index are dropped and the file is
    /// rewritten without them straight away.
    pub fn load(
        &mut self,
        path: &Path,
        format: LabelFormat,
        image: ImageInfo,
    ) -> Result<LoadReport, FormatError> {
        self.open_image(image);
        self.format = format;

        let outcome = {
            let image = self.current_image(path)?;
            let ctx = ReadContext::new(image, self.labels.as_slice());
            format.codec().read(path, &ctx)?
        };

        self.labels
            .extend(outcome.classes.iter().map(String::as_str));
        self.verified = outcome.verified;

        let bounds = self.image.as_ref().map(ImageInfo::bounds);
        let mut snapped = false;
        for mut shape in outcome.shapes {
            if let Some(bounds) = bounds {
                snapped |= shape.snap_to(bounds);
            }
            self.insert(shape);
        }
        self.dirty = snapped;
        if snapped {
            log::info!("Snapped out-of-bounds points into the image for {:?}", path);
        }

        let cleanup = if outcome.invalid_classes.is_empty() {
            CleanupStatus::NotNeeded
        } else {
            match self.save(path, format) {
                Ok(written) => {
                    log::info!("Rewrote {:?} without invalid class lines", written);
                    CleanupStatus::Rewritten(written)
                }
                Err(e) => {
                    log::warn!("Failed to clean invalid class lines from {:?}: {}", path, e);
                    CleanupStatus::Failed(e.to_string())
                }
            }
        };

        log::info!(
            "Loaded {} shapes from {:?} as {}",
            self.shapes.len(),
            path,
            format
        );

        Ok(LoadReport {
            path: path.to_path_buf(),
            format,
            shapes: self.shapes.len(),
            snapped,
            invalid_classes: outcome.invalid_classes,
            cleanup,
        })
    }

    /// Add the shapes stored in another annotation file on top of the current ones.
    pub fn merge_from(&mut self, path: &Path, format: LabelFormat) -> Result<usize, FormatError> {
        let outcome = {
            let image = self.current_image(path)?;
            let ctx = ReadContext::new(image, self.labels.as_slice());
            format.codec().read(path, &ctx)?
        };
        self.labels
            .extend(outcome.classes.iter().map(String::as_str));

        let count = outcome.shapes.len();
        for shape in outcome.shapes {
            self.add_shape(shape);
        }
        log::info!("Merged {} shapes from {:?}", count, path);
        Ok(count)
    }

    /// Write the shapes to `path` in `format`.
    ///
    /// Returns the path actually written. Clears the dirty flag on success only.
    pub fn save(&mut self, path: &Path, format: LabelFormat) -> Result<PathBuf, FormatError> {
        let image = self.current_image(path)?;
        let ctx = WriteContext::new(image, self.labels.as_slice()).verified(self.verified);
        let written = format.codec().write(path, &self.shapes, &ctx)?;
        self.dirty = false;
        Ok(written)
    }

    fn current_image(&self, path: &Path) -> Result<&ImageInfo, FormatError> {
        self.image
            .as_ref()
            .ok_or_else(|| FormatError::invalid_file(path, "no image is open"))
    }

    /// Switch the format used by future saves.
    pub fn change_format(&mut self, format: LabelFormat) {
        if self.format != format {
            log::info!("Annotation format changed to {}", format);
        }
        self.format = format;
        self.dirty = true;
    }

    /// Move to the next format in the cycle and return it.
    pub fn cycle_format(&mut self) -> LabelFormat {
        let next = self.format.next();
        self.change_format(next);
        next
    }

    pub fn set_verified(&mut self, verified: bool) {
        self.verified = verified;
        self.dirty = true;
    }

    // --- Shape editing ---

    fn insert(&mut self, mut shape: Shape) -> ShapeId {
        let id = self.next_shape_id;
        self.next_shape_id += 1;

        shape.id = id;
        let trimmed = shape.label.trim();
        if trimmed.len() != shape.label.len() {
            shape.label = trimmed.to_string();
        }
        if let Some(image) = &self.image {
            if shape.snap_to(image.bounds()) {
                log::debug!("Snapped shape {} '{}' into the image", id, shape.label);
            }
        }
        paint(&self.class_colors, &mut shape);
        self.labels.insert(&shape.label);
        self.filter.register_class(&shape.label);
        shape.visible = self.filter.is_visible(&shape.label);

        log::trace!("Inserted shape {} '{}'", id, shape.label);
        self.rows.insert(id);
        self.shapes.push(shape);
        id
    }

    /// Add a shape, assigning its id and display colors.
    ///
    /// The label is trimmed and the points are clamped into the open image.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = self.insert(shape);
        self.dirty = true;
        id
    }

    /// Remove a shape. Returns it, or `None` if the id is unknown.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let pos = self.shapes.iter().position(|s| s.id == id)?;
        self.rows.remove_shape(id);
        self.dirty = true;
        Some(self.shapes.remove(pos))
    }

    /// Change one shape's label.
    pub fn rename_label(&mut self, id: ShapeId, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() {
            return false;
        }
        self.labels.insert(label);
        self.filter.register_class(label);

        let color = self.color_for(label);
        let visible = self.filter.is_visible(label);
        let Some(shape) = self.shapes.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        shape.label = label.to_string();
        shape.line_color = color;
        shape.fill_color = fill_color(color);
        shape.visible = visible;
        self.dirty = true;
        true
    }

    /// Translate a shape, keeping it inside the image.
    pub fn move_shape(&mut self, id: ShapeId, dx: f32, dy: f32) -> bool {
        let bounds = self.image.as_ref().map(ImageInfo::bounds);
        let Some(shape) = self.shapes.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        let moved = shape.move_by(dx, dy, bounds);
        self.dirty |= moved;
        moved
    }

    /// Drag one vertex of a shape, snapped into the image.
    pub fn move_vertex(&mut self, id: ShapeId, index: usize, point: Point) -> bool {
        let bounds = self.image.as_ref().map(ImageInfo::bounds);
        let Some(shape) = self.shapes.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        if index >= shape.points.len() {
            return false;
        }
        shape.move_vertex(index, point, bounds);
        self.dirty = true;
        true
    }

    /// Topmost shape under `point`.
    pub fn shape_at(&self, point: Point) -> Option<ShapeId> {
        self.shapes
            .iter()
            .rev()
            .find(|s| s.visible && s.contains_point(point))
            .map(|s| s.id)
    }

    // --- Selection ---

    /// Select a shape, keeping the current selection when `additive`.
    pub fn select(&mut self, id: ShapeId, additive: bool) -> bool {
        if self.shape(id).is_none() {
            return false;
        }
        for shape in &mut self.shapes {
            if shape.id == id {
                shape.selected = true;
            } else if !additive {
                shape.selected = false;
            }
        }
        true
    }

    pub fn select_all(&mut self) {
        for shape in &mut self.shapes {
            shape.selected = true;
        }
    }

    pub fn clear_selection(&mut self) {
        for shape in &mut self.shapes {
            shape.selected = false;
        }
    }

    pub fn selected_ids(&self) -> Vec<ShapeId> {
        self.shapes
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.id)
            .collect()
    }

    pub fn selected_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| s.selected)
    }

    /// Remove every selected shape.
    pub fn delete_selected(&mut self) -> Vec<Shape> {
        self.selected_ids()
            .into_iter()
            .filter_map(|id| self.remove_shape(id))
            .collect()
    }

    /// Copy the selected shapes in place with a small offset.
    ///
    /// The copies become the selection.
    pub fn duplicate_selected(&mut self) -> Vec<ShapeId> {
        let bounds = self.image.as_ref().map(ImageInfo::bounds);
        let copies: Vec<Shape> = self
            .selected_shapes()
            .map(|s| {
                let mut copy = s.detached_copy();
                offset_shape(&mut copy, PASTE_OFFSET, PASTE_OFFSET, bounds);
                copy
            })
            .collect();

        self.clear_selection();
        copies
            .into_iter()
            .map(|mut copy| {
                copy.selected = true;
                self.add_shape(copy)
            })
            .collect()
    }

    // --- Visibility ---

    pub fn set_shape_visible(&mut self, id: ShapeId, visible: bool) -> bool {
        match self.shapes.iter_mut().find(|s| s.id == id) {
            Some(shape) => {
                shape.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn set_filter(&mut self, selection: ClassSelection) {
        self.filter.set_filter(selection);
        self.filter.apply(&mut self.shapes);
    }

    pub fn show_all(&mut self) {
        self.filter.show_all();
        self.filter.apply(&mut self.shapes);
    }

    pub fn toggle_class(&mut self, label: &str) {
        self.filter.toggle_class(label);
        self.filter.apply(&mut self.shapes);
    }

    /// Add a label to the history and the filter without a shape.
    pub fn add_label(&mut self, label: &str) -> bool {
        let added = self.labels.insert(label);
        if added {
            self.filter.register_class(label.trim());
        }
        added
    }

    // --- Colors ---

    /// Display color for a label: the user's choice, else the generated one.
    pub fn color_for(&self, label: &str) -> Rgba {
        self.class_colors
            .get(label)
            .copied()
            .unwrap_or_else(|| color_for_label(label))
    }

    pub fn class_colors(&self) -> &HashMap<String, Rgba> {
        &self.class_colors
    }

    /// Pick a color for a class and repaint its shapes.
    pub fn set_class_color(&mut self, label: &str, color: Rgba) {
        self.class_colors.insert(label.to_string(), color);
        self.repaint();
    }

    /// Replace all user colors, e.g. from saved settings.
    pub fn set_class_colors(&mut self, colors: HashMap<String, Rgba>) {
        self.class_colors = colors;
        self.repaint();
    }

    /// Forget user colors and repaint with generated ones.
    pub fn reset_class_colors(&mut self) {
        self.class_colors.clear();
        self.repaint();
    }

    fn repaint(&mut self) {
        for shape in &mut self.shapes {
            paint(&self.class_colors, shape);
        }
    }
}

fn paint(class_colors: &HashMap<String, Rgba>, shape: &mut Shape) {
    let color = class_colors
        .get(&shape.label)
        .copied()
        .unwrap_or_else(|| color_for_label(&shape.label));
    shape.line_color = color;
    shape.fill_color = fill_color(color);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_image() -> AnnotationStore {
        let mut store = AnnotationStore::new(LabelFormat::Voc);
        store.open_image(ImageInfo::new("img1.jpg", 200, 100));
        store
    }


    #[test]
    fn test_add_shape_assigns_identity() {
        let mut store = store_with_image();
        let a = store.add_shape(Shape::rectangle("cat", 1.0, 1.0, 10.0, 10.0));
        let b = store.add_shape(Shape::rectangle("dog", 1.0, 1.0, 10.0, 10.0));

        assert_ne!(a, b);
        assert!(store.is_dirty());
        assert!(store.is_consistent());
        assert_eq!(store.shape_for_row(store.row_for(b).unwrap()), Some(b));
        assert_eq!(store.labels().as_slice(), ["cat", "dog"]);
        assert_eq!(store.filter().known_classes(), ["cat", "dog"]);
    }

    #[test]
    fn test_add_then_remove_restores_shapes() {
        let mut store = store_with_image();
        store.add_shape(Shape::rectangle("cat", 1.0, 1.0, 10.0, 10.0));
        let before: Vec<(ShapeId, String)> = store
            .shapes()
            .iter()
            .map(|s| (s.id, s.label.clone()))
            .collect();

        let id = store.add_shape(Shape::rectangle("dog", 5.0, 5.0, 20.0, 20.0));
        let removed = store.remove_shape(id).unwrap();
        assert_eq!(removed.label, "dog");

        let after: Vec<(ShapeId, String)> = store
            .shapes()
            .iter()
            .map(|s| (s.id, s.label.clone()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(store.row_for(id), None);
        assert!(store.is_consistent());
        assert!(store.remove_shape(id).is_none());
    }

    #[test]
    fn test_rename_recolors_one_shape() {
        let mut store = store_with_image();
        store.set_class_color("bird", [1, 2, 3, 255]);
        let a = store.add_shape(Shape::rectangle("cat", 1.0, 1.0, 10.0, 10.0));
        let b = store.add_shape(Shape::rectangle("cat", 1.0, 1.0, 10.0, 10.0));

        assert!(store.rename_label(a, "bird"));
        assert_eq!(store.shape(a).unwrap().label, "bird");
        assert_eq!(store.shape(a).unwrap().line_color, [1, 2, 3, 255]);
        assert_eq!(store.shape(a).unwrap().fill_color, [1, 2, 3, 100]);
        assert_eq!(store.shape(b).unwrap().label, "cat");
        assert!(!store.rename_label(999, "x"));
    }

    #[test]
    fn test_class_colors() {
        let mut store = store_with_image();
        let id = store.add_shape(Shape::rectangle("cat", 1.0, 1.0, 10.0, 10.0));
        assert_eq!(store.shape(id).unwrap().line_color, color_for_label("cat"));

        store.set_class_color("cat", [9, 9, 9, 255]);
        assert_eq!(store.shape(id).unwrap().line_color, [9, 9, 9, 255]);
        assert_eq!(store.color_for("cat"), [9, 9, 9, 255]);

        store.reset_class_colors();
        assert_eq!(store.shape(id).unwrap().line_color, color_for_label("cat"));
    }

    #[test]
    fn test_filter_applies_to_new_shapes() {
        let mut store = store_with_image();
        store.add_shape(Shape::rectangle("cat", 1.0, 1.0, 10.0, 10.0));
        store.toggle_class("cat");
        assert!(!store.shapes()[0].visible);

        let id = store.add_shape(Shape::rectangle("dog", 1.0, 1.0, 10.0, 10.0));
        assert!(!store.shape(id).unwrap().visible);

        store.show_all();
        assert!(store.shapes().iter().all(|s| s.visible));
        assert!(store.set_shape_visible(id, false));
        assert!(!store.shape(id).unwrap().visible);
    }

    #[test]
    fn test_selection() {
        let mut store = store_with_image();
        let a = store.add_shape(Shape::rectangle("cat", 1.0, 1.0, 10.0, 10.0));
        let b = store.add_shape(Shape::rectangle("dog", 20.0, 20.0, 40.0, 40.0));

        store.select(a, false);
        store.select(b, true);
        assert_eq!(store.selected_ids(), vec![a, b]);
        store.select(b, false);
        assert_eq!(store.selected_ids(), vec![b]);

        let copies = store.duplicate_selected();
        assert_eq!(copies.len(), 1);
        assert_eq!(store.selected_ids(), copies);
        let bbox = store.shape(copies[0]).unwrap().bounding_box().unwrap();
        assert_eq!((bbox.x_min, bbox.y_min), (30.0, 30.0));

        store.select_all();
        assert_eq!(store.delete_selected().len(), 3);
        assert!(store.shapes().is_empty());
        assert!(store.is_consistent());
    }

    #[test]
    fn test_shape_at_prefers_topmost() {
        let mut store = store_with_image();
        store.add_shape(Shape::rectangle("a", 0.0, 0.0, 50.0, 50.0));
        let top = store.add_shape(Shape::rectangle("b", 10.0, 10.0, 30.0, 30.0));
        assert_eq!(store.shape_at(Point::new(20.0, 20.0)), Some(top));
        assert_eq!(store.shape_at(Point::new(150.0, 90.0)), None);
    }

    #[test]
    fn test_move_shape_clamped() {
        let mut store = store_with_image();
        let id = store.add_shape(Shape::rectangle("a", 150.0, 50.0, 190.0, 90.0));
        assert!(store.move_shape(id, 50.0, 50.0));
        let bbox = store.shape(id).unwrap().bounding_box().unwrap();
        assert_eq!((bbox.x_max, bbox.y_max), (200.0, 100.0));
    }

    #[test]
    fn test_add_shape_clamps_into_image() {
        let mut store = store_with_image();
        let id = store.add_shape(Shape::rectangle("cat", -5.0, 10.0, 250.0, 50.0));
        let bbox = store.shape(id).unwrap().bounding_box().unwrap();
        assert_eq!((bbox.x_min, bbox.x_max), (0.0, 200.0));
        assert_eq!((bbox.y_min, bbox.y_max), (10.0, 50.0));

        // Full width: only the vertical move is possible
        assert!(store.move_shape(id, 1.0, 5.0));
        let bbox = store.shape(id).unwrap().bounding_box().unwrap();
        assert_eq!((bbox.x_min, bbox.y_min), (0.0, 15.0));
    }

    #[test]
    fn test_add_shape_without_image_keeps_points() {
        let mut store = AnnotationStore::default();
        let id = store.add_shape(Shape::rectangle("cat", -5.0, 10.0, 250.0, 50.0));
        let bbox = store.shape(id).unwrap().bounding_box().unwrap();
        assert_eq!(bbox.x_min, -5.0);
    }

    #[test]
    fn test_paste_from_larger_image_is_clamped() {
        let mut clipboard = crate::state::Clipboard::new();
        clipboard.copy(
            &[Shape::rectangle("dog", 150.0, 20.0, 300.0, 80.0)],
            Path::new("big.jpg"),
        );

        let mut store = store_with_image();
        let bounds = store.image().map(ImageInfo::bounds);
        let outcome = clipboard.paste(Path::new("img1.jpg"), store.shapes(), bounds);
        let id = store.add_shape(outcome.shapes[0].clone());

        let bbox = store.shape(id).unwrap().bounding_box().unwrap();
        assert_eq!((bbox.x_min, bbox.x_max), (150.0, 200.0));
        assert!(store.move_shape(id, -10.0, 0.0));
    }

    #[test]
    fn test_labels_trimmed_on_insert() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with_image();
        let id = store.add_shape(Shape::rectangle("  cat \t", 10.0, 10.0, 60.0, 40.0));
        assert_eq!(store.shape(id).unwrap().label, "cat");
        assert_eq!(store.labels().as_slice(), ["cat"]);

        let written = store.save(&dir.path().join("img1"), LabelFormat::Voc).unwrap();
        let mut other = AnnotationStore::default();
        other
            .load(&written, LabelFormat::Voc, ImageInfo::new("img1.jpg", 200, 100))
            .unwrap();
        assert_eq!(other.shapes()[0].label, store.shape(id).unwrap().label);
    }

    #[test]
    fn test_duplicate_at_edge_steps_inward() {
        let mut store = store_with_image();
        let id = store.add_shape(Shape::rectangle("cat", 160.0, 60.0, 200.0, 100.0));
        store.select(id, false);

        let copies = store.duplicate_selected();
        let bbox = store.shape(copies[0]).unwrap().bounding_box().unwrap();
        assert_eq!((bbox.x_min, bbox.y_min), (150.0, 50.0));
    }

    #[test]
    fn test_load_malformed_keeps_image_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img1.xml");
        std::fs::write(&path, "<annotation><object><name>cat</name>").unwrap();

        let mut store = store_with_image();
        store.add_shape(Shape::rectangle("dog", 1.0, 1.0, 5.0, 5.0));
        let err = store
            .load(&path, LabelFormat::Voc, ImageInfo::new("img2.jpg", 200, 100))
            .unwrap_err();

        assert!(matches!(err, FormatError::InvalidFile { .. }));
        assert_eq!(store.image().unwrap().path, PathBuf::from("img2.jpg"));
        assert!(store.shapes().is_empty());
        assert!(!store.is_dirty());
        assert!(store.is_consistent());
    }

    #[test]
    fn test_load_non_utf8_is_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img1.txt");
        std::fs::write(&path, [0x30, 0x20, 0xff, 0xfe, 0x0a]).unwrap();

        let mut store = AnnotationStore::default();
        let err = store
            .load(&path, LabelFormat::Yolo, ImageInfo::new("img1.jpg", 200, 100))
            .unwrap_err();
        assert!(matches!(err, FormatError::InvalidFile { .. }));
        assert!(store.shapes().is_empty());
    }

    #[test]
    fn test_change_format_marks_dirty() {
        let mut store = store_with_image();
        assert!(!store.is_dirty());
        assert_eq!(store.cycle_format(), LabelFormat::Yolo);
        assert!(store.is_dirty());
        assert_eq!(store.format(), LabelFormat::Yolo);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with_image();
        store.add_shape(Shape::rectangle("cat", 10.0, 10.0, 60.0, 40.0));
        store.set_verified(true);

        let written = store.save(&dir.path().join("img1"), LabelFormat::Voc).unwrap();
        assert!(!store.is_dirty());

        let mut other = AnnotationStore::default();
        let report = other
            .load(&written, LabelFormat::Voc, ImageInfo::new("img1.jpg", 200, 100))
            .unwrap();
        assert_eq!(report.shapes, 1);
        assert_eq!(report.cleanup, CleanupStatus::NotNeeded);
        assert!(other.is_verified());
        assert!(!other.is_dirty());
        assert!(other.is_consistent());
    }

    #[test]
    fn test_load_snaps_and_marks_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img1.xml");
        std::fs::write(
            &path,
            "<annotation><object><name>cat</name><bndbox>\
             <xmin>10</xmin><ymin>10</ymin><xmax>500</xmax><ymax>50</ymax>\
             </bndbox></object></annotation>",
        )
        .unwrap();

        let mut store = AnnotationStore::default();
        let report = store
            .load(&path, LabelFormat::Voc, ImageInfo::new("img1.jpg", 200, 100))
            .unwrap();
        assert!(report.snapped);
        assert!(store.is_dirty());
        let bbox = store.shapes()[0].bounding_box().unwrap();
        assert_eq!(bbox.x_max, 200.0);
    }

    #[test]
    fn test_load_cleans_invalid_yolo_classes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("classes.txt"), "cat\n").unwrap();
        let path = dir.path().join("img1.txt");
        std::fs::write(&path, "0 0.5 0.5 0.2 0.2\n3 0.5 0.5 0.2 0.2\n3 0.1 0.1 0.1 0.1\n").unwrap();

        let mut store = AnnotationStore::default();
        let report = store
            .load(&path, LabelFormat::Yolo, ImageInfo::new("img1.jpg", 200, 100))
            .unwrap();

        assert_eq!(report.shapes, 1);
        assert_eq!(report.invalid_classes.get(&3), Some(&2));
        assert!(matches!(report.cleanup, CleanupStatus::Rewritten(_)));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with("0 "));
    }

    #[test]
    fn test_merge_from() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with_image();
        store.add_shape(Shape::rectangle("cat", 10.0, 10.0, 60.0, 40.0));
        let written = store.save(&dir.path().join("prev"), LabelFormat::Voc).unwrap();

        let mut current = store_with_image();
        current.add_shape(Shape::rectangle("dog", 1.0, 1.0, 5.0, 5.0));
        assert_eq!(current.merge_from(&written, LabelFormat::Voc).unwrap(), 1);
        assert_eq!(current.shapes().len(), 2);
        assert!(current.is_consistent());
    }

    #[test]
    fn test_save_without_image_fails_and_stays_dirty() {
        let mut store = AnnotationStore::default();
        store.add_shape(Shape::rectangle("cat", 1.0, 1.0, 5.0, 5.0));
        assert!(store.save(Path::new("x.xml"), LabelFormat::Voc).is_err());
        assert!(store.is_dirty());
    }

    #[test]
    fn test_reset_keeps_session_state() {
        let mut store = store_with_image();
        store.add_shape(Shape::rectangle("cat", 1.0, 1.0, 5.0, 5.0));
        store.set_class_color("cat", [1, 1, 1, 255]);
        store.reset();

        assert!(store.shapes().is_empty());
        assert!(store.image().is_none());
        assert!(!store.is_dirty());
        assert!(store.labels().contains("cat"));
        assert_eq!(store.color_for("cat"), [1, 1, 1, 255]);
    }
}
