//! Unit tests for annotation format implementations.
//!
//! These tests verify the correctness of format serialization, deserialization,
//! and round-trip conversions against real files in a scratch directory.

mod yolo_tests;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::format::ImageInfo;
use crate::model::Shape;

/// Scratch directory removed when dropped.
pub(crate) struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub(crate) fn new(name: &str) -> Self {
        let dir = tempfile::Builder::new()
            .prefix(&format!("labelkit-{}-", name))
            .tempdir()
            .unwrap();
        Self { dir }
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// A 640x480 image description inside `dir`.
pub(crate) fn test_image(dir: &TestDir, name: &str) -> ImageInfo {
    ImageInfo::new(dir.join(name), 640, 480)
}

/// Shapes with integer coordinates, exactly representable by every format.
pub(crate) fn sample_shapes() -> Vec<Shape> {
    vec![
        Shape::rectangle("person", 100.0, 120.0, 180.0, 320.0),
        Shape::rectangle("car", 300.0, 200.0, 450.0, 300.0),
        Shape::rectangle("person", 0.0, 0.0, 40.0, 60.0),
    ]
}

/// Compare shapes by label and bounding box within `tolerance` pixels.
pub(crate) fn assert_same_boxes(actual: &[Shape], expected: &[Shape], tolerance: f32) {
    assert_eq!(actual.len(), expected.len(), "shape count differs");
    for (a, e) in actual.iter().zip(expected) {
        assert_eq!(a.label, e.label);
        let (ab, eb) = (a.bounding_box().unwrap(), e.bounding_box().unwrap());
        assert!(
            ab.approx_eq(&eb, tolerance),
            "box {:?} differs from {:?}",
            ab,
            eb
        );
    }
}
