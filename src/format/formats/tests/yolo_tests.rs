//! Tests for the YOLO TXT format.

use super::{TestDir, assert_same_boxes, sample_shapes, test_image};
use crate::format::formats::{YoloFormat, classes_path_for, read_class_list};
use crate::format::{FormatError, ImageInfo, LabelCodec, ReadContext, WriteContext};
use crate::model::Shape;

fn classes(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_yolo_writes_classes_file() {
    let dir = TestDir::new("yolo-classes");
    let image = test_image(&dir, "img1.jpg");
    let history = classes(&["person", "car"]);

    let written = YoloFormat
        .write(
            &dir.join("img1"),
            &sample_shapes(),
            &WriteContext::new(&image, &history),
        )
        .unwrap();

    assert_eq!(written, dir.join("img1.txt"));
    let class_list = read_class_list(&classes_path_for(&written)).unwrap();
    assert_eq!(class_list, history);

    let content = std::fs::read_to_string(&written).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("0 "));
    assert!(lines[1].starts_with("1 "));
    assert!(lines[2].starts_with("0 "));
}

#[test]
fn test_yolo_appends_unknown_labels() {
    let dir = TestDir::new("yolo-append");
    let image = test_image(&dir, "img1.jpg");
    let history = classes(&["dog"]);
    let shapes = vec![Shape::rectangle("zebra", 10.0, 10.0, 50.0, 50.0)];

    let written = YoloFormat
        .write(&dir.join("img1"), &shapes, &WriteContext::new(&image, &history))
        .unwrap();

    let class_list = read_class_list(&classes_path_for(&written)).unwrap();
    assert_eq!(class_list, classes(&["dog", "zebra"]));
    let content = std::fs::read_to_string(&written).unwrap();
    assert!(content.starts_with("1 "));
}

#[test]
fn test_yolo_normalized_values() {
    let dir = TestDir::new("yolo-values");
    let image = test_image(&dir, "img1.jpg");
    let shapes = vec![Shape::rectangle("cat", 160.0, 120.0, 480.0, 360.0)];

    let written = YoloFormat
        .write(&dir.join("img1"), &shapes, &WriteContext::new(&image, &[]))
        .unwrap();
    let content = std::fs::read_to_string(written).unwrap();

    assert_eq!(content, "0 0.500000 0.500000 0.500000 0.500000\n");
}

#[test]
fn test_yolo_verified_marker() {
    let dir = TestDir::new("yolo-verified");
    let image = test_image(&dir, "img1.jpg");
    let shapes = vec![Shape::rectangle("cat", 10.0, 10.0, 20.0, 20.0)];

    let written = YoloFormat
        .write(
            &dir.join("img1"),
            &shapes,
            &WriteContext::new(&image, &[]).verified(true),
        )
        .unwrap();
    let content = std::fs::read_to_string(&written).unwrap();
    assert!(content.starts_with("# verified\n"));

    let outcome = YoloFormat
        .read(&written, &ReadContext::new(&image, &[]))
        .unwrap();
    assert!(outcome.verified);
    assert_eq!(outcome.shapes.len(), 1);
}

#[test]
fn test_yolo_invalid_classes_counted_by_index() {
    let dir = TestDir::new("yolo-invalid");
    let image = test_image(&dir, "img1.jpg");
    std::fs::write(dir.join("classes.txt"), "cat\ndog\n").unwrap();
    let path = dir.join("img1.txt");
    std::fs::write(
        &path,
        "0 0.5 0.5 0.1 0.1\n5 0.5 0.5 0.1 0.1\n5 0.2 0.2 0.1 0.1\n-1 0.5 0.5 0.1 0.1\n1 0.3 0.3 0.1 0.1\n",
    )
    .unwrap();

    let outcome = YoloFormat
        .read(&path, &ReadContext::new(&image, &[]))
        .unwrap();

    assert_eq!(outcome.shapes.len(), 2);
    assert_eq!(outcome.shapes[0].label, "cat");
    assert_eq!(outcome.shapes[1].label, "dog");
    assert!(outcome.needs_cleaning());
    assert_eq!(outcome.invalid_total(), 3);
    assert_eq!(outcome.invalid_classes.get(&5), Some(&2));
    assert_eq!(outcome.invalid_classes.get(&-1), Some(&1));
    assert_eq!(outcome.classes, classes(&["cat", "dog"]));
}

#[test]
fn test_yolo_falls_back_to_known_classes() {
    let dir = TestDir::new("yolo-fallback");
    let image = test_image(&dir, "img1.jpg");
    let path = dir.join("img1.txt");
    std::fs::write(&path, "1 0.5 0.5 0.2 0.2\n").unwrap();
    let history = classes(&["cat", "bird"]);

    let outcome = YoloFormat
        .read(&path, &ReadContext::new(&image, &history))
        .unwrap();

    assert_eq!(outcome.shapes.len(), 1);
    assert_eq!(outcome.shapes[0].label, "bird");
    assert!(!outcome.needs_cleaning());
}

#[test]
fn test_yolo_malformed_line() {
    let dir = TestDir::new("yolo-malformed");
    let image = test_image(&dir, "img1.jpg");
    let path = dir.join("img1.txt");
    std::fs::write(&path, "0 0.5 0.5\n").unwrap();

    let err = YoloFormat
        .read(&path, &ReadContext::new(&image, &[]))
        .unwrap_err();
    assert!(matches!(err, FormatError::InvalidFile { .. }));
}

#[test]
fn test_yolo_requires_dimensions() {
    let dir = TestDir::new("yolo-dims");
    let image = ImageInfo::new(dir.join("img1.jpg"), 0, 0);

    let err = YoloFormat
        .write(&dir.join("img1"), &sample_shapes(), &WriteContext::new(&image, &[]))
        .unwrap_err();
    assert!(matches!(err, FormatError::MissingDimensions { .. }));
    assert!(!dir.join("img1.txt").exists());
}

#[test]
fn test_yolo_roundtrip_within_epsilon() {
    let dir = TestDir::new("yolo-roundtrip");
    let image = test_image(&dir, "img1.jpg");
    let shapes = sample_shapes();

    let written = YoloFormat
        .write(&dir.join("img1"), &shapes, &WriteContext::new(&image, &[]))
        .unwrap();
    let outcome = YoloFormat
        .read(&written, &ReadContext::new(&image, &[]))
        .unwrap();

    assert!(dir.path().join("classes.txt").is_file());
    assert_same_boxes(&outcome.shapes, &shapes, 0.01);
}

#[test]
fn test_yolo_failed_write_keeps_classes_file() {
    let dir = TestDir::new("yolo-failed-write");
    let image = test_image(&dir, "img1.jpg");
    std::fs::write(dir.join("classes.txt"), "cat\n").unwrap();
    // A directory in place of the annotation file makes the final rename fail
    std::fs::create_dir(dir.join("img1.txt")).unwrap();
    let shapes = vec![Shape::rectangle("zebra", 10.0, 10.0, 50.0, 50.0)];

    let err = YoloFormat
        .write(&dir.join("img1"), &shapes, &WriteContext::new(&image, &classes(&["cat"])))
        .unwrap_err();

    assert!(err.is_io());
    assert_eq!(std::fs::read_to_string(dir.join("classes.txt")).unwrap(), "cat\n");
    assert!(!dir.join(".classes.txt.tmp").exists());
    assert!(!dir.join(".img1.txt.tmp").exists());
}

#[test]
fn test_yolo_non_utf8_is_invalid_file() {
    let dir = TestDir::new("yolo-non-utf8");
    let image = test_image(&dir, "img1.jpg");
    let path = dir.join("img1.txt");
    std::fs::write(&path, [b'0', b' ', 0xff, b'\n']).unwrap();

    let err = YoloFormat
        .read(&path, &ReadContext::new(&image, &[]))
        .unwrap_err();
    assert!(matches!(err, FormatError::InvalidFile { .. }));
}
