//! Global constants for labelkit

/// Pixel offset applied to every shape when pasting into the image it was copied from.
pub const PASTE_OFFSET: f32 = 10.0;

/// Per-edge tolerance (pixels) for treating two boxes with the same label as duplicates.
pub const DUPLICATE_TOLERANCE: f32 = 2.0;

/// Distance (pixels) within which a click on a polygon edge still selects the shape.
pub const EDGE_HIT_DISTANCE: f32 = 4.0;

/// Alpha channel used for generated fill colors.
pub const FILL_ALPHA: u8 = 100;

/// Name of the YOLO class list written next to the annotation files.
pub const YOLO_CLASSES_FILE: &str = "classes.txt";

/// Class list file names looked up inside an opened image directory, in priority order.
pub const CLASS_FILE_CANDIDATES: &[&str] = &["classes.txt", "predefined_classes.txt"];

/// Bundled predefined classes used when no class file is given or discovered.
pub const DEFAULT_CLASSES: &str = include_str!("../data/predefined_classes.txt");
