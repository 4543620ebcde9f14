//! YOLO TXT format implementation.
//!
//! Implements the YOLO annotation format, which uses one text file per image
//! with normalized bounding box coordinates and a shared `classes.txt` that
//! maps class indices to labels.

use std::path::{Path, PathBuf};

use crate::constants::YOLO_CLASSES_FILE;
use crate::format::common::{StagedFile, ensure_extension, read_text};
use crate::format::error::FormatError;
use crate::format::image_info::ImageInfo;
use crate::format::traits::{LabelCodec, ReadContext, ReadOutcome, WriteContext};
use crate::model::{BoundingBox, Shape};

/// Comment line marking the image as verified.
const VERIFIED_MARKER: &str = "# verified";

/// YOLO TXT format.
///
/// Supports:
/// - Bounding boxes only (normalized center coordinates)
/// - `classes.txt` beside the annotation file for category names
/// - A leading `# verified` comment for the verified flag
///
/// Does not support:
/// - The `difficult` flag
/// - Category colors
pub struct YoloFormat;

impl LabelCodec for YoloFormat {
    fn id(&self) -> &'static str {
        "yolo"
    }

    fn display_name(&self) -> &'static str {
        "YOLO"
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn read(&self, path: &Path, ctx: &ReadContext<'_>) -> Result<ReadOutcome, FormatError> {
        log::debug!("Reading YOLO annotations from {:?}", path);
        require_dimensions(ctx.image)?;

        let classes_path = classes_path_for(path);
        let classes = if classes_path.is_file() {
            read_class_list(&classes_path)?
        } else {
            log::debug!(
                "No {} beside {:?}, using {} known classes",
                YOLO_CLASSES_FILE,
                path,
                ctx.classes.len()
            );
            ctx.classes.to_vec()
        };

        let content = read_text(path)?;
        let mut outcome = ReadOutcome::default();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                if line == VERIFIED_MARKER {
                    outcome.verified = true;
                }
                continue;
            }

            let (class_index, bbox) = parse_yolo_line(line).ok_or_else(|| {
                FormatError::invalid_file(
                    path,
                    format!("Malformed YOLO line {}: '{}'", line_no + 1, line),
                )
            })?;

            let Some(label) = usize::try_from(class_index)
                .ok()
                .and_then(|i| classes.get(i))
            else {
                *outcome.invalid_classes.entry(class_index).or_insert(0) += 1;
                continue;
            };

            outcome
                .shapes
                .push(Shape::from_bbox(label.clone(), to_pixels(&bbox, ctx.image)));
        }

        if outcome.needs_cleaning() {
            log::warn!(
                "Dropped {} objects with class indices outside 0..{} in {:?}: {:?}",
                outcome.invalid_total(),
                classes.len(),
                path,
                outcome.invalid_classes
            );
        }

        log::info!("Read {} objects from {:?}", outcome.shapes.len(), path);
        outcome.classes = classes;
        Ok(outcome)
    }

    fn write(
        &self,
        path: &Path,
        shapes: &[Shape],
        ctx: &WriteContext<'_>,
    ) -> Result<PathBuf, FormatError> {
        let path = ensure_extension(path, self.extension());
        log::debug!("Writing YOLO annotations to {:?}", path);
        require_dimensions(ctx.image)?;

        let mut classes = ctx.classes.to_vec();
        let mut lines = Vec::with_capacity(shapes.len() + 1);
        if ctx.verified {
            lines.push(VERIFIED_MARKER.to_string());
        }

        for shape in shapes {
            let Some(bbox) = shape.bounding_box() else {
                log::warn!("Skipping shape '{}' without points", shape.label);
                continue;
            };
            let class_index = match classes.iter().position(|c| *c == shape.label) {
                Some(idx) => idx,
                None => {
                    classes.push(shape.label.clone());
                    classes.len() - 1
                }
            };

            // YOLO uses center coordinates, normalized to [0, 1]
            let (w, h) = (ctx.image.width as f32, ctx.image.height as f32);
            let center = bbox.center();
            lines.push(format!(
                "{} {:.6} {:.6} {:.6} {:.6}",
                class_index,
                center.x / w,
                center.y / h,
                bbox.width() / w,
                bbox.height() / h
            ));
        }

        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        let mut class_content = classes.join("\n");
        class_content.push('\n');

        // The class list only changes once the annotation file is in place.
        let annotation = StagedFile::write(&path, content.as_bytes())?;
        let class_list = StagedFile::write(&classes_path_for(&path), class_content.as_bytes())?;
        annotation.commit()?;
        class_list.commit()?;

        log::info!(
            "Wrote {} objects to {:?} ({} classes)",
            shapes.len(),
            path,
            classes.len()
        );
        Ok(path)
    }
}

fn require_dimensions(image: &ImageInfo) -> Result<(), FormatError> {
    if image.has_dimensions() {
        Ok(())
    } else {
        Err(FormatError::missing_dimensions("yolo", &image.path))
    }
}

/// Location of the class list shared by the annotation files in a directory.
pub fn classes_path_for(annotation_path: &Path) -> PathBuf {
    annotation_path
        .parent()
        .map(|dir| dir.join(YOLO_CLASSES_FILE))
        .unwrap_or_else(|| PathBuf::from(YOLO_CLASSES_FILE))
}

/// Read an ordered class list, one label per line, skipping blank lines.
pub fn read_class_list(path: &Path) -> Result<Vec<String>, FormatError> {
    let content = read_text(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Parse a single YOLO annotation line into its class index and normalized box.
fn parse_yolo_line(line: &str) -> Option<(i64, BoundingBox)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 5 {
        return None;
    }

    let class_index: i64 = parts[0].parse().ok()?;
    let mut values = [0.0f32; 4];
    for (value, part) in values.iter_mut().zip(&parts[1..]) {
        *value = part.parse().ok().filter(|v: &f32| v.is_finite())?;
    }
    let [cx, cy, w, h] = values;

    Some((class_index, BoundingBox::from_center(cx, cy, w, h)))
}

/// Convert a normalized box to pixels, clamping it into the image.
fn to_pixels(normalized: &BoundingBox, image: &ImageInfo) -> BoundingBox {
    let (w, h) = (image.width as f32, image.height as f32);
    BoundingBox {
        x_min: normalized.x_min.clamp(0.0, 1.0) * w,
        y_min: normalized.y_min.clamp(0.0, 1.0) * h,
        x_max: normalized.x_max.clamp(0.0, 1.0) * w,
        y_max: normalized.y_max.clamp(0.0, 1.0) * h,
    }
}
