//! CreateML JSON format implementation.
//!
//! A CreateML file is a JSON array with one entry per image. Each entry
//! lists its annotations with center-based pixel coordinates. Writing an
//! image's entry merges it into the array instead of overwriting the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::common::{ensure_extension, read_text, write_atomic};
use crate::format::error::FormatError;
use crate::format::traits::{LabelCodec, ReadContext, ReadOutcome, WriteContext};
use crate::model::{BoundingBox, Shape};

/// One image's entry in a CreateML dataset file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMlEntry {
    /// Image file name the entry belongs to.
    pub image: String,
    /// Whether a human verified the annotations.
    #[serde(default)]
    pub verified: bool,
    /// Annotated objects.
    #[serde(default)]
    pub annotations: Vec<CreateMlAnnotation>,
}

/// A labeled rectangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMlAnnotation {
    pub label: String,
    pub coordinates: CreateMlCoordinates,
}

/// Rectangle center and extents in absolute pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreateMlCoordinates {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// CreateML JSON format.
///
/// Supports:
/// - Bounding boxes (center + size in pixels)
/// - Several images per file, merged on write
/// - The verified flag per image
///
/// Does not support:
/// - The `difficult` flag
/// - Category colors
pub struct CreateMlFormat;

impl LabelCodec for CreateMlFormat {
    fn id(&self) -> &'static str {
        "createml"
    }

    fn display_name(&self) -> &'static str {
        "CreateML"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn read(&self, path: &Path, ctx: &ReadContext<'_>) -> Result<ReadOutcome, FormatError> {
        log::debug!("Reading CreateML annotations from {:?}", path);

        let entries = read_dataset(path)?;
        let filename = ctx.image.filename();

        let Some(value) = entries.into_iter().find(|e| entry_image(e) == Some(&filename)) else {
            log::info!("No CreateML entry for '{}' in {:?}", filename, path);
            return Ok(ReadOutcome::default());
        };

        let entry: CreateMlEntry = serde_json::from_value(value).map_err(|e| {
            FormatError::invalid_file(path, format!("Invalid entry for '{}': {}", filename, e))
        })?;

        let shapes: Vec<Shape> = entry
            .annotations
            .into_iter()
            .map(|ann| {
                let c = ann.coordinates;
                Shape::from_bbox(ann.label, BoundingBox::from_center(c.x, c.y, c.width, c.height))
            })
            .collect();

        log::info!(
            "Read {} objects for '{}' from {:?}",
            shapes.len(),
            filename,
            path
        );

        Ok(ReadOutcome {
            shapes,
            verified: entry.verified,
            ..ReadOutcome::default()
        })
    }

    fn write(
        &self,
        path: &Path,
        shapes: &[Shape],
        ctx: &WriteContext<'_>,
    ) -> Result<PathBuf, FormatError> {
        let path = ensure_extension(path, self.extension());
        log::debug!("Writing CreateML annotations to {:?}", path);

        let entry = CreateMlEntry {
            image: ctx.image.filename(),
            verified: ctx.verified,
            annotations: shapes.iter().filter_map(to_annotation).collect(),
        };
        let annotation_count = entry.annotations.len();

        let mut entries = if path.exists() {
            read_dataset(&path)?
        } else {
            Vec::new()
        };

        let value = serde_json::to_value(&entry)?;
        match entries
            .iter()
            .position(|e| entry_image(e) == Some(&entry.image))
        {
            Some(idx) => entries[idx] = value,
            None => entries.push(value),
        }

        let json = serde_json::to_vec_pretty(&entries)?;
        write_atomic(&path, &json)?;

        log::info!(
            "Wrote {} objects for '{}' to {:?} ({} images in file)",
            annotation_count,
            entry.image,
            path,
            entries.len()
        );
        Ok(path)
    }
}

fn to_annotation(shape: &Shape) -> Option<CreateMlAnnotation> {
    let bbox = shape.bounding_box()?;
    let center = bbox.center();
    Some(CreateMlAnnotation {
        label: shape.label.clone(),
        coordinates: CreateMlCoordinates {
            x: center.x,
            y: center.y,
            width: bbox.width(),
            height: bbox.height(),
        },
    })
}

/// Image name of a raw dataset entry.
fn entry_image(entry: &Value) -> Option<&String> {
    match entry.get("image") {
        Some(Value::String(name)) => Some(name),
        _ => None,
    }
}

/// Read a dataset file as raw entries, so entries for other images survive a rewrite untouched.
fn read_dataset(path: &Path) -> Result<Vec<Value>, FormatError> {
    let content = read_text(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(entries)) => Ok(entries),
        Ok(_) => Err(FormatError::invalid_file(
            path,
            "CreateML file must contain a JSON array",
        )),
        Err(e) => Err(FormatError::invalid_file(path, format!("Invalid JSON: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_metadata() {
        let format = CreateMlFormat;
        assert_eq!(format.id(), "createml");
        assert_eq!(format.extension(), "json");
    }

    #[test]
    fn test_to_annotation_uses_center() {
        let shape = Shape::rectangle("cat", 10.0, 20.0, 50.0, 40.0);
        let ann = to_annotation(&shape).unwrap();
        assert_eq!(ann.coordinates.x, 30.0);
        assert_eq!(ann.coordinates.y, 30.0);
        assert_eq!(ann.coordinates.width, 40.0);
        assert_eq!(ann.coordinates.height, 20.0);
    }

    #[test]
    fn test_entry_image() {
        let entry = serde_json::json!({"image": "a.jpg", "annotations": []});
        assert_eq!(entry_image(&entry).map(String::as_str), Some("a.jpg"));
        assert_eq!(entry_image(&serde_json::json!({"image": 3})), None);
    }
}
