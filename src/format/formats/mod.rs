//! Annotation format implementations.

mod create_ml;
mod pascal_voc;
mod yolo;

#[cfg(test)]
mod tests;

pub use create_ml::{CreateMlAnnotation, CreateMlCoordinates, CreateMlEntry, CreateMlFormat};
pub use pascal_voc::PascalVocFormat;
pub use yolo::{YoloFormat, classes_path_for, read_class_list};
