//! Data models for labelkit.

mod shape;

pub use shape::{
    BoundingBox, Bounds, MIN_SHAPE_VERTICES, Point, RECTANGLE_VERTICES, Shape, ShapeId,
};
