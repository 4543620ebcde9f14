//! Shape geometry and labels.

use crate::color_utils::{Rgba, color_for_label, fill_color};
use crate::constants::EDGE_HIT_DISTANCE;

/// Unique identifier for a shape within an annotation store.
pub type ShapeId = u32;

/// Minimum number of vertices required to close a shape.
pub const MIN_SHAPE_VERTICES: usize = 3;

/// Number of vertices of a closed rectangle.
pub const RECTANGLE_VERTICES: usize = 4;

/// A point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance_to(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Image extent that shape coordinates are clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
        }
    }

    /// Clamp a point into `[0, width] x [0, height]`.
    ///
    /// Returns the clamped point and whether it had to move.
    pub fn snap(&self, point: Point) -> (Point, bool) {
        let snapped = Point::new(
            point.x.clamp(0.0, self.width),
            point.y.clamp(0.0, self.height),
        );
        (snapped, snapped != point)
    }
}

/// Axis-aligned bounding box in image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    /// Create a normalized box from two corner points.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x_min: x1.min(x2),
            y_min: y1.min(y2),
            x_max: x1.max(x2),
            y_max: y1.max(y2),
        }
    }

    /// Create a box from its center and extents.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::from_corners(
            cx - width / 2.0,
            cy - height / 2.0,
            cx + width / 2.0,
            cy + height / 2.0,
        )
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// True when every edge is within `tolerance` pixels of the other box's edge.
    pub fn approx_eq(&self, other: &BoundingBox, tolerance: f32) -> bool {
        (self.x_min - other.x_min).abs() <= tolerance
            && (self.y_min - other.y_min).abs() <= tolerance
            && (self.x_max - other.x_max).abs() <= tolerance
            && (self.y_max - other.y_max).abs() <= tolerance
    }

    /// Corners in drawing order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; RECTANGLE_VERTICES] {
        [
            Point::new(self.x_min, self.y_min),
            Point::new(self.x_max, self.y_min),
            Point::new(self.x_max, self.y_max),
            Point::new(self.x_min, self.y_max),
        ]
    }
}

/// A labeled polygon. Closed shapes in this build are always rectangles.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Identity assigned by the annotation store (0 while detached).
    pub id: ShapeId,
    /// Class label.
    pub label: String,
    /// Vertices in image coordinates.
    pub points: Vec<Point>,
    /// Outline color.
    pub line_color: Rgba,
    /// Fill color.
    pub fill_color: Rgba,
    /// "Difficult" flag persisted by Pascal VOC.
    pub difficult: bool,
    /// Whether the shape is currently selected.
    pub selected: bool,
    /// Whether the shape is currently shown.
    pub visible: bool,
    closed: bool,
}

impl Shape {
    /// Start a new, open shape with colors derived from the label.
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let line_color = color_for_label(&label);
        Self {
            id: 0,
            line_color,
            fill_color: fill_color(line_color),
            label,
            points: Vec::new(),
            difficult: false,
            selected: false,
            visible: true,
            closed: false,
        }
    }

    /// Build a closed rectangle from two corners.
    pub fn rectangle(label: impl Into<String>, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let mut shape = Self::new(label);
        shape.points = BoundingBox::from_corners(x1, y1, x2, y2).corners().to_vec();
        shape.closed = true;
        shape
    }

    /// Build a closed rectangle from a bounding box.
    pub fn from_bbox(label: impl Into<String>, bbox: BoundingBox) -> Self {
        Self::rectangle(label, bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max)
    }

    pub fn with_difficult(mut self, difficult: bool) -> Self {
        self.difficult = difficult;
        self
    }

    /// Append a vertex while drawing. Ignored once the shape is closed.
    pub fn add_point(&mut self, point: Point) {
        if !self.closed {
            self.points.push(point);
        }
    }

    /// Finalize the polygon.
    ///
    /// Returns `false` when fewer than three points were drawn; the caller
    /// discards such shapes.
    pub fn close(&mut self) -> bool {
        if self.points.len() < MIN_SHAPE_VERTICES {
            return false;
        }
        self.closed = true;
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether this is a closed four-corner rectangle.
    pub fn is_rectangle(&self) -> bool {
        self.closed && self.points.len() == RECTANGLE_VERTICES
    }

    /// Axis-aligned bounding box of the vertices, if there are any.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.points.first()?;
        let init = BoundingBox::from_corners(first.x, first.y, first.x, first.y);
        Some(self.points.iter().fold(init, |bbox, p| BoundingBox {
            x_min: bbox.x_min.min(p.x),
            y_min: bbox.y_min.min(p.y),
            x_max: bbox.x_max.max(p.x),
            y_max: bbox.y_max.max(p.y),
        }))
    }

    /// Hit test used for selection: inside the polygon or close to one of its edges.
    pub fn contains_point(&self, point: Point) -> bool {
        if self.points.len() < MIN_SHAPE_VERTICES {
            return false;
        }

        // Point-in-polygon test using ray casting algorithm
        let mut inside = false;
        let mut j = self.points.len() - 1;
        for i in 0..self.points.len() {
            let pi = self.points[i];
            let pj = self.points[j];
            if ((pi.y > point.y) != (pj.y > point.y))
                && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
            {
                inside = !inside;
            }
            j = i;
        }

        inside || self.distance_to_edges(point) <= EDGE_HIT_DISTANCE
    }

    fn distance_to_edges(&self, point: Point) -> f32 {
        let n = self.points.len();
        (0..n)
            .map(|i| segment_distance(point, self.points[i], self.points[(i + 1) % n]))
            .fold(f32::INFINITY, f32::min)
    }

    /// Index of the vertex within `epsilon` pixels of `point`, nearest first.
    pub fn nearest_vertex(&self, point: Point, epsilon: f32) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.distance_to(point)))
            .filter(|(_, d)| *d <= epsilon)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Translate every vertex.
    ///
    /// With `bounds`, the offset is reduced so the whole shape stays inside the
    /// image. An axis on which the shape does not fit is left alone. Returns
    /// whether the shape actually moved.
    pub fn move_by(&mut self, dx: f32, dy: f32, bounds: Option<Bounds>) -> bool {
        let (mut dx, mut dy) = (dx, dy);
        if let (Some(bounds), Some(bbox)) = (bounds, self.bounding_box()) {
            dx = clamp_offset(dx, bbox.x_min, bbox.x_max, bounds.width);
            dy = clamp_offset(dy, bbox.y_min, bbox.y_max, bounds.height);
        }
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
        true
    }

    /// Drag vertex `index` to `point`, snapped into `bounds`.
    ///
    /// For rectangles the two neighbouring corners follow along one axis each,
    /// so the shape stays axis-aligned.
    pub fn move_vertex(&mut self, index: usize, point: Point, bounds: Option<Bounds>) {
        let Some(current) = self.points.get(index).copied() else {
            return;
        };
        let target = bounds.map_or(point, |b| b.snap(point).0);
        let shift = Point::new(target.x - current.x, target.y - current.y);
        self.points[index] = target;

        if !self.is_rectangle() {
            return;
        }

        let next = (index + 1) % RECTANGLE_VERTICES;
        let prev = (index + RECTANGLE_VERTICES - 1) % RECTANGLE_VERTICES;
        // Corners 0 and 2 share y with their successor, 1 and 3 share x.
        let (next_shift, prev_shift) = if index % 2 == 0 {
            (Point::new(0.0, shift.y), Point::new(shift.x, 0.0))
        } else {
            (Point::new(shift.x, 0.0), Point::new(0.0, shift.y))
        };
        self.points[next].x += next_shift.x;
        self.points[next].y += next_shift.y;
        self.points[prev].x += prev_shift.x;
        self.points[prev].y += prev_shift.y;
    }

    /// Clamp every vertex into `bounds`. Returns whether anything moved.
    pub fn snap_to(&mut self, bounds: Bounds) -> bool {
        let mut moved = false;
        for p in &mut self.points {
            let (snapped, changed) = bounds.snap(*p);
            *p = snapped;
            moved |= changed;
        }
        moved
    }

    /// Copy detached from any store: no identity, no transient UI state.
    pub fn detached_copy(&self) -> Self {
        Self {
            id: 0,
            selected: false,
            visible: true,
            ..self.clone()
        }
    }
}

/// Limit an offset along one axis so `[min, max]` stays within `[0, extent]`.
fn clamp_offset(delta: f32, min: f32, max: f32, extent: f32) -> f32 {
    let (lo, hi) = (-min, extent - max);
    if lo > hi {
        return 0.0;
    }
    delta.clamp(lo, hi)
}

/// Shortest distance from `p` to the segment `a`-`b`.
fn segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len_sq = abx * abx + aby * aby;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    p.distance_to(Point::new(a.x + t * abx, a.y + t * aby))
}
