//! Triangle shape.

use super::{ObjectFlags, ShapeId, ShapeStyle, ShapeTrait, point_to_polyline_dist};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An isosceles triangle in its bounding box: apex at the top center, base
/// along the bottom edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub(crate) id: ShapeId,
    /// Top-left corner of the bounding box.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub style: ShapeStyle,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Triangle {
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            style: ShapeStyle::default(),
            flags: ObjectFlags::default(),
        }
    }

    /// Apex, bottom-right, bottom-left.
    pub fn vertices(&self) -> [Point; 3] {
        let Point { x, y } = self.position;
        [
            Point::new(x + self.width / 2.0, y),
            Point::new(x + self.width, y + self.height),
            Point::new(x, y + self.height),
        ]
    }
}

impl ShapeTrait for Triangle {
    object_accessors!();

    fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if self.style.fill_color.is_some() && self.to_path().contains(point) {
            return true;
        }
        let [a, b, c] = self.vertices();
        point_to_polyline_dist(point, &[a, b, c, a]) <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        let [a, b, c] = self.vertices();
        let mut path = BezPath::new();
        path.move_to(a);
        path.line_to(b);
        path.line_to(c);
        path.close_path();
        path
    }

    fn transform(&mut self, affine: Affine) {
        // Mirroring swaps corners; keep the box normalized.
        let bounds = self.bounds();
        let moved = Rect::from_points(
            affine * bounds.origin(),
            affine * Point::new(bounds.x1, bounds.y1),
        );
        self.position = moved.origin();
        self.width = moved.width();
        self.height = moved.height();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::SerializableColor;

    #[test]
    fn test_vertices() {
        let tri = Triangle::new(Point::new(0.0, 0.0), 100.0, 80.0);
        assert_eq!(
            tri.vertices(),
            [Point::new(50.0, 0.0), Point::new(100.0, 80.0), Point::new(0.0, 80.0)]
        );
    }

    #[test]
    fn test_hit_test() {
        let mut tri = Triangle::new(Point::new(0.0, 0.0), 100.0, 80.0);
        assert!(tri.hit_test(Point::new(50.0, 80.0), 0.0));
        assert!(!tri.hit_test(Point::new(50.0, 50.0), 0.0));
        tri.style.fill_color = Some(SerializableColor::black());
        assert!(tri.hit_test(Point::new(50.0, 50.0), 0.0));
        // Bounding-box corner outside the triangle
        assert!(!tri.hit_test(Point::new(2.0, 2.0), 0.0));
    }

    #[test]
    fn test_mirror_keeps_box_in_place() {
        let mut tri = Triangle::new(Point::new(0.0, 10.0), 100.0, 80.0);
        tri.transform(Affine::FLIP_Y);
        assert_eq!(tri.bounds(), Rect::new(0.0, -90.0, 100.0, -10.0));
        assert_eq!(tri.vertices()[1], Point::new(100.0, -10.0));
    }
}
