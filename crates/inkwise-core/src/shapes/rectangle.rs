//! Rectangle shape.

use super::{ObjectFlags, ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub style: ShapeStyle,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Rectangle {
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

    fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }
}

impl ShapeTrait for Rectangle {
    object_accessors!();

    fn bounds(&self) -> Rect {
        self.rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let rect = self.rect();
        if self.style.fill_color.is_some() {
            return rect.inflate(tolerance, tolerance).contains(point);
        }
        // Unfilled: only a band around the outline picks
        let band = tolerance + self.style.stroke_width / 2.0;
        rect.inflate(band, band).contains(point) && !rect.inflate(-band, -band).contains(point)
    }

    fn to_path(&self) -> BezPath {
        self.rect().to_path(0.1)
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
    fn test_outline_band() {
        let rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 60.0);
        assert!(rect.hit_test(Point::new(0.0, 30.0), 0.0));
        assert!(rect.hit_test(Point::new(104.0, 30.0), 5.0));
        assert!(!rect.hit_test(Point::new(50.0, 30.0), 0.0));
        assert!(!rect.hit_test(Point::new(200.0, 30.0), 0.0));
    }

    #[test]
    fn test_filled_interior() {
        let mut rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 60.0);
        rect.style.fill_color = Some(SerializableColor::white());
        assert!(rect.hit_test(Point::new(50.0, 30.0), 0.0));
    }

    #[test]
    fn test_scale_keeps_corner_relation() {
        let mut rect = Rectangle::new(Point::new(5.0, 10.0), 10.0, 20.0);
        rect.transform(Affine::scale_non_uniform(2.0, 3.0));
        assert_eq!(rect.bounds(), Rect::new(10.0, 30.0, 30.0, 90.0));
    }

    #[test]
    fn test_mirror_keeps_box_in_place() {
        let mut rect = Rectangle::new(Point::new(10.0, 20.0), 30.0, 40.0);
        rect.transform(Affine::FLIP_X);
        assert_eq!(rect.bounds(), Rect::new(-40.0, 20.0, -10.0, 60.0));
        assert_eq!(rect.position, Point::new(-40.0, 20.0));
        assert!(rect.width > 0.0 && rect.height > 0.0);
    }
}
