//! Ellipse shape.

use super::{ObjectFlags, ShapeId, ShapeStyle, ShapeTrait, axis_scale};
use kurbo::{Affine, BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An axis-aligned ellipse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub(crate) id: ShapeId,
    pub center: Point,
    pub radius_x: f64,
    pub radius_y: f64,
    pub style: ShapeStyle,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Ellipse {
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            center,
            radius_x,
            radius_y,
            style: ShapeStyle::default(),
            flags: ObjectFlags::default(),
        }
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        Self::new(center, radius, radius)
    }

    /// Normalized distance of `point` from the center for radii grown by
    /// `grow`: 1.0 is on the outline. `None` when a radius collapses.
    fn normalized(&self, point: Point, grow: f64) -> Option<f64> {
        let rx = self.radius_x + grow;
        let ry = self.radius_y + grow;
        if rx <= f64::EPSILON || ry <= f64::EPSILON {
            return None;
        }
        let d = point - self.center;
        Some((d.x / rx).powi(2) + (d.y / ry).powi(2))
    }
}

impl ShapeTrait for Ellipse {
    object_accessors!();

    fn bounds(&self) -> Rect {
        Rect::from_center_size(self.center, (self.radius_x * 2.0, self.radius_y * 2.0))
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let band = tolerance + self.style.stroke_width / 2.0;
        let inside_outer = self.normalized(point, band).is_some_and(|n| n <= 1.0);
        if !inside_outer || self.style.fill_color.is_some() {
            return inside_outer;
        }
        // Thin ellipses have no hollow interior
        self.normalized(point, -band).is_none_or(|n| n > 1.0)
    }

    fn to_path(&self) -> BezPath {
        KurboEllipse::new(self.center, (self.radius_x, self.radius_y), 0.0).to_path(0.1)
    }

    fn transform(&mut self, affine: Affine) {
        let (sx, sy) = axis_scale(affine);
        self.center = affine * self.center;
        self.radius_x *= sx;
        self.radius_y *= sy;
    }
}
