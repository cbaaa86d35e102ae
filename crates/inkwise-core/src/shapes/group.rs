//! Groups of objects moved and styled as one.

use super::{ObjectFlags, Shape, ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A group of objects. Groups nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub(crate) id: ShapeId,
    /// Members, back to front.
    pub children: Vec<Shape>,
    /// Unused for drawing; members carry their own style.
    style: ShapeStyle,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Group {
    pub fn new(children: Vec<Shape>) -> Self {
        Self::with_id(Uuid::new_v4(), children)
    }

    pub fn with_id(id: ShapeId, children: Vec<Shape>) -> Self {
        Self {
            id,
            children,
            style: ShapeStyle::default(),
            flags: ObjectFlags::default(),
        }
    }

    pub fn children(&self) -> &[Shape] {
        &self.children
    }

    /// This group's id followed by every member id, depth first.
    pub fn all_shape_ids(&self) -> Vec<ShapeId> {
        let mut ids = vec![self.id];
        for child in &self.children {
            match child {
                Shape::Group(group) => ids.extend(group.all_shape_ids()),
                other => ids.push(other.id()),
            }
        }
        ids
    }
}

impl ShapeTrait for Group {
    object_accessors!();

    fn bounds(&self) -> Rect {
        self.children
            .iter()
            .map(Shape::bounds)
            .reduce(|acc, b| acc.union(b))
            .unwrap_or(Rect::ZERO)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.children.iter().any(|c| c.hit_test(point, tolerance))
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for child in &self.children {
            path.extend(child.to_path());
        }
        path
    }

    fn transform(&mut self, affine: Affine) {
        self.children.iter_mut().for_each(|c| c.transform(affine));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Ellipse, Rectangle};

    fn pair() -> Group {
        Group::new(vec![
            Shape::Rectangle(Rectangle::new(Point::new(0.0, 0.0), 100.0, 50.0)),
            Shape::Ellipse(Ellipse::circle(Point::new(225.0, 250.0), 25.0)),
        ])
    }

    #[test]
    fn test_bounds_cover_members() {
        assert_eq!(pair().bounds(), Rect::new(0.0, 0.0, 250.0, 275.0));
        assert_eq!(Group::new(Vec::new()).bounds(), Rect::ZERO);
    }

    #[test]
    fn test_hit_any_member() {
        let group = pair();
        assert!(group.hit_test(Point::new(0.0, 25.0), 0.0));
        assert!(group.hit_test(Point::new(250.0, 250.0), 0.0));
        assert!(!group.hit_test(Point::new(150.0, 100.0), 0.0));
    }

    #[test]
    fn test_nested_ids() {
        let inner = pair();
        let inner_ids = inner.all_shape_ids();
        let outer = Group::new(vec![Shape::Group(inner)]);
        assert_eq!(outer.all_shape_ids().len(), 1 + inner_ids.len());
        assert_eq!(&outer.all_shape_ids()[1..], inner_ids.as_slice());
    }

    #[test]
    fn test_transform_moves_members() {
        let mut group = pair();
        group.transform(Affine::translate((10.0, 10.0)));
        assert_eq!(group.bounds(), Rect::new(10.0, 10.0, 260.0, 285.0));
    }
}
