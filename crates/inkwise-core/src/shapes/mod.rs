//! Shape definitions for the whiteboard.

/// Implements the id and style accessors of [`ShapeTrait`] for a shape
/// struct with `id` and `style` fields.
macro_rules! object_accessors {
    () => {
        fn id(&self) -> $crate::shapes::ShapeId {
            self.id
        }

        fn style(&self) -> &$crate::shapes::ShapeStyle {
            &self.style
        }

        fn style_mut(&mut self) -> &mut $crate::shapes::ShapeStyle {
            &mut self.style
        }
    };
}

mod ellipse;
mod freehand;
mod group;
mod rectangle;
mod text;
mod triangle;

pub use ellipse::Ellipse;
pub use freehand::Freehand;
pub use group::Group;
pub use rectangle::Rectangle;
pub use text::Text;
pub use triangle::Triangle;

use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse a CSS hex color (`#rgb`, `#rrggbb` or `#rrggbbaa`).
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.trim().strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                // #rgb -> #rrggbb
                let r = channel(&hex[0..1])? * 17;
                let g = channel(&hex[1..2])? * 17;
                let b = channel(&hex[2..3])? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Stroke color.
    pub stroke_color: SerializableColor,
    /// Stroke width.
    pub stroke_width: f64,
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl ShapeStyle {
    /// Get the stroke color with opacity applied.
    pub fn stroke_with_opacity(&self) -> SerializableColor {
        with_opacity(self.stroke_color, self.opacity)
    }

    /// Get the fill color with opacity applied.
    pub fn fill_with_opacity(&self) -> Option<SerializableColor> {
        self.fill_color.map(|c| with_opacity(c, self.opacity))
    }
}

fn with_opacity(color: SerializableColor, opacity: f64) -> SerializableColor {
    let alpha = (color.a as f64 * opacity.clamp(0.0, 1.0)) as u8;
    SerializableColor::new(color.r, color.g, color.b, alpha)
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            fill_color: None,
            opacity: 1.0,
        }
    }
}

/// Interactivity flags of an object on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFlags {
    /// Whether the object can be picked by the selection tool.
    pub selectable: bool,
    /// Whether the object receives pointer events at all.
    pub evented: bool,
}

impl ObjectFlags {
    pub const INTERACTIVE: Self = Self {
        selectable: true,
        evented: true,
    };

    pub fn is_interactive(&self) -> bool {
        self.selectable && self.evented
    }
}

impl Default for ObjectFlags {
    fn default() -> Self {
        Self::INTERACTIVE
    }
}

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Distance from `point` to the segment `a`-`b`.
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    point.distance(a + seg * t)
}

/// Distance from `point` to the nearest segment of an open polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Horizontal and vertical scale factors of an affine. Shapes stored as
/// axis-aligned boxes keep only these.
pub(crate) fn axis_scale(affine: Affine) -> (f64, f64) {
    let [a, _, _, d, _, _] = affine.as_coeffs();
    (a.abs(), d.abs())
}

/// Geometry shared by every board object.
pub trait ShapeTrait {
    fn id(&self) -> ShapeId;

    /// Axis-aligned bounds in board coordinates.
    fn bounds(&self) -> Rect;

    /// Whether `point` picks this object, `tolerance` pixels around the outline.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Outline used by the rasterizer.
    fn to_path(&self) -> BezPath;

    fn style(&self) -> &ShapeStyle;

    fn style_mut(&mut self) -> &mut ShapeStyle;

    fn transform(&mut self, affine: Affine);
}

/// The kind of a scene object, as seen by the codec and the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Path,
    Text,
    Rectangle,
    Ellipse,
    Triangle,
    Group,
}

/// Any object on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Freehand(Freehand),
    Text(Text),
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Triangle(Triangle),
    Group(Group),
}

/// Run `$body` against whichever shape `$shape` holds, bound as `$s`.
macro_rules! dispatch {
    ($shape:expr, $s:ident => $body:expr) => {
        match $shape {
            Shape::Freehand($s) => $body,
            Shape::Text($s) => $body,
            Shape::Rectangle($s) => $body,
            Shape::Ellipse($s) => $body,
            Shape::Triangle($s) => $body,
            Shape::Group($s) => $body,
        }
    };
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        dispatch!(self, s => s.id())
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Freehand(_) => ShapeKind::Path,
            Shape::Text(_) => ShapeKind::Text,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Ellipse(_) => ShapeKind::Ellipse,
            Shape::Triangle(_) => ShapeKind::Triangle,
            Shape::Group(_) => ShapeKind::Group,
        }
    }

    pub fn bounds(&self) -> Rect {
        dispatch!(self, s => s.bounds())
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        dispatch!(self, s => s.hit_test(point, tolerance))
    }

    pub fn to_path(&self) -> BezPath {
        dispatch!(self, s => s.to_path())
    }

    pub fn style(&self) -> &ShapeStyle {
        dispatch!(self, s => s.style())
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        dispatch!(self, s => s.style_mut())
    }

    pub fn transform(&mut self, affine: Affine) {
        dispatch!(self, s => s.transform(affine))
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.transform(Affine::translate(offset));
    }

    pub fn flags(&self) -> ObjectFlags {
        dispatch!(self, s => s.flags)
    }

    pub fn flags_mut(&mut self) -> &mut ObjectFlags {
        dispatch!(self, s => &mut s.flags)
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Shape::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Give this object, and every group member below it, a fresh id.
    pub fn regenerate_ids(&mut self) {
        dispatch!(self, s => s.id = Uuid::new_v4());
        if let Shape::Group(group) = self {
            group.children.iter_mut().for_each(Shape::regenerate_ids);
        }
    }

    /// Deep copy that shares no id with the original.
    pub fn duplicate(&self) -> Shape {
        let mut copy = self.clone();
        copy.regenerate_ids();
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let color = SerializableColor::from_hex("#e5e7eb").unwrap();
        assert_eq!(color, SerializableColor::new(0xe5, 0xe7, 0xeb, 255));
        assert_eq!(color.to_hex(), "#e5e7eb");
    }

    #[test]
    fn test_hex_short_and_alpha() {
        assert_eq!(
            SerializableColor::from_hex("#fff"),
            Some(SerializableColor::white())
        );
        let translucent = SerializableColor::from_hex("#00000080").unwrap();
        assert_eq!(translucent.a, 0x80);
        assert_eq!(translucent.to_hex(), "#00000080");
        assert!(SerializableColor::from_hex("black").is_none());
        assert!(SerializableColor::from_hex("#12345").is_none());
    }

    #[test]
    fn test_hex_rejects_non_digits() {
        assert!(SerializableColor::from_hex("#éa").is_none());
        assert!(SerializableColor::from_hex("#aé").is_none());
        assert!(SerializableColor::from_hex("#+f+f+f").is_none());
        assert!(SerializableColor::from_hex("#+ff").is_none());
    }

    #[test]
    fn test_opacity_applied() {
        let style = ShapeStyle {
            opacity: 0.5,
            ..ShapeStyle::default()
        };
        assert_eq!(style.stroke_with_opacity().a, 127);
    }

    #[test]
    fn test_duplicate_regenerates_nested_ids() {
        let inner = Shape::Rectangle(Rectangle::new(Point::new(0.0, 0.0), 10.0, 10.0));
        let inner_id = inner.id();
        let group = Shape::Group(Group::new(vec![inner]));

        let copy = group.duplicate();
        assert_ne!(copy.id(), group.id());
        let child = &copy.as_group().unwrap().children()[0];
        assert_ne!(child.id(), inner_id);
        // Geometry is carried over unchanged.
        assert_eq!(
            child.bounds(),
            group.as_group().unwrap().children()[0].bounds(),
        );
    }

    #[test]
    fn test_translate() {
        let mut shape = Shape::Ellipse(Ellipse::new(Point::new(50.0, 50.0), 10.0, 5.0));
        shape.translate(Vec2::new(10.0, -10.0));
        let bounds = shape.bounds();
        assert!((bounds.x0 - 50.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 35.0).abs() < f64::EPSILON);
    }
}
