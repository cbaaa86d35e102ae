//! Text labels.

use super::{ObjectFlags, SerializableColor, ShapeId, ShapeStyle, ShapeTrait, axis_scale};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Average glyph advance relative to the font size.
const ADVANCE: f64 = 0.55;
/// Line height relative to the font size.
const LINE_HEIGHT: f64 = 1.2;
/// Narrowest box an empty label still occupies.
const MIN_WIDTH: f64 = 20.0;

/// An editable text label. Glyphs are painted with the fill color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Top-left corner of the text box.
    pub position: Point,
    pub content: String,
    /// Font size in pixels.
    pub font_size: f64,
    pub style: ShapeStyle,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 40.0;

    pub fn new(position: Point, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            content,
            font_size: Self::DEFAULT_FONT_SIZE,
            style: ShapeStyle::default(),
            flags: ObjectFlags::default(),
        }
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.style.fill_color = Some(color);
        self
    }

    /// Glyph color: the fill, or the stroke when there is none.
    pub fn color(&self) -> SerializableColor {
        self.style.fill_color.unwrap_or(self.style.stroke_color)
    }

    pub fn set_content(&mut self, content: String) {
        self.content = content;
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Estimated box size. There is no font stack here, so lines are
    /// measured by character count.
    fn estimated_size(&self) -> (f64, f64) {
        let columns = self
            .content
            .split('\n')
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let rows = self.content.split('\n').count();
        let width = (columns as f64 * self.font_size * ADVANCE).max(MIN_WIDTH);
        (width, rows as f64 * self.font_size * LINE_HEIGHT)
    }
}

impl ShapeTrait for Text {
    object_accessors!();

    fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.estimated_size())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    /// The text box outline.
    fn to_path(&self) -> BezPath {
        self.bounds().to_path(0.1)
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
        let (sx, sy) = axis_scale(affine);
        let scale = (sx + sy) / 2.0;
        if (scale - 1.0).abs() > f64::EPSILON {
            self.font_size *= scale;
        }
    }
}
