//! Tool system for the whiteboard.
//!
//! Exactly one [`ToolMode`] is active at a time. Everything the surface needs
//! to know about the mode (whether drags draw or transform, which color the
//! brush paints with) is derived from the mode and the remembered foreground
//! color, so the flags can never disagree with each other.

use crate::config::EditorConfig;
use crate::shapes::{
    Ellipse, Freehand, ObjectFlags, Rectangle, SerializableColor, Shape, ShapeStyle, Text, Triangle,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Where momentary insertions (text, preset shapes) are placed.
pub const INSERT_POSITION: Point = Point::new(100.0, 200.0);

/// Edge length of preset shapes.
pub const PRESET_SIZE: f64 = 100.0;

/// Placeholder content of a freshly inserted text.
pub const DEFAULT_TEXT: &str = "Text";

/// Persistent tool modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    /// Select and transform objects.
    #[default]
    Cursor,
    /// Freehand drawing with the foreground color.
    Pencil,
    /// Freehand drawing with the background color.
    Eraser,
}

impl ToolMode {
    pub fn name(&self) -> &'static str {
        match self {
            ToolMode::Cursor => "cursor",
            ToolMode::Pencil => "pencil",
            ToolMode::Eraser => "eraser",
        }
    }
}

/// Shapes offered by the insert-shape menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapePreset {
    Square,
    Circle,
    Triangle,
}

/// Flags derived from the active mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolState {
    pub mode: ToolMode,
    /// Pointer drags capture freehand strokes.
    pub drawing_enabled: bool,
    /// Pointer drags move, scale and select objects.
    pub transform_enabled: bool,
    /// Color the brush paints with.
    pub stroke_color: SerializableColor,
    /// Width the brush paints with.
    pub stroke_width: f64,
}

/// Manages the current tool, pen settings and in-progress stroke.
#[derive(Debug, Clone)]
pub struct ToolManager {
    mode: ToolMode,
    /// Color chosen by the user; restored when leaving the eraser.
    foreground: SerializableColor,
    width: f64,
    background: SerializableColor,
    fallback_color: SerializableColor,
    min_width: f64,
    max_width: f64,
    /// Points of the stroke being drawn, if any.
    stroke: Option<Vec<Point>>,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl ToolManager {
    /// Create a tool manager in cursor mode with the configured pen.
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            mode: ToolMode::default(),
            foreground: config.default_pen_color,
            width: config.default_pen_width,
            background: config.background_color,
            fallback_color: config.default_pen_color,
            min_width: config.min_pen_width,
            max_width: config.max_pen_width,
            stroke: None,
        }
    }

    /// Current pen width.
    pub fn pen_width(&self) -> f64 {
        self.width
    }

    /// Usable foreground color: the remembered color, unless it would be
    /// invisible on the background.
    pub fn foreground(&self) -> SerializableColor {
        if self.foreground == self.background {
            self.fallback_color
        } else {
            self.foreground
        }
    }

    /// Derived flags for the active mode.
    pub fn state(&self) -> ToolState {
        let (drawing_enabled, transform_enabled, stroke_color) = match self.mode {
            ToolMode::Cursor => (false, true, self.foreground()),
            ToolMode::Pencil => (true, false, self.foreground()),
            ToolMode::Eraser => (true, false, self.background),
        };
        ToolState {
            mode: self.mode,
            drawing_enabled,
            transform_enabled,
            stroke_color,
            stroke_width: self.width,
        }
    }

    /// Switch to a mode. Any stroke in progress is abandoned.
    pub fn select(&mut self, mode: ToolMode) -> ToolState {
        self.mode = mode;
        self.stroke = None;
        self.state()
    }

    /// Remember a new foreground color.
    pub fn set_pen_color(&mut self, color: SerializableColor) -> ToolState {
        self.foreground = color;
        self.state()
    }

    /// Set the pen width, clamped to the accepted range.
    pub fn set_pen_width(&mut self, width: f64) -> ToolState {
        self.width = if width.is_finite() {
            width.clamp(self.min_width, self.max_width)
        } else {
            self.min_width
        };
        self.state()
    }

    /// Change the background the eraser paints with.
    pub fn set_background(&mut self, background: SerializableColor) {
        self.background = background;
    }

    /// Build the text object inserted by the text action.
    pub fn text_object(&self) -> Shape {
        let text =
            Text::new(INSERT_POSITION, DEFAULT_TEXT.to_string()).with_color(self.foreground());
        Shape::Text(text)
    }

    /// Build a preset shape outlined with the current pen.
    pub fn preset_object(&self, preset: ShapePreset) -> Shape {
        let style = ShapeStyle {
            stroke_color: self.foreground(),
            stroke_width: self.width,
            ..ShapeStyle::default()
        };
        match preset {
            ShapePreset::Square => {
                let mut rect = Rectangle::new(INSERT_POSITION, PRESET_SIZE, PRESET_SIZE);
                rect.style = style;
                Shape::Rectangle(rect)
            }
            ShapePreset::Circle => {
                let half = PRESET_SIZE / 2.0;
                let center = Point::new(INSERT_POSITION.x + half, INSERT_POSITION.y + half);
                let mut circle = Ellipse::circle(center, half);
                circle.style = style;
                Shape::Ellipse(circle)
            }
            ShapePreset::Triangle => {
                let mut triangle = Triangle::new(INSERT_POSITION, PRESET_SIZE, PRESET_SIZE);
                triangle.style = style;
                Shape::Triangle(triangle)
            }
        }
    }

    /// Start a freehand stroke. Ignored unless drawing is enabled.
    pub fn begin_stroke(&mut self, point: Point) -> bool {
        if !self.state().drawing_enabled {
            return false;
        }
        self.stroke = Some(vec![point]);
        true
    }

    /// Extend the stroke in progress.
    pub fn extend_stroke(&mut self, point: Point) {
        if let Some(points) = &mut self.stroke {
            points.push(point);
        }
    }

    /// Check if a stroke is being drawn.
    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Finish the stroke in progress and build the freehand object.
    /// Single-point strokes produce nothing.
    pub fn end_stroke(&mut self) -> Option<Shape> {
        let points = self.stroke.take()?;
        if points.len() < 2 {
            return None;
        }
        let state = self.state();
        let mut freehand = Freehand::from_points(points);
        freehand.style.stroke_color = state.stroke_color;
        freehand.style.stroke_width = state.stroke_width;
        freehand.flags = ObjectFlags::INTERACTIVE;
        Some(Shape::Freehand(freehand))
    }
}
