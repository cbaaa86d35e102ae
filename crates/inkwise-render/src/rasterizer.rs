//! tiny-skia rasterizer.

use crate::encode::{encode_jpeg, encode_png};
use inkwise_core::scene::{RasterScene, Rasterizer, SceneError, SceneResult, SnapshotFormat};
use inkwise_core::shapes::{SerializableColor, Shape};
use kurbo::{BezPath, PathEl};
use thiserror::Error;
use tiny_skia::{Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Rasterizer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result type for rasterizer operations.
pub type RenderResult<T> = Result<T, RenderError>;

impl From<RenderError> for SceneError {
    fn from(err: RenderError) -> Self {
        SceneError::Render(err.to_string())
    }
}

/// Draws scenes on the CPU.
///
/// Shapes are filled, then stroked, back to front. Text objects have no glyph
/// outlines here and are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TinySkiaRasterizer {
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl TinySkiaRasterizer {
    pub const DEFAULT_JPEG_QUALITY: u8 = 90;

    pub fn new() -> Self {
        Self {
            jpeg_quality: Self::DEFAULT_JPEG_QUALITY,
        }
    }

    /// Render the scene into a pixmap.
    pub fn render(&self, scene: RasterScene<'_>) -> RenderResult<Pixmap> {
        let mut pixmap = Pixmap::new(scene.width, scene.height).ok_or(RenderError::InvalidSize {
            width: scene.width,
            height: scene.height,
        })?;
        pixmap.fill(to_color(scene.background));

        for shape in scene.shapes {
            draw_shape(&mut pixmap, shape);
        }
        Ok(pixmap)
    }

    /// Render and encode in one go.
    pub fn render_encoded(
        &self,
        scene: RasterScene<'_>,
        format: SnapshotFormat,
    ) -> RenderResult<Vec<u8>> {
        let pixmap = self.render(scene)?;
        let (width, height) = (pixmap.width(), pixmap.height());

        let mut rgba = Vec::with_capacity(pixmap.pixels().len() * 4);
        for pixel in pixmap.pixels() {
            let c = pixel.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        match format {
            SnapshotFormat::Png => encode_png(&rgba, width, height),
            SnapshotFormat::Jpeg => {
                let quality = if self.jpeg_quality == 0 {
                    Self::DEFAULT_JPEG_QUALITY
                } else {
                    self.jpeg_quality.min(100)
                };
                encode_jpeg(&rgba, width, height, quality)
            }
        }
    }
}

impl Rasterizer for TinySkiaRasterizer {
    fn rasterize(&self, scene: RasterScene<'_>, format: SnapshotFormat) -> SceneResult<Vec<u8>> {
        let bytes = self.render_encoded(scene, format)?;
        log::debug!(
            "Rasterized {} object(s) into {} bytes of {}",
            scene.shapes.len(),
            bytes.len(),
            format.mime_type()
        );
        Ok(bytes)
    }
}

fn draw_shape(pixmap: &mut Pixmap, shape: &Shape) {
    match shape {
        Shape::Group(group) => {
            for child in group.children() {
                draw_shape(pixmap, child);
            }
            return;
        }
        Shape::Text(_) => return,
        _ => {}
    }

    let Some(path) = to_skia_path(&shape.to_path()) else {
        return;
    };
    let style = shape.style();

    // Freehand strokes are open polylines and never filled
    if !matches!(shape, Shape::Freehand(_)) {
        if let Some(fill) = style.fill_with_opacity() {
            let paint = paint(fill);
            pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    if style.stroke_width > 0.0 {
        let stroke = Stroke {
            width: style.stroke_width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        let paint = paint(style.stroke_with_opacity());
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

fn paint(color: SerializableColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_color(color));
    paint.anti_alias = true;
    paint
}

fn to_color(color: SerializableColor) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// Convert a kurbo path. Returns `None` for paths with no drawable segment.
fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                builder.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32)
            }
            PathEl::CurveTo(p1, p2, p3) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwise_core::shapes::{Ellipse, Freehand, Group, Rectangle, Text};
    use kurbo::Point;

    const BACKGROUND: SerializableColor = SerializableColor {
        r: 229,
        g: 231,
        b: 235,
        a: 255,
    };

    fn scene(shapes: &[Shape]) -> RasterScene<'_> {
        RasterScene {
            shapes,
            background: BACKGROUND,
            width: 64,
            height: 64,
        }
    }

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let c = pixmap.pixel(x, y).unwrap().demultiply();
        (c.red(), c.green(), c.blue(), c.alpha())
    }

    fn red_square(x: f64, y: f64) -> Shape {
        let mut rect = Rectangle::new(Point::new(x, y), 20.0, 20.0);
        rect.style.fill_color = Some(SerializableColor::new(255, 0, 0, 255));
        rect.style.stroke_width = 0.0;
        Shape::Rectangle(rect)
    }

    #[test]
    fn test_background_and_fill() {
        let shapes = vec![red_square(10.0, 10.0)];
        let pixmap = TinySkiaRasterizer::new().render(scene(&shapes)).unwrap();

        assert_eq!(pixel(&pixmap, 20, 20), (255, 0, 0, 255));
        assert_eq!(pixel(&pixmap, 50, 50), (229, 231, 235, 255));
    }

    #[test]
    fn test_z_order() {
        let mut blue = Rectangle::new(Point::new(15.0, 15.0), 20.0, 20.0);
        blue.style.fill_color = Some(SerializableColor::new(0, 0, 255, 255));
        blue.style.stroke_width = 0.0;
        let shapes = vec![red_square(10.0, 10.0), Shape::Rectangle(blue)];

        let pixmap = TinySkiaRasterizer::new().render(scene(&shapes)).unwrap();
        assert_eq!(pixel(&pixmap, 20, 20), (0, 0, 255, 255));
        assert_eq!(pixel(&pixmap, 12, 12), (255, 0, 0, 255));
    }

    #[test]
    fn test_freehand_stroke_and_group() {
        let mut stroke = Freehand::from_points(vec![Point::new(0.0, 32.0), Point::new(64.0, 32.0)]);
        stroke.style.stroke_width = 6.0;
        let mut dot = Ellipse::circle(Point::new(50.0, 10.0), 5.0);
        dot.style.fill_color = Some(SerializableColor::black());
        let shapes = vec![
            Shape::Freehand(stroke),
            Shape::Group(Group::new(vec![Shape::Ellipse(dot)])),
        ];

        let pixmap = TinySkiaRasterizer::new().render(scene(&shapes)).unwrap();
        assert_eq!(pixel(&pixmap, 32, 32), (0, 0, 0, 255));
        assert_eq!(pixel(&pixmap, 50, 10), (0, 0, 0, 255));
        assert_eq!(pixel(&pixmap, 32, 5), (229, 231, 235, 255));
    }

    #[test]
    fn test_text_is_skipped() {
        let shapes = vec![Shape::Text(Text::new(Point::new(0.0, 0.0), "Hello".to_string()))];
        let pixmap = TinySkiaRasterizer::new().render(scene(&shapes)).unwrap();
        assert_eq!(pixel(&pixmap, 5, 5), (229, 231, 235, 255));
    }

    #[test]
    fn test_zero_size_is_error() {
        let scene = RasterScene {
            shapes: &[],
            background: BACKGROUND,
            width: 0,
            height: 10,
        };
        let result = TinySkiaRasterizer::new().rasterize(scene, SnapshotFormat::Png);
        assert!(matches!(result, Err(SceneError::Render(_))));
    }

    #[test]
    fn test_png_output_decodes() {
        let shapes = vec![red_square(0.0, 0.0)];
        let bytes = TinySkiaRasterizer::new()
            .rasterize(scene(&shapes), SnapshotFormat::Png)
            .unwrap();

        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (64, 64));
        assert_eq!(&buf[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_jpeg_output_decodes() {
        let bytes = TinySkiaRasterizer::new()
            .rasterize(scene(&[]), SnapshotFormat::Jpeg)
            .unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));
    }
}
