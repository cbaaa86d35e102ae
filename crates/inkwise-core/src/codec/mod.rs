//! Portable document format.
//!
//! A [`DocumentContent`] is the scene flattened into plain records: numbers,
//! hex color strings and, for freehand strokes, a path string produced by
//! [`encode_points`]. A raster snapshot of the board travels alongside so
//! listings can show a thumbnail without decoding the scene.
//!
//! Decoding fails closed: one bad record rejects the whole document, so a
//! caller never ends up with half a scene.

mod path;

pub use path::{decode_points, encode_points};

use crate::scene::{SceneError, SceneGraph, Snapshot, SnapshotFormat};
use crate::shapes::{
    Ellipse, Freehand, Group, ObjectFlags, Rectangle, SerializableColor, Shape, ShapeId,
    ShapeKind, ShapeStyle, ShapeTrait, Text, Triangle,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

/// Codec errors. Everything except `Snapshot` means the document is malformed.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported document version {0}")]
    UnsupportedVersion(u32),
    #[error("Malformed path: {0}")]
    MalformedPath(String),
    #[error("Malformed color: {0:?}")]
    MalformedColor(String),
    #[error("Invalid geometry in object {id}: {reason}")]
    InvalidGeometry { id: ShapeId, reason: String },
    #[error("Duplicate object id {0}")]
    DuplicateId(ShapeId),
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(#[from] base64::DecodeError),
    #[error("Snapshot failed: {0}")]
    Snapshot(#[from] SceneError),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Stroke, fill and opacity as stored in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRecord {
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    pub opacity: f64,
}

impl StyleRecord {
    fn encode(style: &ShapeStyle) -> Self {
        Self {
            stroke: style.stroke_color.to_hex(),
            stroke_width: style.stroke_width,
            fill: style.fill_color.map(|c| c.to_hex()),
            opacity: style.opacity,
        }
    }

    fn decode(&self, id: ShapeId) -> CodecResult<ShapeStyle> {
        require_non_negative(id, "stroke width", self.stroke_width)?;
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(invalid(id, format!("opacity {} out of range", self.opacity)));
        }
        Ok(ShapeStyle {
            stroke_color: parse_color(&self.stroke)?,
            stroke_width: self.stroke_width,
            fill_color: self.fill.as_deref().map(parse_color).transpose()?,
            opacity: self.opacity,
        })
    }
}

/// One scene object, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectRecord {
    Path {
        id: ShapeId,
        /// Point list in the string encoding of [`encode_points`].
        path: String,
        style: StyleRecord,
        #[serde(default)]
        flags: ObjectFlags,
    },
    Text {
        id: ShapeId,
        left: f64,
        top: f64,
        text: String,
        font_size: f64,
        style: StyleRecord,
        #[serde(default)]
        flags: ObjectFlags,
    },
    Rectangle {
        id: ShapeId,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        style: StyleRecord,
        #[serde(default)]
        flags: ObjectFlags,
    },
    Ellipse {
        id: ShapeId,
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        style: StyleRecord,
        #[serde(default)]
        flags: ObjectFlags,
    },
    Triangle {
        id: ShapeId,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        style: StyleRecord,
        #[serde(default)]
        flags: ObjectFlags,
    },
    Group {
        id: ShapeId,
        /// Members, back to front.
        objects: Vec<ObjectRecord>,
        #[serde(default)]
        flags: ObjectFlags,
    },
}

impl ObjectRecord {
    pub fn id(&self) -> ShapeId {
        match self {
            ObjectRecord::Path { id, .. }
            | ObjectRecord::Text { id, .. }
            | ObjectRecord::Rectangle { id, .. }
            | ObjectRecord::Ellipse { id, .. }
            | ObjectRecord::Triangle { id, .. }
            | ObjectRecord::Group { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            ObjectRecord::Path { .. } => ShapeKind::Path,
            ObjectRecord::Text { .. } => ShapeKind::Text,
            ObjectRecord::Rectangle { .. } => ShapeKind::Rectangle,
            ObjectRecord::Ellipse { .. } => ShapeKind::Ellipse,
            ObjectRecord::Triangle { .. } => ShapeKind::Triangle,
            ObjectRecord::Group { .. } => ShapeKind::Group,
        }
    }

    /// Flatten a shape (groups recursively) into a record.
    pub fn encode(shape: &Shape) -> Self {
        match shape {
            Shape::Freehand(s) => ObjectRecord::Path {
                id: s.id(),
                path: encode_points(&s.points),
                style: StyleRecord::encode(&s.style),
                flags: s.flags,
            },
            Shape::Text(s) => ObjectRecord::Text {
                id: s.id(),
                left: s.position.x,
                top: s.position.y,
                text: s.content.clone(),
                font_size: s.font_size,
                style: StyleRecord::encode(&s.style),
                flags: s.flags,
            },
            Shape::Rectangle(s) => ObjectRecord::Rectangle {
                id: s.id(),
                left: s.position.x,
                top: s.position.y,
                width: s.width,
                height: s.height,
                style: StyleRecord::encode(&s.style),
                flags: s.flags,
            },
            Shape::Ellipse(s) => ObjectRecord::Ellipse {
                id: s.id(),
                cx: s.center.x,
                cy: s.center.y,
                rx: s.radius_x,
                ry: s.radius_y,
                style: StyleRecord::encode(&s.style),
                flags: s.flags,
            },
            Shape::Triangle(s) => ObjectRecord::Triangle {
                id: s.id(),
                left: s.position.x,
                top: s.position.y,
                width: s.width,
                height: s.height,
                style: StyleRecord::encode(&s.style),
                flags: s.flags,
            },
            Shape::Group(g) => ObjectRecord::Group {
                id: g.id(),
                objects: g.children().iter().map(ObjectRecord::encode).collect(),
                flags: g.flags,
            },
        }
    }

    /// Rebuild the shape, validating every field.
    pub fn decode(&self) -> CodecResult<Shape> {
        let shape = match self {
            ObjectRecord::Path {
                id,
                path,
                style,
                flags,
            } => Shape::Freehand(Freehand {
                id: *id,
                points: decode_points(path)?,
                style: style.decode(*id)?,
                flags: *flags,
            }),
            ObjectRecord::Text {
                id,
                left,
                top,
                text,
                font_size,
                style,
                flags,
            } => {
                let position = finite_point(*id, *left, *top)?;
                require_positive(*id, "font size", *font_size)?;
                Shape::Text(Text {
                    id: *id,
                    position,
                    content: text.clone(),
                    font_size: *font_size,
                    style: style.decode(*id)?,
                    flags: *flags,
                })
            }
            ObjectRecord::Rectangle {
                id,
                left,
                top,
                width,
                height,
                style,
                flags,
            } => {
                let position = finite_point(*id, *left, *top)?;
                require_non_negative(*id, "width", *width)?;
                require_non_negative(*id, "height", *height)?;
                Shape::Rectangle(Rectangle {
                    id: *id,
                    position,
                    width: *width,
                    height: *height,
                    style: style.decode(*id)?,
                    flags: *flags,
                })
            }
            ObjectRecord::Ellipse {
                id,
                cx,
                cy,
                rx,
                ry,
                style,
                flags,
            } => {
                let center = finite_point(*id, *cx, *cy)?;
                require_non_negative(*id, "x radius", *rx)?;
                require_non_negative(*id, "y radius", *ry)?;
                Shape::Ellipse(Ellipse {
                    id: *id,
                    center,
                    radius_x: *rx,
                    radius_y: *ry,
                    style: style.decode(*id)?,
                    flags: *flags,
                })
            }
            ObjectRecord::Triangle {
                id,
                left,
                top,
                width,
                height,
                style,
                flags,
            } => {
                let position = finite_point(*id, *left, *top)?;
                require_non_negative(*id, "width", *width)?;
                require_non_negative(*id, "height", *height)?;
                Shape::Triangle(Triangle {
                    id: *id,
                    position,
                    width: *width,
                    height: *height,
                    style: style.decode(*id)?,
                    flags: *flags,
                })
            }
            ObjectRecord::Group { id, objects, flags } => {
                let children = objects
                    .iter()
                    .map(ObjectRecord::decode)
                    .collect::<CodecResult<Vec<_>>>()?;
                let mut group = Group::with_id(*id, children);
                group.flags = *flags;
                Shape::Group(group)
            }
        };
        Ok(shape)
    }
}

/// Raster snapshot carried as base64 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSnapshot {
    pub format: SnapshotFormat,
    pub data: String,
}

impl EncodedSnapshot {
    pub fn encode(snapshot: &Snapshot) -> Self {
        Self {
            format: snapshot.format,
            data: snapshot.to_base64(),
        }
    }

    pub fn decode(&self) -> CodecResult<Snapshot> {
        Ok(Snapshot::from_base64(self.format, &self.data)?)
    }
}

/// The persisted form of a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub version: u32,
    /// Background color as a hex string.
    pub background: String,
    /// Objects, back to front.
    pub objects: Vec<ObjectRecord>,
    pub snapshot: EncodedSnapshot,
}

impl DocumentContent {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> CodecResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON and check the version.
    pub fn from_json(json: &str) -> CodecResult<Self> {
        let content: Self = serde_json::from_str(json)?;
        if content.version != DOCUMENT_VERSION {
            return Err(CodecError::UnsupportedVersion(content.version));
        }
        Ok(content)
    }

    /// Parsed background color.
    pub fn background_color(&self) -> CodecResult<SerializableColor> {
        parse_color(&self.background)
    }
}

/// Export the scene, including a freshly rendered snapshot.
pub fn serialize<S: SceneGraph + ?Sized>(
    scene: &S,
    format: SnapshotFormat,
) -> CodecResult<DocumentContent> {
    let snapshot = scene.render_snapshot(format)?;
    Ok(DocumentContent {
        version: DOCUMENT_VERSION,
        background: scene.background().to_hex(),
        objects: scene
            .serialize_to_structure()
            .iter()
            .map(ObjectRecord::encode)
            .collect(),
        snapshot: EncodedSnapshot::encode(&snapshot),
    })
}

/// A document decoded back into scene values.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDocument {
    pub background: SerializableColor,
    /// Objects back to front.
    pub shapes: Vec<Shape>,
}

/// Rebuild the background and objects of a document.
///
/// Fails on the first malformed record; nothing is returned in that case.
pub fn deserialize(content: &DocumentContent) -> CodecResult<DecodedDocument> {
    if content.version != DOCUMENT_VERSION {
        return Err(CodecError::UnsupportedVersion(content.version));
    }
    let background = content.background_color()?;

    let shapes = content
        .objects
        .iter()
        .map(ObjectRecord::decode)
        .collect::<CodecResult<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for shape in &shapes {
        let ids = match shape {
            Shape::Group(group) => group.all_shape_ids(),
            other => vec![other.id()],
        };
        for id in ids {
            if !seen.insert(id) {
                return Err(CodecError::DuplicateId(id));
            }
        }
    }
    Ok(DecodedDocument { background, shapes })
}

fn parse_color(hex: &str) -> CodecResult<SerializableColor> {
    SerializableColor::from_hex(hex).ok_or_else(|| CodecError::MalformedColor(hex.to_string()))
}

fn invalid(id: ShapeId, reason: String) -> CodecError {
    CodecError::InvalidGeometry { id, reason }
}

fn finite_point(id: ShapeId, x: f64, y: f64) -> CodecResult<Point> {
    if x.is_finite() && y.is_finite() {
        Ok(Point::new(x, y))
    } else {
        Err(invalid(id, format!("non-finite position ({x}, {y})")))
    }
}

fn require_non_negative(id: ShapeId, what: &str, value: f64) -> CodecResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(id, format!("{what} must be non-negative, got {value}")))
    }
}

fn require_positive(id: ShapeId, what: &str, value: f64) -> CodecResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(id, format!("{what} must be positive, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::scene::{RasterScene, Rasterizer, SceneResult};
    use std::sync::Arc;

    /// Produces bytes that depend on the scene so snapshots can be compared.
    struct CountingRasterizer;

    impl Rasterizer for CountingRasterizer {
        fn rasterize(
            &self,
            scene: RasterScene<'_>,
            format: SnapshotFormat,
        ) -> SceneResult<Vec<u8>> {
            let tag = match format {
                SnapshotFormat::Png => b'P',
                SnapshotFormat::Jpeg => b'J',
            };
            Ok(vec![tag, scene.shapes.len() as u8, scene.background.g])
        }
    }

    fn sample_canvas() -> Canvas {
        let mut canvas = Canvas::default().with_rasterizer(Arc::new(CountingRasterizer));

        let mut stroke = Freehand::from_points(vec![
            Point::new(0.1, 0.2),
            Point::new(10.0 / 3.0, 7.25),
            Point::new(42.000_000_000_1, -3.5),
        ]);
        stroke.style.stroke_width = 5.0;
        stroke.style.stroke_color = SerializableColor::new(12, 34, 56, 200);

        let mut rect = Rectangle::new(Point::new(20.0, 30.0), 80.0, 40.0);
        rect.style.fill_color = Some(SerializableColor::white());
        rect.style.opacity = 0.5;

        let text = Text::new(Point::new(100.0, 200.0), "Hello\nboard".to_string())
            .with_color(SerializableColor::new(255, 0, 0, 255));

        let group = Group::new(vec![
            Shape::Ellipse(Ellipse::new(Point::new(300.0, 300.0), 20.0, 10.0)),
            Shape::Triangle(Triangle::new(Point::new(400.0, 300.0), 30.0, 30.0)),
        ]);

        canvas.add_object(Shape::Freehand(stroke));
        canvas.add_object(Shape::Rectangle(rect));
        canvas.add_object(Shape::Text(text));
        canvas.add_object(Shape::Group(group));
        canvas
    }

    #[test]
    fn test_serialize_records() {
        let canvas = sample_canvas();
        let content = serialize(&canvas, SnapshotFormat::Png).unwrap();

        assert_eq!(content.version, DOCUMENT_VERSION);
        assert_eq!(content.background, "#e5e7eb");
        let kinds: Vec<_> = content.objects.iter().map(ObjectRecord::kind).collect();
        assert_eq!(
            kinds,
            vec![ShapeKind::Path, ShapeKind::Rectangle, ShapeKind::Text, ShapeKind::Group]
        );
        assert_eq!(content.snapshot.decode().unwrap().bytes, vec![b'P', 4, 231]);
    }

    #[test]
    fn test_path_is_string_encoded() {
        let content = serialize(&sample_canvas(), SnapshotFormat::Png).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content.to_json().unwrap()).unwrap();
        let path = &json["objects"][0];
        assert_eq!(path["kind"], "path");
        assert!(path["path"].is_string());
    }

    #[test]
    fn test_roundtrip_is_identity() {
        let content = serialize(&sample_canvas(), SnapshotFormat::Png).unwrap();
        let json = content.to_json().unwrap();
        let parsed = DocumentContent::from_json(&json).unwrap();
        assert_eq!(parsed, content);

        let decoded = deserialize(&parsed).unwrap();
        let mut restored = Canvas::default().with_rasterizer(Arc::new(CountingRasterizer));
        restored.load_from_structure(decoded.shapes);
        let again = serialize(&restored, SnapshotFormat::Png).unwrap();
        assert_eq!(again, content);
    }

    #[test]
    fn test_roundtrip_keeps_custom_background() {
        let mut canvas = sample_canvas();
        canvas.set_background(SerializableColor::new(0x12, 0x34, 0x56, 255));
        let content = serialize(&canvas, SnapshotFormat::Png).unwrap();
        assert_eq!(content.background, "#123456");

        let decoded = deserialize(&content).unwrap();
        assert_eq!(
            decoded.background,
            SerializableColor::new(0x12, 0x34, 0x56, 255),
        );

        let mut restored = Canvas::default().with_rasterizer(Arc::new(CountingRasterizer));
        restored.set_background(decoded.background);
        restored.load_from_structure(decoded.shapes);
        assert_eq!(serialize(&restored, SnapshotFormat::Png).unwrap(), content);
    }

    #[test]
    fn test_exact_point_recovery() {
        let canvas = sample_canvas();
        let original = canvas.serialize_to_structure();
        let content = serialize(&canvas, SnapshotFormat::Png).unwrap();
        let parsed = DocumentContent::from_json(&content.to_json().unwrap()).unwrap();
        let shapes = deserialize(&parsed).unwrap().shapes;

        let (Shape::Freehand(before), Shape::Freehand(after)) = (&original[0], &shapes[0]) else {
            panic!("expected freehand first");
        };
        assert_eq!(before.points, after.points);
        assert_eq!(shapes, original);
    }

    #[test]
    fn test_malformed_path_fails_whole_document() {
        let mut content = serialize(&sample_canvas(), SnapshotFormat::Png).unwrap();
        if let ObjectRecord::Path { path, .. } = &mut content.objects[0] {
            *path = "M 0 0 L 10 10".to_string();
        }
        assert!(matches!(
            deserialize(&content),
            Err(CodecError::MalformedPath(_))
        ));
    }

    #[test]
    fn test_bad_nested_record_fails() {
        let mut content = serialize(&sample_canvas(), SnapshotFormat::Png).unwrap();
        if let ObjectRecord::Group { objects, .. } = &mut content.objects[3] {
            if let ObjectRecord::Ellipse { rx, .. } = &mut objects[0] {
                *rx = -1.0;
            }
        }
        assert!(matches!(
            deserialize(&content),
            Err(CodecError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_bad_color_and_version() {
        let mut content = serialize(&sample_canvas(), SnapshotFormat::Png).unwrap();
        content.background = "grey".to_string();
        assert!(matches!(
            deserialize(&content),
            Err(CodecError::MalformedColor(_))
        ));
        content.background = "#éa".to_string();
        assert!(matches!(
            deserialize(&content),
            Err(CodecError::MalformedColor(_))
        ));

        content.background = "#ffffff".to_string();
        content.version = 99;
        assert!(matches!(
            deserialize(&content),
            Err(CodecError::UnsupportedVersion(99))
        ));
        let json = content.to_json().unwrap();
        assert!(matches!(
            DocumentContent::from_json(&json),
            Err(CodecError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn test_non_ascii_stroke_fails_closed() {
        let mut content = serialize(&sample_canvas(), SnapshotFormat::Png).unwrap();
        if let ObjectRecord::Rectangle { style, .. } = &mut content.objects[1] {
            style.stroke = "#éa".to_string();
        }
        assert!(matches!(
            deserialize(&content),
            Err(CodecError::MalformedColor(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut content = serialize(&sample_canvas(), SnapshotFormat::Png).unwrap();
        let first = content.objects[1].clone();
        content.objects.push(first);
        assert!(matches!(
            deserialize(&content),
            Err(CodecError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let json = r##"{
            "version": 1,
            "background": "#e5e7eb",
            "objects": [{"kind": "star", "id": "00000000-0000-0000-0000-000000000001"}],
            "snapshot": {"format": "png", "data": ""}
        }"##;
        assert!(matches!(
            DocumentContent::from_json(json),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn test_serialize_without_rasterizer_fails() {
        let canvas = Canvas::default();
        assert!(matches!(
            serialize(&canvas, SnapshotFormat::Png),
            Err(CodecError::Snapshot(SceneError::NoRasterizer))
        ));
    }
}
