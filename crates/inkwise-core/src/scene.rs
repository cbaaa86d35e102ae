//! Scene graph capability consumed by the editing session.
//!
//! The session never touches a concrete canvas; it drives whatever
//! implements [`SceneGraph`]. [`crate::canvas::Canvas`] is the in-memory
//! implementation, which hands rasterization to a pluggable [`Rasterizer`].

use crate::shapes::{SerializableColor, Shape, ShapeId};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scene graph errors.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("No rasterizer attached to the canvas")]
    NoRasterizer,
    #[error("Render failed: {0}")]
    Render(String),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Raster image encodings accepted by the document store and the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Png,
    Jpeg,
}

impl SnapshotFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            SnapshotFormat::Png => "image/png",
            SnapshotFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SnapshotFormat::Png => "png",
            SnapshotFormat::Jpeg => "jpg",
        }
    }
}

/// An encoded raster image of the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub format: SnapshotFormat,
    pub bytes: Vec<u8>,
}

impl Snapshot {
    pub fn new(format: SnapshotFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    /// Encode the image bytes as standard base64 for text transports.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Decode base64 image bytes.
    pub fn from_base64(format: SnapshotFormat, data: &str) -> Result<Self, base64::DecodeError> {
        Ok(Self::new(format, STANDARD.decode(data)?))
    }
}

/// Everything a rasterizer needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct RasterScene<'a> {
    /// Shapes back to front.
    pub shapes: &'a [Shape],
    pub background: SerializableColor,
    pub width: u32,
    pub height: u32,
}

/// Turns a scene into encoded image bytes.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, scene: RasterScene<'_>, format: SnapshotFormat) -> SceneResult<Vec<u8>>;
}

/// How pointer input is interpreted by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionMode {
    /// Pointer drags capture freehand strokes.
    pub drawing: bool,
    /// Pointer drags move, scale and select objects.
    pub transform: bool,
}

impl Default for InteractionMode {
    fn default() -> Self {
        Self {
            drawing: false,
            transform: true,
        }
    }
}

/// Active brush parameters for freehand capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: SerializableColor,
    pub width: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            width: 1.0,
        }
    }
}

/// The mutable drawing surface the editing session operates on.
pub trait SceneGraph {
    /// Insert an object on top of the z-order.
    fn add_object(&mut self, shape: Shape);

    /// Remove an object, returning it if present.
    fn remove_object(&mut self, id: ShapeId) -> Option<Shape>;

    /// Look up a top-level object.
    fn object(&self, id: ShapeId) -> Option<&Shape>;

    /// Look up a top-level object mutably.
    fn object_mut(&mut self, id: ShapeId) -> Option<&mut Shape>;

    /// Number of top-level objects.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// IDs of the active selection, in z-order.
    fn active_selection(&self) -> Vec<ShapeId>;

    /// Replace the active selection. Unknown IDs are ignored.
    fn set_active_selection(&mut self, ids: Vec<ShapeId>);

    /// Deep copies of the selected objects, back to front.
    fn clone_selection(&self) -> Vec<Shape>;

    /// Deep copy of every object, back to front.
    fn serialize_to_structure(&self) -> Vec<Shape>;

    /// Replace the whole scene with the given objects (back to front).
    /// Clears the active selection.
    fn load_from_structure(&mut self, shapes: Vec<Shape>);

    /// Render the current visual state.
    fn render_snapshot(&self, format: SnapshotFormat) -> SceneResult<Snapshot>;

    /// Switch between freehand capture and object manipulation.
    fn set_interaction_mode(&mut self, drawing: bool, transform: bool);

    /// Configure the freehand brush.
    fn set_brush(&mut self, color: SerializableColor, width: f64);

    /// Background color of the surface.
    fn background(&self) -> SerializableColor;

    /// Repaint the surface. Objects are untouched.
    fn set_background(&mut self, color: SerializableColor);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_base64_roundtrip() {
        let snapshot = Snapshot::new(SnapshotFormat::Png, vec![0x89, b'P', b'N', b'G', 0, 255]);
        let encoded = snapshot.to_base64();
        assert!(encoded.is_ascii());
        let decoded = Snapshot::from_base64(SnapshotFormat::Png, &encoded).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_format_mime() {
        assert_eq!(SnapshotFormat::Png.mime_type(), "image/png");
        assert_eq!(SnapshotFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(
            serde_json::to_string(&SnapshotFormat::Jpeg).unwrap(),
            "\"jpeg\"",
        );
    }
}
