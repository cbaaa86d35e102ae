//! Copy and cascading paste.

use crate::scene::SceneGraph;
use crate::shapes::{ObjectFlags, Shape, ShapeId};
use kurbo::Vec2;
use thiserror::Error;

/// Clipboard errors. Both are unmet preconditions and leave state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("Nothing is selected")]
    EmptySelection,
    #[error("Clipboard is empty")]
    EmptyClipboard,
}

/// Result type for clipboard operations.
pub type ClipboardResult<T> = Result<T, ClipboardError>;

/// A copied selection and the offset the next paste lands at.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    shapes: Vec<Shape>,
    offset: Vec2,
}

impl ClipboardEntry {
    /// Copied objects, back to front.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Offset applied by the next paste.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }
}

/// Holds at most one copied selection.
#[derive(Debug, Clone)]
pub struct Clipboard {
    entry: Option<ClipboardEntry>,
    step: f64,
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl Clipboard {
    /// Create an empty clipboard whose pastes cascade by `step` on both axes.
    pub fn new(step: f64) -> Self {
        Self { entry: None, step }
    }

    pub fn entry(&self) -> Option<&ClipboardEntry> {
        self.entry.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    /// Copy the active selection, replacing any previous entry.
    /// Returns the number of copied objects.
    pub fn copy<S: SceneGraph + ?Sized>(&mut self, scene: &S) -> ClipboardResult<usize> {
        let shapes = scene.clone_selection();
        if shapes.is_empty() {
            return Err(ClipboardError::EmptySelection);
        }
        let count = shapes.len();
        self.entry = Some(ClipboardEntry {
            shapes,
            offset: Vec2::new(self.step, self.step),
        });
        Ok(count)
    }

    /// Insert fresh duplicates of the entry at its current offset and select them.
    /// Each paste shifts the next one by another step.
    pub fn paste<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
    ) -> ClipboardResult<Vec<ShapeId>> {
        let entry = self.entry.as_mut().ok_or(ClipboardError::EmptyClipboard)?;

        let mut pasted = Vec::with_capacity(entry.shapes.len());
        for shape in &entry.shapes {
            let mut copy = shape.duplicate();
            copy.translate(entry.offset);
            make_interactive(&mut copy);
            pasted.push(copy.id());
            scene.add_object(copy);
        }
        scene.set_active_selection(pasted.clone());

        entry.offset += Vec2::new(self.step, self.step);
        Ok(pasted)
    }
}

fn make_interactive(shape: &mut Shape) {
    *shape.flags_mut() = ObjectFlags::INTERACTIVE;
    if let Shape::Group(group) = shape {
        group.children.iter_mut().for_each(make_interactive);
    }
}
