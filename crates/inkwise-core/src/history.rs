//! Linear undo/redo history of full scene checkpoints.

use crate::shapes::Shape;

/// Default number of checkpoints kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// An immutable snapshot of every object, back to front.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Checkpoint {
    shapes: Vec<Shape>,
}

impl Checkpoint {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }
}

/// Checkpoint sequence with a cursor at the current state.
///
/// The checkpoint under the cursor always mirrors the live scene. Committing
/// after an undo discards everything past the cursor.
#[derive(Debug, Clone)]
pub struct History {
    checkpoints: Vec<Checkpoint>,
    cursor: usize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Checkpoint::default(), DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// Create a history seeded with the initial state.
    pub fn new(initial: Checkpoint, capacity: usize) -> Self {
        Self {
            checkpoints: vec![initial],
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record a new current state.
    pub fn commit(&mut self, state: Checkpoint) {
        self.checkpoints.truncate(self.cursor + 1);
        self.checkpoints.push(state);

        // Limit history size
        if self.checkpoints.len() > self.capacity {
            let excess = self.checkpoints.len() - self.capacity;
            self.checkpoints.drain(..excess);
        }
        self.cursor = self.checkpoints.len() - 1;
    }

    /// Step back, returning the state to restore.
    pub fn undo(&mut self) -> Option<&Checkpoint> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.checkpoints.get(self.cursor)
    }

    /// Step forward, returning the state to restore.
    pub fn redo(&mut self) -> Option<&Checkpoint> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.checkpoints.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.checkpoints.len()
    }

    /// The checkpoint matching the live scene.
    pub fn current(&self) -> Option<&Checkpoint> {
        self.checkpoints.get(self.cursor)
    }

    /// Number of stored checkpoints.
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget everything and start over from `initial`.
    pub fn reset(&mut self, initial: Checkpoint) {
        self.checkpoints.clear();
        self.checkpoints.push(initial);
        self.cursor = 0;
    }
}
