//! In-memory scene graph.

use crate::config::EditorConfig;
use crate::scene::{
    Brush, InteractionMode, RasterScene, Rasterizer, SceneError, SceneGraph, SceneResult, Snapshot,
    SnapshotFormat,
};
use crate::shapes::{SerializableColor, Shape, ShapeId};
use kurbo::{Point, Rect};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A drawing surface holding shapes keyed by ID plus their stacking order.
#[derive(Clone)]
pub struct Canvas {
    /// All shapes on the canvas, keyed by ID.
    shapes: HashMap<ShapeId, Shape>,
    /// Z-order of shapes (back to front).
    z_order: Vec<ShapeId>,
    /// Currently selected shape IDs.
    selection: Vec<ShapeId>,
    mode: InteractionMode,
    brush: Brush,
    background: SerializableColor,
    width: u32,
    height: u32,
    rasterizer: Option<Arc<dyn Rasterizer>>,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("shapes", &self.shapes.len())
            .field("selection", &self.selection)
            .field("mode", &self.mode)
            .field("brush", &self.brush)
            .field("size", &(self.width, self.height))
            .field("has_rasterizer", &self.rasterizer.is_some())
            .finish()
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl Canvas {
    /// Create an empty canvas sized and colored from the editor config.
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            shapes: HashMap::new(),
            z_order: Vec::new(),
            selection: Vec::new(),
            mode: InteractionMode::default(),
            brush: Brush {
                color: config.default_pen_color,
                width: config.default_pen_width,
            },
            background: config.background_color,
            width: config.canvas_width,
            height: config.canvas_height,
            rasterizer: None,
        }
    }

    /// Attach the rasterizer used by [`SceneGraph::render_snapshot`].
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Current interaction mode.
    pub fn interaction_mode(&self) -> InteractionMode {
        self.mode
    }

    /// Current freehand brush.
    pub fn brush(&self) -> Brush {
        self.brush
    }

    /// Canvas size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Remove every shape and reset the background.
    pub fn clear(&mut self, background: SerializableColor) {
        self.shapes.clear();
        self.z_order.clear();
        self.selection.clear();
        self.background = background;
    }

    /// Get shapes in z-order (back to front).
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Z-order of shapes (back to front).
    pub fn z_order(&self) -> &[ShapeId] {
        &self.z_order
    }

    /// Bring a shape to the front (topmost).
    pub fn bring_to_front(&mut self, id: ShapeId) {
        if self.shapes.contains_key(&id) {
            self.z_order.retain(|&shape_id| shape_id != id);
            self.z_order.push(id);
        }
    }

    /// Send a shape to the back (bottommost).
    pub fn send_to_back(&mut self, id: ShapeId) {
        if self.shapes.contains_key(&id) {
            self.z_order.retain(|&shape_id| shape_id != id);
            self.z_order.insert(0, id);
        }
    }

    /// Get the bounding box of all shapes.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .values()
            .map(Shape::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    /// Find selectable shapes at a point, front to back.
    pub fn objects_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .filter_map(|&id| {
                self.shapes
                    .get(&id)
                    .filter(|s| s.flags().is_interactive() && s.hit_test(point, tolerance))
                    .map(|_| id)
            })
            .collect()
    }
}

impl SceneGraph for Canvas {
    fn add_object(&mut self, shape: Shape) {
        let id = shape.id();
        if self.shapes.insert(id, shape).is_none() {
            self.z_order.push(id);
        }
    }

    fn remove_object(&mut self, id: ShapeId) -> Option<Shape> {
        self.z_order.retain(|&shape_id| shape_id != id);
        self.selection.retain(|&shape_id| shape_id != id);
        self.shapes.remove(&id)
    }

    fn object(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    fn object_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    fn len(&self) -> usize {
        self.shapes.len()
    }

    fn active_selection(&self) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .copied()
            .filter(|id| self.selection.contains(id))
            .collect()
    }

    fn set_active_selection(&mut self, ids: Vec<ShapeId>) {
        self.selection = ids
            .into_iter()
            .filter(|id| self.shapes.contains_key(id))
            .collect();
    }

    fn clone_selection(&self) -> Vec<Shape> {
        self.active_selection()
            .into_iter()
            .filter_map(|id| self.shapes.get(&id).cloned())
            .collect()
    }

    fn serialize_to_structure(&self) -> Vec<Shape> {
        self.shapes_ordered().cloned().collect()
    }

    fn load_from_structure(&mut self, shapes: Vec<Shape>) {
        self.shapes.clear();
        self.z_order.clear();
        self.selection.clear();
        for shape in shapes {
            self.add_object(shape);
        }
    }

    fn render_snapshot(&self, format: SnapshotFormat) -> SceneResult<Snapshot> {
        let rasterizer = self.rasterizer.as_ref().ok_or(SceneError::NoRasterizer)?;
        let shapes = self.serialize_to_structure();
        let bytes = rasterizer.rasterize(
            RasterScene {
                shapes: &shapes,
                background: self.background,
                width: self.width,
                height: self.height,
            },
            format,
        )?;
        Ok(Snapshot::new(format, bytes))
    }

    fn set_interaction_mode(&mut self, drawing: bool, transform: bool) {
        self.mode = InteractionMode { drawing, transform };
        if drawing {
            // Freehand capture never leaves a live selection behind.
            self.selection.clear();
        }
    }

    fn set_brush(&mut self, color: SerializableColor, width: f64) {
        self.brush = Brush { color, width };
    }

    fn background(&self) -> SerializableColor {
        self.background
    }

    fn set_background(&mut self, color: SerializableColor) {
        self.background = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Rectangle;

    struct SolidRasterizer;

    impl Rasterizer for SolidRasterizer {
        fn rasterize(
            &self,
            scene: RasterScene<'_>,
            _format: SnapshotFormat,
        ) -> SceneResult<Vec<u8>> {
            Ok(vec![scene.shapes.len() as u8, scene.background.r])
        }
    }

    fn filled_rect(x: f64, y: f64) -> Shape {
        let mut rect = Rectangle::new(Point::new(x, y), 100.0, 100.0);
        rect.style.fill_color = Some(SerializableColor::white());
        Shape::Rectangle(rect)
    }

    #[test]
    fn test_add_and_remove() {
        let mut canvas = Canvas::default();
        let shape = filled_rect(0.0, 0.0);
        let id = shape.id();

        canvas.add_object(shape);
        assert_eq!(canvas.len(), 1);
        assert!(canvas.object(id).is_some());

        assert!(canvas.remove_object(id).is_some());
        assert!(canvas.is_empty());
        assert!(canvas.z_order().is_empty());
    }

    #[test]
    fn test_re_adding_keeps_single_z_entry() {
        let mut canvas = Canvas::default();
        let shape = filled_rect(0.0, 0.0);
        canvas.add_object(shape.clone());
        canvas.add_object(shape);
        assert_eq!(canvas.z_order().len(), 1);
    }

    #[test]
    fn test_z_order() {
        let mut canvas = Canvas::default();
        let a = filled_rect(0.0, 0.0);
        let b = filled_rect(50.0, 50.0);
        let (id1, id2) = (a.id(), b.id());
        canvas.add_object(a);
        canvas.add_object(b);

        assert_eq!(canvas.z_order(), &[id1, id2]);
        canvas.bring_to_front(id1);
        assert_eq!(canvas.z_order(), &[id2, id1]);
        canvas.send_to_back(id1);
        assert_eq!(canvas.z_order(), &[id1, id2]);
    }

    #[test]
    fn test_objects_at_point() {
        let mut canvas = Canvas::default();
        let a = filled_rect(0.0, 0.0);
        let b = filled_rect(50.0, 50.0);
        let (id1, id2) = (a.id(), b.id());
        canvas.add_object(a);
        canvas.add_object(b);

        // Front shape comes first
        assert_eq!(
            canvas.objects_at_point(Point::new(75.0, 75.0), 0.0),
            vec![id2, id1],
        );
        assert_eq!(
            canvas.objects_at_point(Point::new(25.0, 25.0), 0.0),
            vec![id1],
        );
    }

    #[test]
    fn test_selection_follows_z_order_and_ignores_unknown() {
        let mut canvas = Canvas::default();
        let a = filled_rect(0.0, 0.0);
        let b = filled_rect(50.0, 50.0);
        let (id1, id2) = (a.id(), b.id());
        canvas.add_object(a);
        canvas.add_object(b);

        canvas.set_active_selection(vec![id2, uuid::Uuid::new_v4(), id1]);
        assert_eq!(canvas.active_selection(), vec![id1, id2]);

        canvas.remove_object(id1);
        assert_eq!(canvas.active_selection(), vec![id2]);
    }

    #[test]
    fn test_clone_selection_is_independent() {
        let mut canvas = Canvas::default();
        let shape = filled_rect(0.0, 0.0);
        let id = shape.id();
        canvas.add_object(shape);
        canvas.set_active_selection(vec![id]);

        let mut copies = canvas.clone_selection();
        copies[0].translate(kurbo::Vec2::new(10.0, 10.0));

        let original = canvas.object(id).unwrap();
        assert!((original.bounds().x0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_from_structure_replaces_scene() {
        let mut canvas = Canvas::default();
        let old = filled_rect(0.0, 0.0);
        let old_id = old.id();
        canvas.add_object(old);
        canvas.set_active_selection(vec![old_id]);

        let fresh = vec![filled_rect(1.0, 1.0), filled_rect(2.0, 2.0)];
        let ids: Vec<_> = fresh.iter().map(Shape::id).collect();
        canvas.load_from_structure(fresh);

        assert_eq!(canvas.z_order(), ids.as_slice());
        assert!(canvas.active_selection().is_empty());
        assert!(canvas.object(old_id).is_none());
    }

    #[test]
    fn test_render_requires_rasterizer() {
        let canvas = Canvas::default();
        assert!(matches!(
            canvas.render_snapshot(SnapshotFormat::Png),
            Err(SceneError::NoRasterizer)
        ));

        let mut canvas = Canvas::default().with_rasterizer(Arc::new(SolidRasterizer));
        canvas.add_object(filled_rect(0.0, 0.0));
        let snapshot = canvas.render_snapshot(SnapshotFormat::Png).unwrap();
        assert_eq!(snapshot.bytes, vec![1, 229]);
    }

    #[test]
    fn test_drawing_mode_drops_selection() {
        let mut canvas = Canvas::default();
        let shape = filled_rect(0.0, 0.0);
        let id = shape.id();
        canvas.add_object(shape);
        canvas.set_active_selection(vec![id]);

        canvas.set_interaction_mode(true, false);
        assert!(canvas.active_selection().is_empty());
        assert!(canvas.interaction_mode().drawing);
    }

    #[test]
    fn test_clear_resets_background() {
        let mut canvas = Canvas::default();
        canvas.add_object(filled_rect(0.0, 0.0));
        canvas.clear(SerializableColor::white());
        assert!(canvas.is_empty());
        assert_eq!(canvas.background(), SerializableColor::white());
        assert!(canvas.bounds().is_none());
    }
}
