//! The editing session: one user, one board.
//!
//! [`EditingSession`] owns every piece of mutable editor state and is passed
//! explicitly to whoever drives it. Saves and assistant requests are split in
//! three steps (`prepare_*`, `run`, `finish_*`) so the session is never held
//! across an await: the job captures owned copies of what it needs at
//! dispatch, and the outcome is folded back in when it resolves. Until then
//! the board stays fully editable, and several jobs may be in flight at once.

use crate::assist::{
    AssistBackend, AssistError, AssistRequest, AssistResult, Conversation, ConversationTurn, Topic,
    build_request,
};
use crate::clipboard::{Clipboard, ClipboardError};
use crate::codec::{self, CodecError, DocumentContent};
use crate::config::EditorConfig;
use crate::history::{Checkpoint, History};
use crate::notice::{Notice, NoticeQueue};
use crate::scene::{SceneError, SceneGraph, Snapshot};
use crate::shapes::{SerializableColor, Shape, ShapeId, ShapeStyle};
use crate::storage::{DocumentStore, StorageError, StorageResult, StoredDocument};
use crate::tools::{ShapePreset, ToolManager, ToolMode, ToolState};
use kurbo::{Affine, Point};
use thiserror::Error;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error("Nothing is selected")]
    NothingSelected,
    #[error("Object {0} is not a text")]
    NotText(ShapeId),
    #[error("Sign in to save your board")]
    NotSignedIn,
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Assist(#[from] AssistError),
}

/// Broad classes of failure, each handled the same way by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The user asked for something that cannot apply right now.
    Precondition,
    /// A collaborator (store, assistant, rasterizer) failed.
    External,
    /// A stored document could not be decoded.
    MalformedDocument,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Clipboard(_)
            | SessionError::NothingSelected
            | SessionError::NotText(_)
            | SessionError::NotSignedIn => ErrorKind::Precondition,
            SessionError::Codec(CodecError::Snapshot(_)) => ErrorKind::External,
            SessionError::Codec(_) | SessionError::Storage(StorageError::Serialization(_)) => {
                ErrorKind::MalformedDocument
            }
            SessionError::Scene(_) | SessionError::Storage(_) | SessionError::Assist(_) => {
                ErrorKind::External
            }
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Partial style update applied to every selected object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StylePatch {
    pub stroke_color: Option<SerializableColor>,
    pub stroke_width: Option<f64>,
    /// `Some(None)` removes the fill.
    pub fill_color: Option<Option<SerializableColor>>,
    pub opacity: Option<f64>,
}

impl StylePatch {
    fn apply(&self, style: &mut ShapeStyle) {
        if let Some(color) = self.stroke_color {
            style.stroke_color = color;
        }
        if let Some(width) = self.stroke_width {
            style.stroke_width = width.max(0.0);
        }
        if let Some(fill) = self.fill_color {
            style.fill_color = fill;
        }
        if let Some(opacity) = self.opacity {
            style.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    fn apply_to(&self, shape: &mut Shape) {
        match shape {
            Shape::Group(group) => group
                .children
                .iter_mut()
                .for_each(|child| self.apply_to(child)),
            other => self.apply(other.style_mut()),
        }
    }
}

/// A save captured at dispatch time.
#[derive(Debug, Clone)]
pub struct SaveJob {
    owner: String,
    document_id: Option<String>,
    content: DocumentContent,
}

impl SaveJob {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Document being overwritten, or `None` for a first save.
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn content(&self) -> &DocumentContent {
        &self.content
    }

    /// Write the captured content: update when the board already has an id,
    /// create otherwise.
    pub async fn run(self, store: &dyn DocumentStore) -> SaveOutcome {
        let result = match &self.document_id {
            Some(id) => store.update(&self.owner, id, &self.content).await,
            None => store.create(&self.owner, &self.content).await,
        };
        SaveOutcome {
            owner: self.owner,
            requested_id: self.document_id,
            result,
        }
    }
}

/// Result of a [`SaveJob`].
#[derive(Debug)]
pub struct SaveOutcome {
    owner: String,
    requested_id: Option<String>,
    result: StorageResult<StoredDocument>,
}

/// An assistant request captured at dispatch time.
#[derive(Debug, Clone)]
pub struct AssistJob {
    request: AssistRequest,
}

impl AssistJob {
    pub fn request(&self) -> &AssistRequest {
        &self.request
    }

    pub async fn run(self, backend: &dyn AssistBackend) -> AssistOutcome {
        AssistOutcome {
            result: backend.generate(&self.request).await,
        }
    }
}

/// Result of an [`AssistJob`].
#[derive(Debug)]
pub struct AssistOutcome {
    result: AssistResult<String>,
}

/// Everything one user edits: the board plus the editor state around it.
pub struct EditingSession<S: SceneGraph> {
    config: EditorConfig,
    scene: S,
    tools: ToolManager,
    clipboard: Clipboard,
    history: History,
    conversation: Conversation,
    topic: Topic,
    owner: Option<String>,
    document_id: Option<String>,
    panel_visible: bool,
    notices: NoticeQueue,
}

impl<S: SceneGraph> EditingSession<S> {
    /// Start a session on a scene. Whatever the scene holds becomes the
    /// first history checkpoint.
    pub fn new(scene: S, config: EditorConfig) -> Self {
        let history = History::new(
            Checkpoint::new(scene.serialize_to_structure()),
            config.history_capacity,
        );
        let mut session = Self {
            tools: ToolManager::new(&config),
            clipboard: Clipboard::new(config.paste_step),
            history,
            conversation: Conversation::new(),
            topic: Topic::default(),
            owner: None,
            document_id: None,
            panel_visible: false,
            notices: NoticeQueue::default(),
            scene,
            config,
        };
        let state = session.tools.state();
        session.apply_tool_state(state);
        session
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn into_scene(self) -> S {
        self.scene
    }

    pub fn tool_state(&self) -> ToolState {
        self.tools.state()
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_visible
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Take every pending notice, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    // --- Tools ---

    pub fn select_tool(&mut self, mode: ToolMode) -> ToolState {
        let state = self.tools.select(mode);
        log::debug!("Tool switched to {}", mode.name());
        self.apply_tool_state(state);
        state
    }

    pub fn set_pen_color(&mut self, color: SerializableColor) -> ToolState {
        let state = self.tools.set_pen_color(color);
        self.apply_tool_state(state);
        state
    }

    pub fn set_pen_width(&mut self, width: f64) -> ToolState {
        let state = self.tools.set_pen_width(width);
        self.apply_tool_state(state);
        state
    }

    /// Add a placeholder text in the pen color and go back to the cursor.
    pub fn insert_text(&mut self) -> ShapeId {
        let text = self.tools.text_object();
        self.insert_and_select(text)
    }

    /// Add a preset shape outlined with the pen and go back to the cursor.
    pub fn insert_shape(&mut self, preset: ShapePreset) -> ShapeId {
        let shape = self.tools.preset_object(preset);
        self.insert_and_select(shape)
    }

    fn insert_and_select(&mut self, shape: Shape) -> ShapeId {
        let id = self.add_object(shape);
        self.select_tool(ToolMode::Cursor);
        self.scene.set_active_selection(vec![id]);
        id
    }

    fn apply_tool_state(&mut self, state: ToolState) {
        self.scene
            .set_interaction_mode(state.drawing_enabled, state.transform_enabled);
        self.scene.set_brush(state.stroke_color, state.stroke_width);
    }

    // --- Freehand capture ---

    /// Pointer down. Returns false when the active tool does not draw.
    pub fn begin_stroke(&mut self, point: Point) -> bool {
        self.tools.begin_stroke(point)
    }

    /// Pointer move while drawing.
    pub fn extend_stroke(&mut self, point: Point) {
        self.tools.extend_stroke(point);
    }

    /// Pointer up. Commits the stroke as a path object.
    pub fn end_stroke(&mut self) -> Option<ShapeId> {
        let stroke = self.tools.end_stroke()?;
        Some(self.add_object(stroke))
    }

    // --- Scene mutations ---

    /// Add an object on top and record a checkpoint.
    pub fn add_object(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.scene.add_object(shape);
        self.commit();
        id
    }

    /// Replace the active selection. Not a history event.
    pub fn select(&mut self, ids: Vec<ShapeId>) {
        self.scene.set_active_selection(ids);
    }

    pub fn remove_selected(&mut self) -> SessionResult<usize> {
        let selected = self.require_selection()?;
        let removed = selected
            .into_iter()
            .filter(|&id| self.scene.remove_object(id).is_some())
            .count();
        self.commit();
        Ok(removed)
    }

    pub fn transform_selected(&mut self, affine: Affine) -> SessionResult<()> {
        let selected = self.require_selection()?;
        for id in selected {
            if let Some(shape) = self.scene.object_mut(id) {
                shape.transform(affine);
            }
        }
        self.commit();
        Ok(())
    }

    pub fn set_selected_style(&mut self, patch: &StylePatch) -> SessionResult<()> {
        let selected = self.require_selection()?;
        for id in selected {
            if let Some(shape) = self.scene.object_mut(id) {
                patch.apply_to(shape);
            }
        }
        self.commit();
        Ok(())
    }

    pub fn edit_text(&mut self, id: ShapeId, content: impl Into<String>) -> SessionResult<()> {
        let result = match self.scene.object_mut(id).and_then(Shape::as_text_mut) {
            Some(text) => {
                text.set_content(content.into());
                Ok(())
            }
            None => Err(SessionError::NotText(id)),
        };
        self.report(result)?;
        self.commit();
        Ok(())
    }

    /// Remove everything from the board.
    pub fn clear_canvas(&mut self) {
        self.scene.load_from_structure(Vec::new());
        self.apply_background(self.config.background_color);
        self.commit();
    }

    fn apply_background(&mut self, color: SerializableColor) {
        self.scene.set_background(color);
        self.tools.set_background(color);
        // The eraser brush follows the new background.
        let state = self.tools.state();
        self.apply_tool_state(state);
    }

    fn require_selection(&mut self) -> SessionResult<Vec<ShapeId>> {
        let selected = self.scene.active_selection();
        if selected.is_empty() {
            return self.report(Err(SessionError::NothingSelected));
        }
        Ok(selected)
    }

    /// Record the scene as a new checkpoint unless nothing changed.
    fn commit(&mut self) {
        let shapes = self.scene.serialize_to_structure();
        if self
            .history
            .current()
            .is_some_and(|current| current.shapes() == shapes.as_slice())
        {
            return;
        }
        self.history.commit(Checkpoint::new(shapes));
    }

    // --- Clipboard ---

    /// Copy the selection. Returns the number of copied objects.
    pub fn copy(&mut self) -> SessionResult<usize> {
        let result = self.clipboard.copy(&self.scene).map_err(SessionError::from);
        self.report(result)
    }

    /// Paste the clipboard one step further along. Returns the new objects.
    pub fn paste(&mut self) -> SessionResult<Vec<ShapeId>> {
        let result = self
            .clipboard
            .paste(&mut self.scene)
            .map_err(SessionError::from);
        let pasted = self.report(result)?;
        self.commit();
        Ok(pasted)
    }

    // --- History ---

    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(checkpoint) = self.history.undo() else {
            return false;
        };
        self.scene.load_from_structure(checkpoint.shapes().to_vec());
        true
    }

    /// Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(checkpoint) = self.history.redo() else {
            return false;
        };
        self.scene.load_from_structure(checkpoint.shapes().to_vec());
        true
    }

    // --- Documents ---

    /// Open a stored board. A malformed document leaves the session untouched.
    pub fn load_document(&mut self, document: &StoredDocument) -> SessionResult<()> {
        self.load_content(&document.content)?;
        self.document_id = Some(document.id.clone());
        log::info!("Loaded document {}", document.id);
        Ok(())
    }

    /// Replace the board with decoded content, starting a fresh history.
    /// The board is treated as unsaved.
    pub fn load_content(&mut self, content: &DocumentContent) -> SessionResult<()> {
        let decoded = self.report(codec::deserialize(content).map_err(SessionError::from))?;
        self.apply_background(decoded.background);
        self.scene.load_from_structure(decoded.shapes);
        self.history
            .reset(Checkpoint::new(self.scene.serialize_to_structure()));
        self.document_id = None;
        Ok(())
    }

    /// Render the board for download.
    pub fn export_snapshot(&mut self) -> SessionResult<Snapshot> {
        let result = self
            .scene
            .render_snapshot(self.config.snapshot_format)
            .map_err(SessionError::from);
        self.report(result)
    }

    /// Capture the board for saving. Requires a signed-in owner.
    pub fn prepare_save(&mut self) -> SessionResult<SaveJob> {
        let Some(owner) = self.owner.clone() else {
            return self.report(Err(SessionError::NotSignedIn));
        };
        let content = codec::serialize(&self.scene, self.config.snapshot_format)
            .map_err(SessionError::from);
        let content = self.report(content)?;
        Ok(SaveJob {
            owner,
            document_id: self.document_id.clone(),
            content,
        })
    }

    /// Fold a finished save back in. Returns the document id on success.
    pub fn finish_save(&mut self, outcome: SaveOutcome) -> SessionResult<String> {
        let document = self.report(outcome.result.map_err(SessionError::from))?;

        let same_owner = self.owner.as_deref() == Some(outcome.owner.as_str());
        match (self.document_id.clone(), outcome.requested_id) {
            (None, None) if same_owner => {
                self.document_id = Some(document.id.clone());
            }
            (Some(current), None) if current != document.id => {
                // Two first saves raced; the board stays bound to the first.
                log::warn!(
                    "Document {} created while board is already bound to {}",
                    document.id,
                    current
                );
            }
            _ => {}
        }

        log::info!("Saved document {}", document.id);
        self.notices.push(Notice::info("Board saved"));
        Ok(document.id)
    }

    // --- Assistant ---

    /// Capture a hint request. The prompt actually sent, the default one
    /// included, is logged as a user turn right away; the image is the board
    /// as it looks now.
    pub fn prepare_assist(&mut self, text: Option<&str>) -> SessionResult<AssistJob> {
        let snapshot = self.export_snapshot()?;
        let request = build_request(self.topic, self.conversation.turns(), text, &snapshot);

        if let Some(latest) = request.latest() {
            let prompt = latest.text.clone();
            self.conversation.push(ConversationTurn::user(prompt));
        }
        Ok(AssistJob { request })
    }

    /// Fold an assistant reply back in. Failures leave the conversation as is.
    pub fn finish_assist(&mut self, outcome: AssistOutcome) -> SessionResult<()> {
        let reply = self.report(outcome.result.map_err(SessionError::from))?;
        self.conversation.push(ConversationTurn::assistant(reply));
        if !self.panel_visible {
            self.notices.push(Notice::info("The assistant replied"));
        }
        Ok(())
    }

    /// Switch persona for later requests. Earlier turns are kept.
    pub fn set_topic(&mut self, topic: Topic) {
        self.topic = topic;
    }

    pub fn set_panel_visible(&mut self, visible: bool) {
        self.panel_visible = visible;
    }

    // --- Account ---

    pub fn sign_in(&mut self, owner: impl Into<String>) {
        let owner = owner.into();
        log::info!("Signed in as {}", owner);
        self.owner = Some(owner);
    }

    /// Forget the owner. The board is no longer bound to a stored document.
    pub fn sign_out(&mut self) {
        self.owner = None;
        self.document_id = None;
    }

    /// Start over: empty board, history, clipboard and conversation.
    pub fn reset(&mut self) {
        self.scene.load_from_structure(Vec::new());
        self.scene.set_background(self.config.background_color);
        self.history.reset(Checkpoint::default());
        self.clipboard.clear();
        self.conversation.clear();
        self.topic = Topic::default();
        self.document_id = None;
        self.tools = ToolManager::new(&self.config);
        let state = self.tools.state();
        self.apply_tool_state(state);
    }

    /// Log a failure and turn it into a notice.
    fn report<T>(&mut self, result: SessionResult<T>) -> SessionResult<T> {
        if let Err(err) = &result {
            match err.kind() {
                ErrorKind::Precondition => {
                    log::warn!("{}", err);
                    self.notices.push(Notice::warning(err.to_string()));
                }
                ErrorKind::External | ErrorKind::MalformedDocument => {
                    log::error!("{}", err);
                    self.notices.push(Notice::error(err.to_string()));
                }
            }
        }
        result
    }
}
