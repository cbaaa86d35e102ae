//! Inkwise Core Library
//!
//! Platform-agnostic editing-session engine for the Inkwise whiteboard:
//! shapes, scene graph, tools, clipboard, history, document codec, storage
//! and the AI hint pipeline.

pub mod assist;
pub mod canvas;
pub mod clipboard;
pub mod codec;
pub mod config;
pub mod history;
pub mod notice;
pub mod scene;
pub mod session;
pub mod shapes;
pub mod storage;
pub mod tools;

pub use assist::{
    AssistBackend, AssistError, AssistRequest, Conversation, ConversationTurn, GeminiBackend,
    Sender, Topic,
};
pub use canvas::Canvas;
pub use clipboard::{Clipboard, ClipboardError};
pub use codec::{CodecError, DecodedDocument, DocumentContent, ObjectRecord};
pub use config::{AssistConfig, ConfigError, EditorConfig};
pub use history::{Checkpoint, History};
pub use notice::{Notice, NoticeLevel};
pub use scene::{RasterScene, Rasterizer, SceneError, SceneGraph, Snapshot, SnapshotFormat};
pub use session::{
    AssistJob, EditingSession, ErrorKind, SaveJob, SessionError, SessionResult, StylePatch,
};
pub use storage::{
    DocumentStore, FileDocumentStore, MemoryDocumentStore, StorageError, StoredDocument,
};
pub use tools::{ShapePreset, ToolManager, ToolMode, ToolState};
