//! Storage abstraction for persisted boards.

mod file;
mod memory;

pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;

use crate::codec::DocumentContent;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A board as held by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Store-assigned identifier.
    pub id: String,
    /// Account the document belongs to.
    pub owner: String,
    pub content: DocumentContent,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Milliseconds since the Unix epoch.
    pub updated_at: u64,
}

/// Trait for document storage backends.
///
/// Every operation is scoped to an owner: documents of other owners behave
/// exactly like missing ones. Writes replace a document as a whole.
pub trait DocumentStore: Send + Sync {
    /// Store a new document and assign its id.
    fn create(
        &self,
        owner: &str,
        content: &DocumentContent,
    ) -> BoxFuture<'_, StorageResult<StoredDocument>>;

    /// Replace the content of an existing document.
    fn update(
        &self,
        owner: &str,
        id: &str,
        content: &DocumentContent,
    ) -> BoxFuture<'_, StorageResult<StoredDocument>>;

    /// Load a document.
    fn load(&self, owner: &str, id: &str) -> BoxFuture<'_, StorageResult<StoredDocument>>;

    /// List the owner's documents, most recently updated first.
    fn list(&self, owner: &str) -> BoxFuture<'_, StorageResult<Vec<StoredDocument>>>;

    /// Delete a document.
    fn delete(&self, owner: &str, id: &str) -> BoxFuture<'_, StorageResult<()>>;
}

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Newest first, ties broken by id so listings are stable.
pub(crate) fn sort_listing(documents: &mut [StoredDocument]) {
    documents.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
