//! File-based storage implementation.

use super::{
    BoxFuture, DocumentStore, StorageError, StorageResult, StoredDocument, now_millis, sort_listing,
};
use crate::codec::DocumentContent;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File-based document store.
///
/// Each owner gets a directory under the base path; each document is one
/// JSON file in it. Files are written to a temporary sibling and renamed into
/// place, so readers never observe a partially written document.
#[derive(Debug)]
pub struct FileDocumentStore {
    /// Base directory for document storage.
    base_path: PathBuf,
}

impl FileDocumentStore {
    /// Create a new file store with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a file store in the default location.
    ///
    /// On Linux: `~/.local/share/inkwise/documents/`
    /// On Windows: `%LOCALAPPDATA%\inkwise\documents\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("inkwise").join("documents"))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn owner_dir(&self, owner: &str) -> PathBuf {
        self.base_path.join(sanitize(owner))
    }

    /// Get the file path for a document ID.
    fn document_path(&self, owner: &str, id: &str) -> PathBuf {
        self.owner_dir(owner).join(format!("{}.json", sanitize(id)))
    }

    fn read_document(path: &Path, id: &str) -> StorageResult<StoredDocument> {
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let json = fs::read_to_string(path)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&json).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn write_document(&self, document: &StoredDocument) -> StorageResult<()> {
        let dir = self.owner_dir(&document.owner);
        fs::create_dir_all(&dir)
            .map_err(|e| StorageError::Io(format!("Failed to create {}: {}", dir.display(), e)))?;

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let path = self.document_path(&document.owner, &document.id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path).map_err(|e| {
            // Leave no stray temp file behind on failure
            let _ = fs::remove_file(&tmp);
            StorageError::Io(format!("Failed to replace {}: {}", path.display(), e))
        })
    }
}

/// Make an identifier safe to use as a file name.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl DocumentStore for FileDocumentStore {
    fn create(
        &self,
        owner: &str,
        content: &DocumentContent,
    ) -> BoxFuture<'_, StorageResult<StoredDocument>> {
        let now = now_millis();
        let document = StoredDocument {
            id: Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            content: content.clone(),
            created_at: now,
            updated_at: now,
        };
        Box::pin(async move {
            self.write_document(&document)?;
            Ok(document)
        })
    }

    fn update(
        &self,
        owner: &str,
        id: &str,
        content: &DocumentContent,
    ) -> BoxFuture<'_, StorageResult<StoredDocument>> {
        let path = self.document_path(owner, id);
        let owner = owner.to_string();
        let id = id.to_string();
        let content = content.clone();
        Box::pin(async move {
            let mut document = Self::read_document(&path, &id)?;
            if document.owner != owner || document.id != id {
                return Err(StorageError::NotFound(id));
            }
            document.content = content;
            document.updated_at = now_millis().max(document.created_at);
            self.write_document(&document)?;
            Ok(document)
        })
    }

    fn load(&self, owner: &str, id: &str) -> BoxFuture<'_, StorageResult<StoredDocument>> {
        let path = self.document_path(owner, id);
        let owner = owner.to_string();
        let id = id.to_string();
        Box::pin(async move {
            let document = Self::read_document(&path, &id)?;
            if document.owner != owner || document.id != id {
                return Err(StorageError::NotFound(id));
            }
            Ok(document)
        })
    }

    fn list(&self, owner: &str) -> BoxFuture<'_, StorageResult<Vec<StoredDocument>>> {
        let dir = self.owner_dir(owner);
        let owner = owner.to_string();
        Box::pin(async move {
            if !dir.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&dir)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut documents = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                // Only include .json files (skips in-flight temp files)
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    match Self::read_document(&path, "") {
                        Ok(doc) if doc.owner == owner => documents.push(doc),
                        Ok(_) => {}
                        Err(e) => {
                            log::warn!("Skipping unreadable document {}: {}", path.display(), e)
                        }
                    }
                }
            }
            sort_listing(&mut documents);
            Ok(documents)
        })
    }

    fn delete(&self, owner: &str, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(owner, id);
        let id = id.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id));
            }
            fs::remove_file(&path).map_err(|e| {
                StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
            })
        })
    }
}
