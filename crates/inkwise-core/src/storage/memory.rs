//! In-memory storage implementation.

use super::{
    BoxFuture, DocumentStore, StorageError, StorageResult, StoredDocument, now_millis, sort_listing,
};
use crate::codec::DocumentContent;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// In-memory storage for testing and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, StoredDocument>>,
}

impl MemoryDocumentStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents across all owners.
    pub fn len(&self) -> usize {
        self.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, HashMap<String, StoredDocument>>> {
        self.documents
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, HashMap<String, StoredDocument>>> {
        self.documents
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn create(
        &self,
        owner: &str,
        content: &DocumentContent,
    ) -> BoxFuture<'_, StorageResult<StoredDocument>> {
        let owner = owner.to_string();
        let content = content.clone();
        Box::pin(async move {
            let now = now_millis();
            let document = StoredDocument {
                id: Uuid::new_v4().to_string(),
                owner,
                content,
                created_at: now,
                updated_at: now,
            };
            self.write()?.insert(document.id.clone(), document.clone());
            Ok(document)
        })
    }

    fn update(
        &self,
        owner: &str,
        id: &str,
        content: &DocumentContent,
    ) -> BoxFuture<'_, StorageResult<StoredDocument>> {
        let owner = owner.to_string();
        let id = id.to_string();
        let content = content.clone();
        Box::pin(async move {
            let mut docs = self.write()?;
            let document = docs
                .get_mut(&id)
                .filter(|doc| doc.owner == owner)
                .ok_or_else(|| StorageError::NotFound(id.clone()))?;
            document.content = content;
            document.updated_at = now_millis().max(document.created_at);
            Ok(document.clone())
        })
    }

    fn load(&self, owner: &str, id: &str) -> BoxFuture<'_, StorageResult<StoredDocument>> {
        let owner = owner.to_string();
        let id = id.to_string();
        Box::pin(async move {
            self.read()?
                .get(&id)
                .filter(|doc| doc.owner == owner)
                .cloned()
                .ok_or(StorageError::NotFound(id))
        })
    }

    fn list(&self, owner: &str) -> BoxFuture<'_, StorageResult<Vec<StoredDocument>>> {
        let owner = owner.to_string();
        Box::pin(async move {
            let mut documents: Vec<_> = self
                .read()?
                .values()
                .filter(|doc| doc.owner == owner)
                .cloned()
                .collect();
            sort_listing(&mut documents);
            Ok(documents)
        })
    }

    fn delete(&self, owner: &str, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let owner = owner.to_string();
        let id = id.to_string();
        Box::pin(async move {
            let mut docs = self.write()?;
            match docs.get(&id) {
                Some(doc) if doc.owner == owner => {
                    docs.remove(&id);
                    Ok(())
                }
                _ => Err(StorageError::NotFound(id)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::{block_on, content};

    #[test]
    fn test_create_and_load() {
        let store = MemoryDocumentStore::new();
        let created = block_on(store.create("alice", &content("#ffffff"))).unwrap();

        assert_eq!(created.owner, "alice");
        assert_eq!(created.created_at, created.updated_at);
        let loaded = block_on(store.load("alice", &created.id)).unwrap();
        assert_eq!(loaded, created);
    }

    #[test]
    fn test_not_found() {
        let store = MemoryDocumentStore::new();
        let result = block_on(store.load("alice", "nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_update_keeps_id() {
        let store = MemoryDocumentStore::new();
        let created = block_on(store.create("alice", &content("#ffffff"))).unwrap();
        let updated = block_on(store.update("alice", &created.id, &content("#000000"))).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.content.background, "#000000");
        assert!(updated.updated_at >= created.created_at);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_missing_fails() {
        let store = MemoryDocumentStore::new();
        let result = block_on(store.update("alice", "ghost", &content("#ffffff")));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_owner_scoping() {
        let store = MemoryDocumentStore::new();
        let created = block_on(store.create("alice", &content("#ffffff"))).unwrap();

        assert!(matches!(
            block_on(store.load("bob", &created.id)),
            Err(StorageError::NotFound(_))
        ));
        assert!(
            block_on(store.update("bob", &created.id, &content("#000000"))).is_err()
        );
        assert!(block_on(store.delete("bob", &created.id)).is_err());
        assert!(block_on(store.list("bob")).unwrap().is_empty());

        // Still intact for the owner
        let loaded = block_on(store.load("alice", &created.id)).unwrap();
        assert_eq!(loaded.content.background, "#ffffff");
    }

    #[test]
    fn test_delete() {
        let store = MemoryDocumentStore::new();
        let created = block_on(store.create("alice", &content("#ffffff"))).unwrap();
        block_on(store.delete("alice", &created.id)).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_list() {
        let store = MemoryDocumentStore::new();
        block_on(store.create("alice", &content("#ffffff"))).unwrap();
        block_on(store.create("alice", &content("#000000"))).unwrap();
        block_on(store.create("bob", &content("#000000"))).unwrap();

        let list = block_on(store.list("alice")).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|doc| doc.owner == "alice"));
    }
}
