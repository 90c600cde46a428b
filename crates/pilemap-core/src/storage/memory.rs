//! In-memory storage implementation.

use super::{BoxFuture, LoadResponse, SceneData, Storage, StorageError, StorageResult};
use crate::validation::DocumentSnapshot;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: RwLock<HashMap<String, SceneData>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, as if the backend already held it.
    pub fn insert(&self, id: &str, data: SceneData) -> StorageResult<()> {
        let mut docs = self
            .documents
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        docs.insert(id.to_string(), data);
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<LoadResponse>> {
        let id = id.to_string();
        Box::pin(async move {
            let docs = self
                .documents
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            docs.get(&id)
                .cloned()
                .map(LoadResponse::success)
                .ok_or(StorageError::NotFound(id))
        })
    }

    fn persist(&self, id: &str, document: &DocumentSnapshot) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let data = SceneData::try_from(document.clone());
        Box::pin(async move {
            let data = data?;
            let mut docs = self
                .documents
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            docs.insert(id, data);
            Ok(())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let docs = self
                .documents
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            Ok(docs.contains_key(&id))
        })
    }
}
