//! Load and persistence channels.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::scene::PileRecord;
use crate::validation::DocumentSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
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

/// Boxed future for storage operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Payload of a load response.
///
/// Everything besides `Items` is kept as an opaque envelope and handed
/// back unchanged on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneData {
    #[serde(rename = "Items", default)]
    pub items: Vec<PileRecord>,
    #[serde(flatten)]
    pub envelope: Map<String, Value>,
}

impl TryFrom<DocumentSnapshot> for SceneData {
    type Error = StorageError;

    fn try_from(snapshot: DocumentSnapshot) -> StorageResult<Self> {
        let mut envelope = snapshot.envelope;
        let types = serde_json::to_value(&snapshot.types)
            .map_err(|e| StorageError::Serialization(format!("Failed to encode types: {}", e)))?;
        envelope.insert("Types".to_string(), types);
        Ok(Self {
            items: snapshot.items,
            envelope,
        })
    }
}

/// Response of the load channel. `Code == 0` means success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadResponse {
    #[serde(rename = "Code")]
    pub code: i64,
    #[serde(rename = "Message", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "Data", default)]
    pub data: Option<SceneData>,
}

impl LoadResponse {
    pub fn success(data: SceneData) -> Self {
        Self {
            code: 0,
            message: None,
            data: Some(data),
        }
    }

    pub fn failure(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Trait for document storage backends.
///
/// Implementations must be Send + Sync so a host may share one backend
/// between threads; the editor itself never touches storage directly.
pub trait Storage: Send + Sync {
    /// Load the document with the given id.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<LoadResponse>>;

    /// Persist a validated snapshot.
    fn persist(&self, id: &str, document: &DocumentSnapshot) -> BoxFuture<'_, StorageResult<()>>;

    /// Check if a document exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
