//! File-based storage: one JSON load response per document.

use super::{BoxFuture, LoadResponse, SceneData, Storage, StorageError, StorageResult};
use crate::validation::DocumentSnapshot;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores documents as JSON files in a directory.
///
/// Each file holds a complete load response (`{Code, Data}`), so a
/// persisted document can be loaded back as-is.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(|e| StorageError::Io(format!("Failed to create storage directory: {}", e)))?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/pilemap/documents/`
    /// On Windows: `%LOCALAPPDATA%\pilemap\documents\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("pilemap").join("documents"))
    }

    fn document_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<LoadResponse>> {
        let path = self.document_path(id);
        let id_owned = id.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id_owned));
            }

            let json = fs::read_to_string(&path)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

            LoadResponse::from_json(&json).map_err(|e| {
                StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
            })
        })
    }

    fn persist(&self, id: &str, document: &DocumentSnapshot) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(id);
        let json = SceneData::try_from(document.clone()).and_then(|data| {
            LoadResponse::success(data)
                .to_json()
                .map_err(|e| StorageError::Serialization(e.to_string()))
        });
        let json = match json {
            Ok(j) => j,
            Err(e) => return Box::pin(async move { Err(e) }),
        };

        Box::pin(async move {
            fs::write(&path, json)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
            log::info!("Persisted document to {}", path.display());
            Ok(())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.document_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::CategoryTable;
    use pollster::block_on;
    use serde_json::Map;
    use tempfile::tempdir;

    #[test]
    fn test_persist_then_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let snapshot = DocumentSnapshot::new(&Map::new(), Vec::new(), &CategoryTable::parse("a,Bored,2"));

        block_on(storage.persist("site/7", &snapshot)).unwrap();
        assert!(dir.path().join("site_7.json").exists());

        let response = block_on(storage.load("site/7")).unwrap();
        assert!(response.is_success());
        assert_eq!(response.data.unwrap().envelope["Types"][0]["Total"], 2);
    }

    #[test]
    fn test_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(!block_on(storage.exists("nonexistent")).unwrap());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        fs::write(dir.path().join("bad.json"), "not json").unwrap();

        let result = block_on(storage.load("bad"));
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}
