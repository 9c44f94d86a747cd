//! Key-value storage areas backing the persisted envelope.
//!
//! The extension storage API is modeled as a small trait so the sync core
//! can run against the in-memory area in tests and the JSON-file area in
//! durable demo runs. Change notifications are delivered by the embedding
//! layer (they fire on other contexts, not the writer), so the trait only
//! covers reads and writes.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

use crate::types::errors::StorageError;

/// Trait defining the storage area interface.
pub trait StorageArea: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Volatile storage area for tests and demos.
#[derive(Default)]
pub struct MemoryStorageArea {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStorageArea {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageArea for MemoryStorageArea {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Storage area persisting all keys as one JSON object file on disk.
pub struct FileStorageArea {
    path: PathBuf,
}

impl FileStorageArea {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, Value>, StorageError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| StorageError::ReadFailed(format!("failed to read store file: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| StorageError::Serialization(format!("failed to parse store file: {}", e)))
    }

    fn save(&self, entries: &HashMap<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::WriteFailed(format!("failed to create store directory: {}", e))
            })?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|e| StorageError::WriteFailed(format!("failed to write store file: {}", e)))
    }
}

impl StorageArea for FileStorageArea {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut entries = self.load().unwrap_or_default();
        entries.insert(key.to_string(), value);
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.load().unwrap_or_default();
        entries.remove(key);
        self.save(&entries)
    }
}
