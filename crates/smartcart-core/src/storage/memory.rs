//! In-process storage backend.

use std::collections::HashMap;
use std::sync::Mutex;

use super::Persistence;
use crate::error::StorageError;
use crate::model::AppData;

/// Keeps documents as JSON text in memory, so loads see exactly what a
/// disk-backed store would.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    docs: Mutex<HashMap<String, String>>,
    saves: Mutex<usize>,
    read_only: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every save fails.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// Seed a document under `key`.
    pub fn with_document(self, key: &str, data: &AppData) -> Result<Self, StorageError> {
        let raw = encode(key, data)?;
        self.lock_docs().insert(key.to_string(), raw);
        Ok(self)
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Raw stored JSON under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock_docs().get(key).cloned()
    }

    fn lock_docs(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.docs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn encode(key: &str, data: &AppData) -> Result<String, StorageError> {
    serde_json::to_string(data).map_err(|source| StorageError::Corrupt {
        key: key.to_string(),
        source,
    })
}

impl Persistence for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<AppData>, StorageError> {
        let Some(raw) = self.raw(key) else {
            return Ok(None);
        };
        let data = serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(data))
    }

    fn save(&self, key: &str, data: &AppData) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::WriteRejected(format!(
                "memory storage is read-only (key '{key}')"
            )));
        }
        let raw = encode(key, data)?;
        self.lock_docs().insert(key.to_string(), raw);
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
