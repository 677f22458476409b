//! Durable report hand-off store
//!
//! The expanded report surface loads independently of the engine and reads
//! exactly one key written by the relay. Each `openReport` overwrites the
//! previous payload; no history is retained.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Well-known key the report payload is persisted under
pub const REPORT_KEY: &str = "phishguard_report_data";

/// Store failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    /// Corrupt or non-object store content
    #[error("store payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Key-value hand-off seam between the engine and the report surface
#[async_trait]
pub trait ReportStore: Send + Sync + std::fmt::Debug {
    /// Write (or overwrite) a value under a key
    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Read a value by key
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
}

/// JSON-file-backed store
///
/// The whole store is one JSON object on disk; small enough that rewriting
/// it per put keeps the format trivially inspectable.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by the given file path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, Value>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ReportStore for JsonFileStore {
    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);
        let bytes = serde_json::to_vec_pretty(&entries)?;
        tokio::fs::write(&self.path, bytes).await?;
        tracing::debug!(key, path = %self.path.display(), "persisted store entry");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.load().await?.get(key).cloned())
    }
}

/// In-memory store for tests and the simulation driver
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_store_overwrites() {
        let store = MemoryStore::new();
        store.put(REPORT_KEY, json!({"risk_score": 10.0})).await.unwrap();
        store.put(REPORT_KEY, json!({"risk_score": 90.0})).await.unwrap();

        let value = store.get(REPORT_KEY).await.unwrap().unwrap();
        assert_eq!(value["risk_score"], 90.0);
    }

    #[tokio::test]
    async fn memory_store_missing_key() {
        let store = MemoryStore::new();
        assert!(store.get(REPORT_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));

        store
            .put(REPORT_KEY, json!({"classification": "🔴 Phishing"}))
            .await
            .unwrap();

        let value = store.get(REPORT_KEY).await.unwrap().unwrap();
        assert_eq!(value["classification"], "🔴 Phishing");
    }

    #[tokio::test]
    async fn file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.get(REPORT_KEY).await.unwrap().is_none());
    }
}
