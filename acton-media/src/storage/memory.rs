//! In-memory store

use super::traits::Store;
use super::types::{normalize_key, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// In-memory store
///
/// Keeps every entry in a shared map. Useful for tests and for disks whose
/// content does not need to outlive the process. Clones share the same map.
///
/// # Examples
///
/// ```rust
/// use acton_media::storage::{MemoryStore, Store};
/// use bytes::Bytes;
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = MemoryStore::new("scratch");
/// store.save("/a.png", Bytes::from_static(b"png")).await?;
/// assert_eq!(store.get("/a.png").as_deref(), Some(&b"png"[..]));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    disk: String,
    entries: Arc<RwLock<BTreeMap<String, Bytes>>>,
}

impl MemoryStore {
    /// Creates an empty store bound to `disk`
    #[must_use]
    pub fn new(disk: impl Into<String>) -> Self {
        Self {
            disk: disk.into(),
            entries: Arc::default(),
        }
    }

    /// Returns the disk name this store is bound to
    #[must_use]
    pub fn disk(&self) -> &str {
        &self.disk
    }

    /// Returns the content stored at `path`, if any
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Bytes> {
        let key = normalize_key(path).ok()?;
        self.entries.read().get(&key).cloned()
    }

    /// Returns every stored key, in order
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn save(&self, path: &str, content: Bytes) -> StorageResult<bool> {
        let key = normalize_key(path)?;
        self.entries.write().insert(key, content);
        Ok(true)
    }

    async fn create(&self, path: &str, content: Bytes) -> StorageResult<bool> {
        let key = normalize_key(path)?;
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return Ok(false);
        }
        entries.insert(key, content);
        Ok(true)
    }

    async fn delete(&self, paths: &BTreeSet<String>) -> StorageResult<bool> {
        let keys = paths
            .iter()
            .map(|path| normalize_key(path))
            .collect::<StorageResult<Vec<_>>>()?;

        let mut entries = self.entries.write();
        let mut all_removed = true;
        for key in keys {
            all_removed &= entries.remove(&key).is_some();
        }
        Ok(all_removed)
    }

    async fn move_file(&self, from: &str, to: &str) -> StorageResult<bool> {
        let (from, to) = (normalize_key(from)?, normalize_key(to)?);
        let mut entries = self.entries.write();
        if !entries.contains_key(&from) {
            return Ok(false);
        }
        if entries.contains_key(&to) {
            return Err(StorageError::TargetExists(to));
        }
        if let Some(content) = entries.remove(&from) {
            entries.insert(to, content);
        }
        Ok(true)
    }

    async fn copy(&self, from: &str, to: &str) -> StorageResult<bool> {
        let (from, to) = (normalize_key(from)?, normalize_key(to)?);
        let mut entries = self.entries.write();
        let Some(content) = entries.get(&from).cloned() else {
            return Ok(false);
        };
        if entries.contains_key(&to) {
            return Err(StorageError::TargetExists(to));
        }
        entries.insert(to, content);
        Ok(true)
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let key = normalize_key(path)?;
        Ok(self.entries.read().contains_key(&key))
    }
}
