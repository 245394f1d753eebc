//! Media store trait definition

use super::types::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeSet;

/// Persistence capability used by [`MediaManager`](crate::MediaManager)
///
/// A store maps string keys (such as `/avatars/abc.png`) onto some backend:
/// a local directory, an object store bucket, or memory. Keys are relative to
/// the store's own root; a leading `/` carries no meaning.
///
/// Every method is a single backend call. Stores are shared between
/// concurrent callers through `Arc<dyn Store>`, so implementations must be
/// safe for concurrent use.
///
/// # Examples
///
/// ```rust,no_run
/// use acton_media::storage::{LocalStore, Store};
/// use bytes::Bytes;
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = LocalStore::new("media", "/var/media")?;
///
/// store.save("/avatars/me.png", Bytes::from_static(b"...")).await?;
/// assert!(store.exists("/avatars/me.png").await?);
///
/// store.move_file("/avatars/me.png", "/avatars/old.png").await?;
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Writes `content` to `path`, overwriting any existing entry
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the backend write fails.
    async fn save(&self, path: &str, content: Bytes) -> StorageResult<bool>;

    /// Writes `content` to `path` only if nothing is stored there yet
    ///
    /// Returns `Ok(false)` without writing when the entry already exists.
    ///
    /// The provided implementation checks [`exists`](Store::exists) and then
    /// calls [`save`](Store::save); a concurrent writer may slip in between
    /// the two calls. Backends with an atomic create primitive override it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the backend write fails.
    async fn create(&self, path: &str, content: Bytes) -> StorageResult<bool> {
        if self.exists(path).await? {
            return Ok(false);
        }
        self.save(path, content).await
    }

    /// Deletes every entry in `paths`
    ///
    /// Returns `Ok(false)` if at least one entry did not exist; the remaining
    /// entries are still removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is invalid or the backend delete fails.
    async fn delete(&self, paths: &BTreeSet<String>) -> StorageResult<bool>;

    /// Moves the entry at `from` to `to`
    ///
    /// Returns `Ok(false)` if `from` does not exist. An existing entry at
    /// `to` is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TargetExists` if `to` is taken, or an error if
    /// a key is invalid or the backend move fails.
    async fn move_file(&self, from: &str, to: &str) -> StorageResult<bool>;

    /// Copies the entry at `from` to `to`
    ///
    /// Returns `Ok(false)` if `from` does not exist. An existing entry at
    /// `to` is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TargetExists` if `to` is taken, or an error if
    /// a key is invalid or the backend copy fails.
    async fn copy(&self, from: &str, to: &str) -> StorageResult<bool>;

    /// Checks whether an entry exists at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the backend is unavailable.
    async fn exists(&self, path: &str) -> StorageResult<bool>;
}
