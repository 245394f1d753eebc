//! Local filesystem store

use super::traits::Store;
use super::types::{normalize_key, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem store
///
/// Maps keys directly onto files below a root directory, so the key
/// `/avatars/abc.png` lives at `{root}/avatars/abc.png`. Parent directories
/// are created on demand.
///
/// # Directory Structure
///
/// ```text
/// /var/media/
/// ├── avatars/
/// │   ├── x8Hq2LmP0aZk4RtY@2016Dec10T154537.png
/// │   └── final.png
/// └── banner.jpg
/// ```
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
/// // Never overwrites: returns false if the file is already there
/// let created = store.create("/banner.jpg", Bytes::from_static(b"...")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalStore {
    /// Disk name this store is bound to
    disk: String,

    /// Root directory for stored files
    root: PathBuf,
}

impl LocalStore {
    /// Creates a new local store rooted at `root`
    ///
    /// The root does not need to exist yet; it is created by the first write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` if `root` exists but is not a
    /// directory.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use acton_media::storage::LocalStore;
    ///
    /// let store = LocalStore::new("media", "/var/media")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(disk: impl Into<String>, root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();

        // Synchronous check is fine at construction time
        if root.exists() && !root.is_dir() {
            return Err(StorageError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        Ok(Self {
            disk: disk.into(),
            root,
        })
    }

    /// Returns the disk name this store is bound to
    #[must_use]
    pub fn disk(&self) -> &str {
        &self.disk
    }

    /// Returns the root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a store key onto a filesystem path below the root
    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        Ok(self.root.join(normalize_key(path)?))
    }

    /// Ensures the parent directory of `file` exists
    async fn ensure_parent(file: &Path) -> StorageResult<()> {
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_all(mut file: fs::File, content: &[u8]) -> std::io::Result<()> {
        file.write_all(content).await?;
        file.flush().await
    }

    async fn copy_all(mut reader: fs::File, mut writer: fs::File) -> std::io::Result<()> {
        tokio::io::copy(&mut reader, &mut writer).await?;
        writer.flush().await
    }

    /// Opens `file` for writing only if it does not exist yet
    ///
    /// Returns `None` when the file is already there.
    async fn open_new(file: &Path) -> StorageResult<Option<fs::File>> {
        Self::ensure_parent(file).await?;

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(file)
            .await
        {
            Ok(handle) => Ok(Some(handle)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Copies `source` to a target that must not exist yet
    async fn copy_new(source: &Path, target: &Path, to: &str) -> StorageResult<bool> {
        let reader = match fs::File::open(source).await {
            Ok(handle) => handle,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let Some(writer) = Self::open_new(target).await? else {
            return Err(StorageError::TargetExists(to.to_string()));
        };

        if let Err(e) = Self::copy_all(reader, writer).await {
            let _ = fs::remove_file(target).await;
            return Err(e.into());
        }
        Ok(true)
    }
}

#[async_trait]
impl Store for LocalStore {
    #[tracing::instrument(skip(self, content), fields(disk = %self.disk, size = content.len()))]
    async fn save(&self, path: &str, content: Bytes) -> StorageResult<bool> {
        let target = self.resolve(path)?;
        Self::ensure_parent(&target).await?;

        let file = fs::File::create(&target).await?;
        Self::write_all(file, &content).await?;

        tracing::debug!(target = %target.display(), "Wrote media file");
        Ok(true)
    }

    #[tracing::instrument(skip(self, content), fields(disk = %self.disk, size = content.len()))]
    async fn create(&self, path: &str, content: Bytes) -> StorageResult<bool> {
        let target = self.resolve(path)?;

        let Some(file) = Self::open_new(&target).await? else {
            tracing::debug!(target = %target.display(), "Refusing to overwrite existing file");
            return Ok(false);
        };

        if let Err(e) = Self::write_all(file, &content).await {
            // Don't leave a truncated file claiming the key
            let _ = fs::remove_file(&target).await;
            return Err(e.into());
        }

        tracing::debug!(target = %target.display(), "Created media file");
        Ok(true)
    }

    #[tracing::instrument(skip(self), fields(disk = %self.disk, count = paths.len()))]
    async fn delete(&self, paths: &BTreeSet<String>) -> StorageResult<bool> {
        let targets = paths
            .iter()
            .map(|path| self.resolve(path).map(|target| (path, target)))
            .collect::<StorageResult<Vec<_>>>()?;

        let mut all_removed = true;
        for (path, target) in targets {
            match fs::remove_file(&target).await {
                Ok(()) => tracing::debug!(target = %target.display(), "Deleted media file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::warn!(%path, "Cannot delete missing media file");
                    all_removed = false;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(all_removed)
    }

    #[tracing::instrument(skip(self), fields(disk = %self.disk))]
    async fn move_file(&self, from: &str, to: &str) -> StorageResult<bool> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;

        if !fs::try_exists(&source).await? {
            return Ok(false);
        }

        Self::ensure_parent(&target).await?;

        // A hard link fails instead of replacing an existing target
        match fs::hard_link(&source, &target).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::TargetExists(to.to_string()));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) if e.kind() == ErrorKind::Unsupported => {
                if !Self::copy_new(&source, &target, to).await? {
                    return Ok(false);
                }
            }
            Err(e) => return Err(e.into()),
        }

        fs::remove_file(&source).await?;
        Ok(true)
    }

    #[tracing::instrument(skip(self), fields(disk = %self.disk))]
    async fn copy(&self, from: &str, to: &str) -> StorageResult<bool> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;

        Self::copy_new(&source, &target, to).await
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let target = self.resolve(path)?;
        Ok(fs::try_exists(&target).await?)
    }
}
