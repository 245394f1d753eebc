//! Media manager: resources in, store calls out
//!
//! [`MediaManager`] turns a finalized [`Resource`] and a replace policy into
//! calls against the configured [`Store`]. Every operation is exactly one
//! store call; failures surface unchanged as [`MediaError::Storage`].
//!
//! # Examples
//!
//! ```rust
//! use acton_media::{MediaConfig, MediaManager, MediaError};
//! use acton_media::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), MediaError> {
//! let manager = MediaManager::new(MediaConfig::default(), Arc::new(MemoryStore::new("media")));
//!
//! let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
//! let resource = manager
//!     .resource_from_raw(png, None)?
//!     .pathname("avatars")
//!     .filename("me")
//!     .finalize()?;
//!
//! let path = manager.save(&resource, false).await?;
//!
//! // A second save without replace is refused
//! assert!(matches!(
//!     manager.save(&resource, false).await,
//!     Err(MediaError::AlreadyExists { .. })
//! ));
//! manager.replace(&resource).await?;
//!
//! manager.rename(&path, "old-me.png").await?;
//! # Ok(())
//! # }
//! ```

use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};
use crate::resource::{Resource, ResourceBuilder};
use crate::storage::{self, Store};
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Splits a path into everything up to the last `/` and the last segment
static SPLIT_LAST_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/?((?:[^/]+/)*)(?:[^/]+)$").expect("rename pattern is a valid regex")
});

/// Media files manager
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct MediaManager {
    config: MediaConfig,
    store: Arc<dyn Store>,
}

impl fmt::Debug for MediaManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaManager")
            .field("path", &self.config.path)
            .field("disk", &self.config.disk)
            .finish_non_exhaustive()
    }
}

impl MediaManager {
    /// Creates a manager over an existing store
    #[must_use]
    pub fn new(config: MediaConfig, store: Arc<dyn Store>) -> Self {
        Self { config, store }
    }

    /// Validates `config` and opens the store bound to its `disk`
    ///
    /// # Errors
    ///
    /// Returns the validation error, `MediaError::UnknownDisk`, or the
    /// storage error raised while opening the disk.
    pub fn from_config(config: MediaConfig) -> MediaResult<Self> {
        config.validate()?;
        let store = storage::open_disk(&config)?;
        tracing::info!(disk = %config.disk, path = %config.path.display(), "Media manager ready");
        Ok(Self::new(config, store))
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// Underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Starts a resource from raw content, see [`ResourceBuilder::from_raw`]
    ///
    /// # Errors
    ///
    /// As [`ResourceBuilder::from_raw`].
    pub fn resource_from_raw(
        &self,
        raw: impl Into<Bytes>,
        default_mimetype: Option<&str>,
    ) -> MediaResult<ResourceBuilder> {
        ResourceBuilder::from_raw(&self.config, raw, default_mimetype)
    }

    /// Starts a resource from base64 text, see [`ResourceBuilder::from_base64`]
    ///
    /// # Errors
    ///
    /// As [`ResourceBuilder::from_base64`].
    pub fn resource_from_base64(
        &self,
        encoded: &str,
        default_mimetype: Option<&str>,
    ) -> MediaResult<ResourceBuilder> {
        ResourceBuilder::from_base64(&self.config, encoded, default_mimetype)
    }

    /// Starts a resource from a data URI, see [`ResourceBuilder::from_data_uri`]
    ///
    /// # Errors
    ///
    /// As [`ResourceBuilder::from_data_uri`].
    pub fn resource_from_data_uri(&self, uri: &str) -> MediaResult<ResourceBuilder> {
        ResourceBuilder::from_data_uri(&self.config, uri)
    }

    /// Starts a resource from an image data URI, see
    /// [`ResourceBuilder::from_image_data_uri`]
    ///
    /// # Errors
    ///
    /// As [`ResourceBuilder::from_image_data_uri`].
    pub fn resource_from_image_data_uri(
        &self,
        uri: &str,
        mimetype: Option<&str>,
    ) -> MediaResult<ResourceBuilder> {
        ResourceBuilder::from_image_data_uri(&self.config, uri, mimetype)
    }

    /// Saves a resource and returns its path
    ///
    /// Without `replace`, the write only happens if nothing is stored at the
    /// resource's path yet (via [`Store::create`]); otherwise the existing
    /// file is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::AlreadyExists` if `replace` is false and the path
    /// is taken, or the store's error.
    #[tracing::instrument(skip(self, resource), fields(path = %resource.path(), size = resource.len()))]
    pub async fn save(&self, resource: &Resource, replace: bool) -> MediaResult<String> {
        let path = resource.path().to_string();

        if replace {
            self.store.save(&path, resource.raw().clone()).await?;
        } else if !self.store.create(&path, resource.raw().clone()).await? {
            tracing::warn!(location = %self.path_for(&path).display(), "Media file already exists");
            return Err(MediaError::AlreadyExists { path });
        }

        tracing::info!(mimetype = resource.mimetype(), "Saved media file");
        Ok(path)
    }

    /// Saves a resource, overwriting whatever is stored at its path
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn replace(&self, resource: &Resource) -> MediaResult<String> {
        self.save(resource, true).await
    }

    /// Deletes every path in `paths`
    ///
    /// Returns `false` if at least one path did not exist.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    #[tracing::instrument(skip(self), fields(count = paths.len()))]
    pub async fn delete(&self, paths: &BTreeSet<String>) -> MediaResult<bool> {
        Ok(self.store.delete(paths).await?)
    }

    /// Deletes a single path
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn delete_one(&self, path: &str) -> MediaResult<bool> {
        self.delete(&BTreeSet::from([path.to_string()])).await
    }

    /// Renames a file within its directory
    ///
    /// `new_filename` replaces the last segment of `old_pathname`, so
    /// renaming `/docs/report.txt` to `final.txt` moves it to
    /// `/docs/final.txt`. An existing file under the new name is left alone.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidPath` if `old_pathname` does not end in a
    /// file segment (empty, trailing `/`, doubled `/`),
    /// `StorageError::TargetExists` if the new name is taken, or the store's
    /// error.
    pub async fn rename(&self, old_pathname: &str, new_filename: &str) -> MediaResult<bool> {
        let new_pathname = renamed_path(old_pathname, new_filename)?;
        self.move_file(old_pathname, &new_pathname).await
    }

    /// Moves a file
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    #[tracing::instrument(skip(self))]
    pub async fn move_file(&self, from: &str, to: &str) -> MediaResult<bool> {
        Ok(self.store.move_file(from, to).await?)
    }

    /// Copies a file
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    #[tracing::instrument(skip(self))]
    pub async fn copy(&self, from: &str, to: &str) -> MediaResult<bool> {
        Ok(self.store.copy(from, to).await?)
    }

    /// Checks whether a file exists
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn exists(&self, path: &str) -> MediaResult<bool> {
        Ok(self.store.exists(path).await?)
    }

    /// Configured media root
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.config.path.clone()
    }

    /// Media root joined with `relative`, trimmed of `/` and `\`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use acton_media::{MediaConfig, MediaManager};
    /// use acton_media::storage::MemoryStore;
    /// use std::path::PathBuf;
    /// use std::sync::Arc;
    ///
    /// let config = MediaConfig {
    ///     path: PathBuf::from("/srv/media"),
    ///     ..MediaConfig::default()
    /// };
    /// let manager = MediaManager::new(config, Arc::new(MemoryStore::new("media")));
    ///
    /// assert_eq!(manager.path_for("/avatars/me.png"), PathBuf::from("/srv/media/avatars/me.png"));
    /// ```
    #[must_use]
    pub fn path_for(&self, relative: &str) -> PathBuf {
        self.config
            .path
            .join(relative.trim_matches(|c| c == '/' || c == '\\'))
    }
}

/// Computes the target of [`MediaManager::rename`]
fn renamed_path(old_pathname: &str, new_filename: &str) -> MediaResult<String> {
    let directory = SPLIT_LAST_SEGMENT
        .captures(old_pathname)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| MediaError::InvalidPath {
            old_pathname: old_pathname.to_string(),
        })?;

    Ok(format!("/{}{new_filename}", directory.as_str()))
}
