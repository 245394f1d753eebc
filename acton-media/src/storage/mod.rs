//! Media store abstraction and implementations
//!
//! The [`Store`] trait is the only persistence seam of the crate. Two
//! backends ship with it:
//! - [`LocalStore`]: files below a local directory
//! - [`MemoryStore`]: an in-process map, for tests and scratch disks
//!
//! Which backend a [`MediaManager`](crate::MediaManager) talks to is chosen
//! by the configured `disk` (see [`open_disk`]).
//!
//! # Examples
//!
//! ```rust,no_run
//! use acton_media::config::MediaConfig;
//! use acton_media::storage;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = MediaConfig::default();
//! let store = storage::open_disk(&config)?;
//! # Ok(())
//! # }
//! ```

mod local;
mod memory;
mod traits;
mod types;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use traits::Store;
#[cfg(test)]
pub use traits::MockStore;
pub use types::{normalize_key, StorageError, StorageResult};

use crate::config::{DiskSettings, MediaConfig};
use crate::error::{MediaError, MediaResult};
use std::sync::Arc;

/// Opens the store bound to the configured `disk`
///
/// # Errors
///
/// Returns `MediaError::UnknownDisk` if `config.disk` has no entry in
/// `config.disks`, or a storage error if the backend cannot be opened.
pub fn open_disk(config: &MediaConfig) -> MediaResult<Arc<dyn Store>> {
    let settings = config
        .disks
        .get(&config.disk)
        .ok_or_else(|| MediaError::UnknownDisk(config.disk.clone()))?;

    let store: Arc<dyn Store> = match settings {
        DiskSettings::Local { root } => {
            let root = root.clone().unwrap_or_else(|| config.path.clone());
            Arc::new(LocalStore::new(config.disk.clone(), root)?)
        }
        DiskSettings::Memory => Arc::new(MemoryStore::new(config.disk.clone())),
    };

    tracing::debug!(disk = %config.disk, driver = settings.driver(), "Opened media disk");
    Ok(store)
}
