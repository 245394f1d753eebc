//! acton-media: media file management for acton-htmx applications
//!
//! Content arrives as raw bytes, base64 text or `data:` URIs. It is sniffed,
//! checked against a table of supported mimetypes, given a unique name and
//! written to a storage disk.
//!
//! - [`resource`]: builds immutable [`Resource`] values from uploaded content
//! - [`manager`]: saves, deletes, renames, moves and copies resources
//! - [`storage`]: the [`Store`] trait plus local disk and in-memory backends
//! - [`config`]: layered configuration via figment
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use acton_media::{observability, MediaConfig, MediaManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     observability::init()?;
//!
//!     let config = MediaConfig::load_for_service("my-app")?;
//!     let manager = MediaManager::from_config(config)?;
//!
//!     let upload = std::fs::read_to_string("avatar.b64")?;
//!     let resource = manager
//!         .resource_from_base64(&upload, None)?
//!         .pathname("avatars")
//!         .finalize()?;
//!
//!     let path = manager.save(&resource, false).await?;
//!     tracing::info!(%path, "Avatar uploaded");
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod manager;
pub mod observability;
pub mod resource;
pub mod storage;

pub use config::{DiskSettings, MediaConfig};
pub use error::{MediaError, MediaResult};
pub use manager::MediaManager;
pub use resource::{Resource, ResourceBuilder};
pub use storage::{LocalStore, MemoryStore, StorageError, StorageResult, Store};

/// Commonly used types
pub mod prelude {
    pub use crate::config::MediaConfig;
    pub use crate::error::{MediaError, MediaResult};
    pub use crate::manager::MediaManager;
    pub use crate::resource::{Resource, ResourceBuilder};
    pub use crate::storage::Store;
}
