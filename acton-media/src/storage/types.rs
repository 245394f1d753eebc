//! Core types for media stores

use thiserror::Error;

/// Errors reported by a [`Store`](super::Store) backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Move or copy target is already taken
    #[error("Target already exists: {0}")]
    TargetExists(String),

    /// I/O error during a store operation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key cannot be mapped onto the backend
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Generic backend error
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Normalizes a store key into its relative form
///
/// Leading and trailing slashes are ignored, so `/docs/a.png` and
/// `docs/a.png` name the same entry. Keys that are empty, or that contain
/// `.`/`..` segments or empty segments, are rejected.
///
/// # Errors
///
/// Returns `StorageError::InvalidPath` for keys that cannot address a file.
///
/// # Examples
///
/// ```rust
/// use acton_media::storage::normalize_key;
///
/// assert_eq!(normalize_key("/docs/a.png").unwrap(), "docs/a.png");
/// assert!(normalize_key("/docs/../etc/passwd").is_err());
/// ```
pub fn normalize_key(path: &str) -> StorageResult<String> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(StorageError::InvalidPath(format!("{path:?} does not name a file")));
    }

    let has_bad_segment = trimmed
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if has_bad_segment || trimmed.contains('\\') || trimmed.contains('\0') {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    Ok(trimmed.to_string())
}
