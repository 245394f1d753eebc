//! Error types and error handling

use crate::storage::StorageError;
use thiserror::Error;

/// Media manager error type
#[derive(Debug, Error)]
pub enum MediaError {
    /// `save` without replace hit an existing file
    #[error("The file [{path}] already exists. If you want to overwrite it, use replace() instead")]
    AlreadyExists {
        /// Storage key that is already taken
        path: String,
    },

    /// Neither content sniffing nor the caller supplied a mimetype
    #[error("The mimetype of the loaded resource could not be detected")]
    UnknownMimetype,

    /// The mimetype is not in the configured table
    #[error("The mimetype of the loaded media resource [{mimetype}] is not supported")]
    UnsupportedMimetype {
        /// Rejected mimetype
        mimetype: String,
    },

    /// `rename` could not split the old path into directory and filename
    #[error("The location of the file to be renamed [{old_pathname}] is not valid")]
    InvalidPath {
        /// Path given to `rename`
        old_pathname: String,
    },

    /// Malformed `data:` URI
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// Base64 payload could not be decoded
    #[error("Invalid base64 content: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Content is not a decodable image
    #[error("The given content is not a valid image: {0}")]
    InvalidImage(String),

    /// Filename suffix pattern cannot be formatted
    #[error("Invalid filename suffix pattern: {0}")]
    InvalidSuffix(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configured disk has no settings
    #[error("Disk [{0}] is not configured")]
    UnknownDisk(String),

    /// Store failure, passed through unchanged
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;
