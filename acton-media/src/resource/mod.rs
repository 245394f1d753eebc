//! Media resources: content plus derived mimetype, filename and path
//!
//! A resource is built in two phases. A [`ResourceBuilder`] is created from
//! content in one of several encodings; the mimetype is detected and checked
//! against the configured table right away. Filename, extension and pathname
//! may then be set. [`ResourceBuilder::finalize`] fixes everything into an
//! immutable [`Resource`], generating a random base name if none was set and
//! appending the configured timestamp suffix.
//!
//! # Examples
//!
//! ```rust
//! use acton_media::config::MediaConfig;
//! use acton_media::resource::ResourceBuilder;
//!
//! # fn example() -> Result<(), acton_media::MediaError> {
//! let config = MediaConfig {
//!     suffix: None,
//!     ..MediaConfig::default()
//! };
//!
//! let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
//! let resource = ResourceBuilder::from_raw(&config, png, None)?
//!     .pathname("avatars/")
//!     .filename("me")
//!     .finalize()?;
//!
//! assert_eq!(resource.mimetype(), "image/png");
//! assert_eq!(resource.path(), "/avatars/me.png");
//! # Ok(())
//! # }
//! ```

mod data_uri;
mod transcode;
mod validation;

pub use data_uri::{decode_base64, DataUri};
pub use transcode::{transcode, OutputFormat, TranscodedImage};
pub use validation::MimeValidator;

use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};
use bytes::Bytes;
use chrono::{DateTime, Local};
use rand::{distributions::Alphanumeric, Rng};
use std::fmt::Write as _;

/// Length of generated base names
pub const RANDOM_NAME_LEN: usize = 16;

/// Mutable phase of a [`Resource`]
///
/// Holds validated content and mimetype while filename, extension and
/// pathname are still open.
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    raw: Bytes,
    mimetype: String,
    default_extension: String,
    filename: Option<String>,
    extension: Option<String>,
    pathname: Option<String>,
    suffix: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl ResourceBuilder {
    /// Builds from raw content
    ///
    /// The mimetype is detected from the content; `default_mimetype` is used
    /// only when detection fails.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UnknownMimetype` if no mimetype can be determined
    /// and `MediaError::UnsupportedMimetype` if it is not in
    /// `config.mimetypes`.
    pub fn from_raw(
        config: &MediaConfig,
        raw: impl Into<Bytes>,
        default_mimetype: Option<&str>,
    ) -> MediaResult<Self> {
        let raw = raw.into();
        let mimetype = MimeValidator::new().resolve(config, &raw, default_mimetype)?;
        Ok(Self::validated(config, raw, mimetype))
    }

    /// Builds from base64 encoded content
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Decode` if `encoded` is not base64, otherwise as
    /// [`from_raw`](Self::from_raw).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use acton_media::config::MediaConfig;
    /// use acton_media::resource::ResourceBuilder;
    ///
    /// let config = MediaConfig::default();
    /// let builder = ResourceBuilder::from_base64(&config, "R0lGODlhAQABAAAAACw=", None).unwrap();
    /// assert_eq!(builder.mimetype(), "image/gif");
    /// assert_eq!(builder.extension_or_default(), "gif");
    /// ```
    pub fn from_base64(
        config: &MediaConfig,
        encoded: &str,
        default_mimetype: Option<&str>,
    ) -> MediaResult<Self> {
        let raw = decode_base64(encoded)?;
        Self::from_raw(config, raw, default_mimetype)
    }

    /// Builds from a `data:` URI, using its declared media type as the default
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidDataUri` or `MediaError::Decode` for a
    /// malformed URI, otherwise as [`from_raw`](Self::from_raw).
    pub fn from_data_uri(config: &MediaConfig, uri: &str) -> MediaResult<Self> {
        let (mimetype, data) = DataUri::parse(uri)?.into_parts();
        Self::from_raw(config, data, Some(&mimetype))
    }

    /// Builds from an image `data:` URI, re-encoding the image
    ///
    /// The payload is decoded as an image and re-encoded as `mimetype`, or as
    /// the URI's declared media type when `mimetype` is `None`. JPEG (also
    /// spelled `image/jpg`), PNG and GIF are supported targets. The result
    /// carries the image dimensions and the target format's extension.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidImage` if the payload is not an image and
    /// `MediaError::UnsupportedMimetype` if the target is not a supported
    /// output format or not in `config.mimetypes`.
    pub fn from_image_data_uri(
        config: &MediaConfig,
        uri: &str,
        mimetype: Option<&str>,
    ) -> MediaResult<Self> {
        let (declared, data) = DataUri::parse(uri)?.into_parts();
        let image = transcode(&data, mimetype.unwrap_or(&declared))?;

        if !config.supports(image.mimetype) {
            return Err(MediaError::UnsupportedMimetype {
                mimetype: image.mimetype.to_string(),
            });
        }

        let mut builder = Self::validated(config, Bytes::from(image.data), image.mimetype.to_string());
        builder.extension = Some(image.extension.to_string());
        builder.width = Some(image.width);
        builder.height = Some(image.height);
        Ok(builder)
    }

    /// Assembles a builder for a mimetype already checked against `config`
    fn validated(config: &MediaConfig, raw: Bytes, mimetype: String) -> Self {
        let default_extension = config
            .extension_for(&mimetype)
            .unwrap_or_default()
            .to_string();

        Self {
            raw,
            mimetype,
            default_extension,
            filename: None,
            extension: None,
            pathname: None,
            suffix: config.suffix_pattern().map(ToString::to_string),
            width: None,
            height: None,
        }
    }

    /// Sets the base name (without suffix or extension)
    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the base name and the extension
    #[must_use]
    pub fn filename_with_extension(
        self,
        filename: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        self.filename(filename).extension(extension)
    }

    /// Sets the extension, overriding the one derived from the mimetype
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Sets the directory part of the path
    ///
    /// Normalized to a single leading `/` and no trailing `/`.
    #[must_use]
    pub fn pathname(mut self, pathname: &str) -> Self {
        self.pathname = Some(normalize_pathname(pathname));
        self
    }

    /// Overrides the configured suffix pattern; `None` disables the suffix
    #[must_use]
    pub fn suffix(mut self, pattern: Option<&str>) -> Self {
        self.suffix = pattern
            .filter(|pattern| !pattern.is_empty())
            .map(ToString::to_string);
        self
    }

    /// Content bytes
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Validated mimetype
    #[must_use]
    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// Extension that will be used: the explicit one, or the mimetype's
    #[must_use]
    pub fn extension_or_default(&self) -> &str {
        self.extension.as_deref().unwrap_or(&self.default_extension)
    }

    /// Directory part, empty when unset
    #[must_use]
    pub fn current_pathname(&self) -> &str {
        self.pathname.as_deref().unwrap_or_default()
    }

    /// Finalizes the resource, stamping the suffix with the local time
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidSuffix` if the suffix pattern cannot be
    /// formatted.
    pub fn finalize(self) -> MediaResult<Resource> {
        self.finalize_at(Local::now())
    }

    /// Finalizes the resource, stamping the suffix with `now`
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidSuffix` if the suffix pattern cannot be
    /// formatted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use acton_media::config::MediaConfig;
    /// use acton_media::resource::ResourceBuilder;
    /// use chrono::{Local, TimeZone};
    ///
    /// let config = MediaConfig::default();
    /// let now = Local.with_ymd_and_hms(2016, 12, 10, 15, 45, 37).unwrap();
    ///
    /// let resource = ResourceBuilder::from_raw(&config, vec![0xFF, 0xD8, 0xFF], None)
    ///     .unwrap()
    ///     .filename("photo")
    ///     .finalize_at(now)
    ///     .unwrap();
    ///
    /// assert_eq!(resource.filename(), "photo@2016Dec10T154537.jpg");
    /// ```
    pub fn finalize_at(self, now: DateTime<Local>) -> MediaResult<Resource> {
        let Self {
            raw,
            mimetype,
            default_extension,
            filename,
            extension,
            pathname,
            suffix,
            width,
            height,
        } = self;

        let basename = filename.unwrap_or_else(random_basename);
        let suffix = suffix
            .map(|pattern| format_suffix(&pattern, &now))
            .transpose()?
            .unwrap_or_default();
        let extension = extension.unwrap_or(default_extension);
        let pathname = pathname.unwrap_or_default();

        let filename = format!("{basename}{suffix}.{extension}");
        let path = join_path(&pathname, &filename);

        Ok(Resource {
            raw,
            mimetype,
            basename,
            extension,
            filename,
            pathname,
            path,
            width,
            height,
        })
    }
}

/// Immutable media resource
///
/// Every derived name is computed once by [`ResourceBuilder::finalize`], so
/// [`path`](Self::path) returns the same string for the life of the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    raw: Bytes,
    mimetype: String,
    basename: String,
    extension: String,
    filename: String,
    pathname: String,
    path: String,
    width: Option<u32>,
    height: Option<u32>,
}

impl Resource {
    /// Content bytes
    #[must_use]
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Consumes the resource, returning its content
    #[must_use]
    pub fn into_raw(self) -> Bytes {
        self.raw
    }

    /// Mimetype, always a key of the configured table
    #[must_use]
    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// Base name without suffix and extension
    #[must_use]
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Extension without the leading dot
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Full filename: base name, suffix and extension
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Directory part; empty for the root
    #[must_use]
    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// Storage key: pathname and filename joined by `/`
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Image width, for resources built from image data URIs
    #[must_use]
    pub const fn width(&self) -> Option<u32> {
        self.width
    }

    /// Image height, for resources built from image data URIs
    #[must_use]
    pub const fn height(&self) -> Option<u32> {
        self.height
    }

    /// Image dimensions as `(width, height)`, when known
    #[must_use]
    pub const fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Some((width, height)),
            _ => None,
        }
    }

    /// Content length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the content is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Normalizes a directory path to one leading `/` and no trailing `/`
///
/// # Examples
///
/// ```rust
/// use acton_media::resource::normalize_pathname;
///
/// assert_eq!(normalize_pathname("a/b/"), "/a/b");
/// assert_eq!(normalize_pathname("//a//"), "/a");
/// assert_eq!(normalize_pathname("/"), "/");
/// ```
#[must_use]
pub fn normalize_pathname(pathname: &str) -> String {
    format!("/{}", pathname.trim_matches('/'))
}

fn join_path(pathname: &str, filename: &str) -> String {
    format!("{}/{filename}", pathname.trim_end_matches('/'))
}

fn random_basename() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_NAME_LEN)
        .map(char::from)
        .collect()
}

fn format_suffix(pattern: &str, now: &DateTime<Local>) -> MediaResult<String> {
    let mut suffix = String::new();
    write!(suffix, "{}", now.format(pattern))
        .map_err(|_| MediaError::InvalidSuffix(pattern.to_string()))?;
    Ok(suffix)
}
