//! Configuration management for acton-media
//!
//! Media settings live under the `[media]` table and are loaded from multiple
//! sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `ACTON_` prefix, `__` for nesting)
//! 2. `./config.toml` (development)
//! 3. `~/.config/acton-media/{service}/config.toml` (user config, XDG)
//! 4. `/etc/acton-media/{service}/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! Environment variable format: `ACTON_MEDIA__FIELD_NAME`, for example
//! `ACTON_MEDIA__DISK=scratch` or `ACTON_MEDIA__PATH=/srv/media`.
//!
//! Tables are merged key by key, so a `[media.mimetypes]` table in a file
//! extends the default mimetype table rather than replacing it.
//!
//! # Example Configuration
//!
//! ```toml
//! [media]
//! path = "/srv/app/storage/media"
//! disk = "media"
//! suffix = "@%Y%b%dT%H%M%S"   # empty string disables the suffix
//!
//! [media.mimetypes]
//! "image/webp" = "webp"
//!
//! [media.disks.media]
//! driver = "local"
//!
//! [media.disks.scratch]
//! driver = "memory"
//! ```

use crate::error::{MediaError, MediaResult};
use chrono::format::{Item, StrftimeItems};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Mimetypes accepted out of the box, with their file extensions
pub const DEFAULT_MIMETYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/bmp", "bmp"),
    ("image/svg+xml", "svg"),
];

/// Default filename suffix, e.g. `@2016Dec10T154537`
pub const DEFAULT_SUFFIX: &str = "@%Y%b%dT%H%M%S";

/// Default disk name
pub const DEFAULT_DISK: &str = "media";

/// Storage backend bound to a disk name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum DiskSettings {
    /// Files below a local directory
    Local {
        /// Root directory; falls back to the media `path` when unset
        #[serde(default, skip_serializing_if = "Option::is_none")]
        root: Option<PathBuf>,
    },

    /// In-process map, lost on restart
    Memory,
}

impl DiskSettings {
    /// Driver name as written in configuration
    #[must_use]
    pub const fn driver(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

/// Media manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Root directory for media
    pub path: PathBuf,

    /// Disk the manager stores files on
    pub disk: String,

    /// strftime pattern appended to generated filenames (empty disables it)
    pub suffix: Option<String>,

    /// Supported mimetypes and the associated extension
    pub mimetypes: BTreeMap<String, String>,

    /// Configured disks by name
    pub disks: BTreeMap<String, DiskSettings>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./storage/app/public/media"),
            disk: DEFAULT_DISK.to_string(),
            suffix: Some(DEFAULT_SUFFIX.to_string()),
            mimetypes: DEFAULT_MIMETYPES
                .iter()
                .map(|(mime, ext)| ((*mime).to_string(), (*ext).to_string()))
                .collect(),
            disks: BTreeMap::from([(DEFAULT_DISK.to_string(), DiskSettings::Local { root: None })]),
        }
    }
}

/// On-disk layout: media settings under a `[media]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    media: MediaConfig,
}

impl MediaConfig {
    /// Returns the extension configured for `mimetype`
    #[must_use]
    pub fn extension_for(&self, mimetype: &str) -> Option<&str> {
        self.mimetypes.get(mimetype).map(String::as_str)
    }

    /// Whether `mimetype` is in the supported table
    #[must_use]
    pub fn supports(&self, mimetype: &str) -> bool {
        self.mimetypes.contains_key(mimetype)
    }

    /// Returns the suffix pattern, treating an empty pattern as unset
    #[must_use]
    pub fn suffix_pattern(&self) -> Option<&str> {
        self.suffix.as_deref().filter(|pattern| !pattern.is_empty())
    }

    /// Checks the configuration for values the manager cannot work with
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Config` for an empty or malformed mimetype table,
    /// `MediaError::InvalidSuffix` for a pattern chrono cannot format or that
    /// would introduce a path separator, and `MediaError::UnknownDisk` if
    /// `disk` has no settings.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use acton_media::config::MediaConfig;
    ///
    /// let mut config = MediaConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.suffix = Some("%Q".to_string());
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> MediaResult<()> {
        if self.mimetypes.is_empty() {
            return Err(MediaError::Config("no supported mimetypes configured".to_string()));
        }

        for (mimetype, extension) in &self.mimetypes {
            if mimetype.parse::<mime::Mime>().is_err() {
                return Err(MediaError::Config(format!("[{mimetype}] is not a mimetype")));
            }
            if extension.is_empty() || extension.contains(['/', '\\', '.']) {
                return Err(MediaError::Config(format!(
                    "invalid extension [{extension}] for [{mimetype}]"
                )));
            }
        }

        if let Some(pattern) = self.suffix_pattern() {
            let malformed = StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error));
            if malformed || pattern.contains(['/', '\\']) {
                return Err(MediaError::InvalidSuffix(pattern.to_string()));
            }
        }

        if !self.disks.contains_key(&self.disk) {
            return Err(MediaError::UnknownDisk(self.disk.clone()));
        }

        Ok(())
    }

    /// Load configuration for a specific service
    ///
    /// Searches for configuration in XDG-compliant locations with precedence:
    /// 1. Environment variables (`ACTON_*`, use `__` for nesting)
    /// 2. `./config.toml`
    /// 3. `~/.config/acton-media/{service_name}/config.toml`
    /// 4. `/etc/acton-media/{service_name}/config.toml`
    /// 5. Defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file cannot be read or parsed, or
    /// if the merged configuration fails [`validate`](Self::validate).
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use acton_media::config::MediaConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = MediaConfig::load_for_service("my-app")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_for_service(service_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            // 5. Start with defaults (lowest priority)
            .merge(Toml::string(&toml::to_string(&ConfigFile::default())?));

        // 4. System config
        let system_config = PathBuf::from("/etc/acton-media")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        // 3. User config
        let user_config = Self::recommended_path(service_name);
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        // 2. Local config
        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        // 1. Environment variables
        figment = figment.merge(Env::prefixed("ACTON_").split("__").lowercase(true));

        Self::finish(figment)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file yields the defaults (plus environment overrides).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the result fails
    /// [`validate`](Self::validate).
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use acton_media::config::MediaConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = MediaConfig::load_from("./config/production.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let figment = Figment::new()
            .merge(Toml::string(&toml::to_string(&ConfigFile::default())?))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ACTON_").split("__").lowercase(true));

        Self::finish(figment)
    }

    fn finish(figment: Figment) -> anyhow::Result<Self> {
        let file: ConfigFile = figment.extract()?;
        file.media.validate()?;
        Ok(file.media)
    }

    /// Get the recommended XDG config path for a service
    ///
    /// # Example
    ///
    /// ```rust
    /// use acton_media::config::MediaConfig;
    ///
    /// let path = MediaConfig::recommended_path("my-app");
    /// // Returns: ~/.config/acton-media/my-app/config.toml
    /// ```
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| {
                config_dir
                    .join("acton-media")
                    .join(service_name)
                    .join("config.toml")
            },
        )
    }
}
