//! Structured logging
//!
//! Installs a `tracing` subscriber filtered by `RUST_LOG`. Development builds
//! log in a pretty format, release builds emit JSON lines.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable multi-line output
    Pretty,
    /// One JSON object per event
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let default_filter = if cfg!(debug_assertions) {
            "debug,acton_media=trace"
        } else {
            "info"
        };

        Self {
            default_filter: default_filter.to_string(),
            format: LogFormat::default(),
        }
    }
}

impl ObservabilityConfig {
    /// Overrides the fallback filter directive
    #[must_use]
    pub fn with_filter(mut self, directive: impl Into<String>) -> Self {
        self.default_filter = directive.into();
        self
    }

    /// Overrides the output format
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Initializes logging with the default configuration
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
///
/// # Example
///
/// ```rust,no_run
/// use acton_media::observability;
///
/// # fn main() -> anyhow::Result<()> {
/// observability::init()?;
/// tracing::info!("Media service started");
/// # Ok(())
/// # }
/// ```
pub fn init() -> anyhow::Result<()> {
    init_with(&ObservabilityConfig::default())
}

/// Initializes logging with an explicit configuration
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_with(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    match config.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
    }

    Ok(())
}
