//! Logging setup.
//!
//! Provides [`TracingModule`], which installs the `tracing` subscriber, and
//! exposes its settings as the [`TracingConfig`] API.
//!
//! # Lifecycle
//!
//! - **`build()`** inserts [`TracingConfig`] so other modules can read the
//!   intended settings while they build.
//! - **`ready()`** installs the subscriber. Installation uses `try_init`, so
//!   starting several platforms in one process (as tests do) keeps the first
//!   subscriber instead of panicking.
//!
//! # Example
//!
//! ```
//! use meridian_platform::prelude::*;
//! use tracing::Level;
//!
//! let mut builder = PlatformBuilder::new(Locale::default());
//! builder.add_modules(
//!     TracingModule::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! );
//! let platform = builder.finish().unwrap();
//!
//! let config = platform.api::<TracingConfig>().unwrap();
//! assert_eq!(config.level, Level::DEBUG);
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::api::Api;
use crate::error::PlatformBuildError;
use crate::module::Module;
use crate::platform::PlatformBuilder;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable multi-line output (default).
    #[default]
    Pretty,
    /// Single-line output.
    Compact,
    /// JSON lines for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig API
// ─────────────────────────────────────────────────────────────────────────────

/// The logging settings of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// Maximum level logged when no filter directive overrides it.
    pub level: Level,
    /// Output format.
    pub format: TracingFormat,
}

impl Api for TracingConfig {}

// ─────────────────────────────────────────────────────────────────────────────
// TracingModule
// ─────────────────────────────────────────────────────────────────────────────

/// Installs the `tracing` subscriber.
///
/// # APIs Provided
///
/// | API | Description |
/// |-----|-------------|
/// | [`TracingConfig`] | Level and format (read-only) |
///
/// # Filter Directives
///
/// ```
/// use meridian_platform::modules::TracingModule;
///
/// TracingModule::default()
///     .with_env_filter("meridian_io=debug,meridian_platform=info")
/// # ;
/// ```
#[derive(Debug, Clone)]
pub struct TracingModule {
    level: Level,
    format: TracingFormat,
    /// Filter directives such as `meridian_io=debug`.
    env_filter: Option<String>,
    /// Whether span enter/exit events are logged.
    span_events: bool,
}

impl Default for TracingModule {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingModule {
    /// Creates a `TracingModule` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets filter directives, `target=level,target=level,...`.
    ///
    /// Invalid directives fall back to the plain level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str())),
            None => EnvFilter::new(self.level.as_str()),
        }
    }
}

impl Module for TracingModule {
    fn build(&self, platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        platform.insert_api(TracingConfig {
            level: self.level,
            format: self.format,
        });
        Ok(())
    }

    fn ready(&self, _platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init().ok(): a subscriber installed earlier wins
        let registry = tracing_subscriber::registry().with(self.filter());
        match self.format {
            TracingFormat::Pretty => registry
                .with(tracing_subscriber::fmt::layer().pretty().with_span_events(span_events))
                .try_init()
                .ok(),
            TracingFormat::Compact => registry
                .with(tracing_subscriber::fmt::layer().compact().with_span_events(span_events))
                .try_init()
                .ok(),
            TracingFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json().with_span_events(span_events))
                .try_init()
                .ok(),
        };

        tracing::info!(level = %self.level, format = ?self.format, "tracing initialized");
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
