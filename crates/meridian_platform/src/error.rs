//! Platform startup errors.

use core::fmt;

use meridian_resource::provider::RegistryError;
use meridian_resource::registry::DeclareError;
use thiserror::Error;

/// The lifecycle phase of a [`PlatformBuilder`](crate::platform::PlatformBuilder).
///
/// Phases progress linearly: `Collect` → `Build` → `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Modules are being added; nothing has run yet.
    #[default]
    Collect,
    /// `Module::build` is running; providers are still open.
    Build,
    /// `Module::ready` is running; providers are frozen and plugins may be
    /// declared.
    Ready,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Collect => "collect",
            Self::Build => "build",
            Self::Ready => "ready",
        })
    }
}

/// Errors raised while starting a platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformBuildError {
    /// A provider could not be registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A plugin declaration failed.
    #[error(transparent)]
    Declare(#[from] DeclareError),
    /// A module depends on a module nobody added.
    #[error("module `{module}` requires `{dependency}` which was not added")]
    MissingDependency {
        /// The dependent module.
        module: String,
        /// Type name of the missing module.
        dependency: &'static str,
    },
    /// Modules depend on each other in a cycle.
    #[error("circular dependency detected among modules: {0:?}")]
    CircularDependency(Vec<String>),
    /// An operation was attempted outside the phase that allows it.
    #[error("`{operation}` is not available during the {phase} phase")]
    WrongPhase {
        /// The rejected operation.
        operation: &'static str,
        /// The phase the builder was in.
        phase: Phase,
    },
    /// A module needs an API no earlier module inserted.
    #[error("module `{module}` requires the `{api}` api")]
    MissingApi {
        /// The module asking.
        module: String,
        /// Type name of the missing API.
        api: &'static str,
    },
}

/// Errors raised while parsing a [`Locale`](crate::locale::Locale).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    /// The text is not `language` or `language-COUNTRY`.
    #[error("invalid locale `{0}`")]
    Invalid(String),
}
