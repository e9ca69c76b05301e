//! Module lifecycle, platform startup and localization for Meridian (Layer 3).
//!
//! A platform is assembled from [`Module`](module::Module)s. Each module
//! registers resource providers and APIs while the platform builds, then
//! declares its plugins once the providers are frozen:
//!
//! - [`module`] - the `Module` trait and module groups
//! - [`platform`] - [`PlatformBuilder`](platform::PlatformBuilder) and the
//!   running [`Platform`](platform::Platform)
//! - [`api`] - values modules share with each other
//! - [`modules`] - built-in modules: tracing, io, statuses, localization
//! - [`i18n`] - per-plugin string loaders and message formatting
//! - [`locale`] - `language-COUNTRY` locales
//!
//! # Example
//!
//! ```
//! use futures::executor::LocalPool;
//! use meridian_platform::prelude::*;
//! use meridian_resource::prelude::*;
//!
//! let pool = LocalPool::new();
//! let mut builder = PlatformBuilder::new(Locale::from_env());
//! builder.add_modules(
//!     CoreModules::new(IoConfig::new(pool.spawner()))
//!         .build()
//!         .disable::<TracingModule>(),
//! );
//! let platform = builder.finish().unwrap();
//!
//! let statuses = platform.api::<PlatformStatuses>().unwrap();
//! let cast = statuses.status.UnknownError.cast(&meridian_resource::builtin::unknown_error("boom"));
//! assert_eq!(cast.unwrap().params().message, "boom");
//! ```

/// Platform APIs.
pub mod api;

/// Startup errors.
pub mod error;

/// Localized strings.
pub mod i18n;

/// Locales.
pub mod locale;

/// The module trait.
pub mod module;

/// Built-in modules.
pub mod modules;

/// Platform builder and platform.
pub mod platform;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::api::Api;
    pub use crate::error::{LocaleError, Phase, PlatformBuildError};
    pub use crate::i18n::{I18n, LocalizedStrings};
    pub use crate::locale::Locale;
    pub use crate::module::{Module, ModuleGroup, ModuleGroupBuilder, ModuleId, Modules};
    pub use crate::modules::{
        CoreModules, I18nModule, IoModule, PlatformStatuses, StatusModule, TracingConfig, TracingFormat, TracingModule,
    };
    pub use crate::platform::{Platform, PlatformBuilder};
    pub use meridian_io::IoRuntime;
    pub use meridian_io::config::IoConfig;
}
