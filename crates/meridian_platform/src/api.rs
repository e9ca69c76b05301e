//! APIs: capabilities modules expose to each other.
//!
//! An API is a value inserted into the platform during `build()` and looked
//! up by type, by later modules during `build()`/`ready()` or by the
//! application once the platform is running. There is one value per type.
//!
//! | Provided by | API |
//! |-------------|-----|
//! | [`IoModule`](crate::modules::IoModule) | [`IoRuntime`] |
//! | [`StatusModule`](crate::modules::StatusModule) | [`PlatformStatuses`](crate::modules::PlatformStatuses) |
//! | [`I18nModule`](crate::modules::I18nModule) | [`I18n`](crate::i18n::I18n) |
//! | [`TracingModule`](crate::modules::TracingModule) | [`TracingConfig`](crate::modules::TracingConfig) |
//!
//! APIs that accept registrations after insertion use interior mutability,
//! as [`I18n::set_loader`](crate::i18n::I18n::set_loader) does.

use core::any::Any;

use meridian_io::IoRuntime;

/// Marker for values stored as platform APIs.
///
/// The platform is single-threaded, so APIs need not be `Send` or `Sync`.
pub trait Api: Any {}

pub(crate) type BoxedApi = Box<dyn Any>;

impl Api for IoRuntime {}
