//! The status provider and the `platform` plugin.

use meridian_resource::builtin::{
    CastExceptionParams, MissingStringParams, NoStringLoaderParams, UnknownErrorParams, UnsupportedLocaleParams,
};
use meridian_resource::plugin;
use meridian_resource::status::{ResultCode, StatusFactory, StatusProvider};

use crate::api::Api;
use crate::error::PlatformBuildError;
use crate::module::Module;
use crate::platform::PlatformBuilder;

plugin! {
    /// Statuses the runtime reports on its own.
    ///
    /// Their ids match the statuses built by
    /// [`meridian_resource::builtin`], so the factories here cast them.
    pub struct PlatformStatuses = "platform" |p| {
        status {
            UnknownError: StatusFactory<UnknownErrorParams> = p.get::<StatusProvider>()?.status(ResultCode::Error),
            CastException: StatusFactory<CastExceptionParams> = p.get::<StatusProvider>()?.status(ResultCode::Error),
            NoStringLoader: StatusFactory<NoStringLoaderParams> = p.get::<StatusProvider>()?.status(ResultCode::Error),
            MissingString: StatusFactory<MissingStringParams> = p.get::<StatusProvider>()?.status(ResultCode::Error),
            UnsupportedLocale: StatusFactory<UnsupportedLocaleParams> = p.get::<StatusProvider>()?.status(ResultCode::Error),
        }
    }
}

impl Api for PlatformStatuses {}

/// Registers [`StatusProvider`] and declares the `platform` plugin.
///
/// # APIs Provided
///
/// | API | Phase | Description |
/// |-----|-------|-------------|
/// | [`PlatformStatuses`] | ready | Factories of the built-in statuses |
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusModule;

impl Module for StatusModule {
    fn build(&self, platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        platform.register_provider(StatusProvider)?;
        Ok(())
    }

    fn ready(&self, platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        let statuses = PlatformStatuses::declare(platform.registry_mut()?)?;
        platform.insert_api(statuses);
        Ok(())
    }

    fn name(&self) -> &str {
        "status"
    }
}
