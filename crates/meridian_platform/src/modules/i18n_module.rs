//! The string provider and the localization API.

use meridian_io::IoRuntime;
use meridian_resource::intl::IntlProvider;

use crate::error::PlatformBuildError;
use crate::i18n::I18n;
use crate::module::{Module, ModuleId};
use crate::modules::IoModule;
use crate::platform::PlatformBuilder;

/// Registers [`IntlProvider`] and inserts the [`I18n`] API.
///
/// # Dependencies
///
/// - [`IoModule`], whose runtime creates the localization nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct I18nModule;

impl Module for I18nModule {
    fn build(&self, platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        let runtime = platform.require_api::<IoRuntime>(self.name())?.clone();
        platform.register_provider(IntlProvider)?;
        platform.insert_api(I18n::new(runtime));
        Ok(())
    }

    fn name(&self) -> &str {
        "i18n"
    }

    fn dependencies(&self) -> Vec<ModuleId> {
        vec![ModuleId::of::<IoModule>()]
    }
}
