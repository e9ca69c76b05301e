//! The effect runtime as a platform API.

use meridian_io::IoRuntime;
use meridian_io::config::IoConfig;

use crate::error::PlatformBuildError;
use crate::module::Module;
use crate::platform::PlatformBuilder;

/// Inserts an [`IoRuntime`] built from its [`IoConfig`].
///
/// Every node created through the platform's runtime shares one id sequence,
/// one error-to-status conversion and one default failure handler.
#[derive(Debug, Clone)]
pub struct IoModule {
    config: IoConfig,
}

impl IoModule {
    /// A module installing a runtime with `config`.
    #[must_use]
    pub fn new(config: IoConfig) -> Self {
        Self { config }
    }
}

impl Module for IoModule {
    fn build(&self, platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        platform.insert_api(IoRuntime::new(self.config.clone()));
        Ok(())
    }

    fn name(&self) -> &str {
        "io"
    }
}
