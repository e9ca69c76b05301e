//! Built-in modules.
//!
//! - [`TracingModule`] - logging via `tracing-subscriber`
//! - [`IoModule`] - the shared [`IoRuntime`](meridian_io::IoRuntime)
//! - [`StatusModule`] - statuses and the `platform` plugin
//! - [`I18nModule`] - localized strings
//! - [`CoreModules`] - all of the above

mod i18n_module;
mod io_module;
mod status_module;
mod tracing_module;

pub use i18n_module::I18nModule;
pub use io_module::IoModule;
pub use status_module::{PlatformStatuses, PlatformStatusesStatus, StatusModule};
pub use tracing_module::{TracingConfig, TracingFormat, TracingModule};

use meridian_io::config::IoConfig;

use crate::module::{ModuleGroup, ModuleGroupBuilder};

/// The modules most platforms need.
///
/// # Example
///
/// ```
/// use futures::executor::LocalPool;
/// use meridian_platform::prelude::*;
///
/// let pool = LocalPool::new();
/// let group = CoreModules::new(IoConfig::new(pool.spawner()))
///     .build()
///     .disable::<TracingModule>();
/// assert_eq!(group.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct CoreModules {
    io: IoConfig,
    tracing: TracingModule,
}

impl CoreModules {
    /// The core modules, with the runtime built from `io`.
    #[must_use]
    pub fn new(io: IoConfig) -> Self {
        Self {
            io,
            tracing: TracingModule::default(),
        }
    }

    /// Replaces the default logging setup.
    #[must_use]
    pub fn with_tracing(mut self, tracing: TracingModule) -> Self {
        self.tracing = tracing;
        self
    }
}

impl ModuleGroup for CoreModules {
    fn build(self) -> ModuleGroupBuilder {
        ModuleGroupBuilder::new()
            .add(self.tracing)
            .add(IoModule::new(self.io))
            .add(StatusModule)
            .add(I18nModule)
    }
}
