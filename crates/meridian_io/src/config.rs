//! Runtime configuration: error conversion, unhandled failures and task
//! spawning.
//!
//! # Example
//!
//! ```
//! use futures::executor::LocalPool;
//! use meridian_io::config::IoConfig;
//! use meridian_resource::builtin;
//!
//! let pool = LocalPool::new();
//! let config = IoConfig::new(pool.spawner())
//!     .with_error_to_status(|error| builtin::unknown_error(format!("wrapped: {error}")))
//!     .with_default_failure_handler(|_status| {});
//!
//! let status = config.error_to_status("boom".into());
//! assert_eq!(status.params()["message"], "wrapped: boom");
//! ```

use core::fmt;
use std::rc::Rc;

use futures::future::LocalFutureObj;
use futures::task::{LocalSpawn, SpawnError};
use meridian_resource::builtin::{self, PlatformError};
use meridian_resource::status::Status;

use crate::sink::FailureHandler;

/// Error type produced by fallible operations.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Converts an operation error into the status delivered downstream.
pub type ErrorToStatus = Rc<dyn Fn(BoxError) -> Status>;

/// Configuration shared by every node of one [`IoRuntime`](crate::IoRuntime).
#[derive(Clone)]
pub struct IoConfig {
    error_to_status: ErrorToStatus,
    default_failure_handler: FailureHandler,
    spawner: Rc<dyn LocalSpawn>,
}

impl IoConfig {
    /// Creates a configuration spawning async operations on `spawner`, with
    /// the default error conversion and failure handler.
    #[must_use]
    pub fn new(spawner: impl LocalSpawn + 'static) -> Self {
        Self {
            error_to_status: Rc::new(default_error_to_status),
            default_failure_handler: Rc::new(default_failure_handler),
            spawner: Rc::new(spawner),
        }
    }

    /// Replaces the error-to-status conversion.
    #[must_use]
    pub fn with_error_to_status(mut self, convert: impl Fn(BoxError) -> Status + 'static) -> Self {
        self.error_to_status = Rc::new(convert);
        self
    }

    /// Replaces the handler for failures reaching a sink without a failure
    /// callback. The handler must not panic.
    #[must_use]
    pub fn with_default_failure_handler(mut self, handler: impl Fn(&Status) + 'static) -> Self {
        self.default_failure_handler = Rc::new(handler);
        self
    }

    /// Converts an operation error.
    #[must_use]
    pub fn error_to_status(&self, error: BoxError) -> Status {
        (self.error_to_status)(error)
    }

    /// Returns the handler for unobserved failures.
    #[must_use]
    pub fn default_failure_handler(&self) -> &FailureHandler {
        &self.default_failure_handler
    }

    pub(crate) fn spawn(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        self.spawner.spawn_local_obj(future)
    }
}

impl fmt::Debug for IoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoConfig").finish_non_exhaustive()
    }
}

/// Default conversion: a [`PlatformError`] keeps its status, anything else
/// becomes `platform:status:UnknownError` carrying the error message.
#[must_use]
pub fn default_error_to_status(error: BoxError) -> Status {
    match error.downcast::<PlatformError>() {
        Ok(platform) => platform.into_status(),
        Err(other) => builtin::unknown_error(other.to_string()),
    }
}

/// Default handler for unobserved failures: logs the status.
pub fn default_failure_handler(status: &Status) {
    tracing::error!(status = %status.id(), params = %status.params(), "unhandled failure");
}

// ─────────────────────────────────────────────────────────────────────────────
// Spawners
// ─────────────────────────────────────────────────────────────────────────────

/// Spawns async operations with [`tokio::task::spawn_local`].
///
/// # Panics
///
/// Spawning panics unless it happens inside a [`tokio::task::LocalSet`].
///
/// # Example
///
/// ```
/// use meridian_io::prelude::*;
///
/// let local = tokio::task::LocalSet::new();
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// rt.block_on(local.run_until(async {
///     let io = IoRuntime::new(IoConfig::new(TokioSpawner));
///     let node = io.async_io(|x: u32| async move { Ok::<_, BoxError>(x + 1) });
///     node.success(1);
///     tokio::task::yield_now().await;
///     assert_eq!(node.state(), State::Success);
/// }));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl LocalSpawn for TokioSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        tokio::task::spawn_local(future);
        Ok(())
    }
}
