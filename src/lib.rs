//! Typed resource identities and composable effect pipelines for plugin-based
//! platforms.
//!
//! Plugins declare typed, globally addressable resources such as statuses
//! and localized messages, and side-effecting operations compose into
//! single-settlement pipelines and coroutine programs:
//!
//! ```
//! use futures::executor::LocalPool;
//! use meridian::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Text {
//!     pub text: String,
//! }
//!
//! plugin! {
//!     pub struct Demo = "demo" |p| {
//!         status {
//!             Err: StatusFactory<Text> = p.get::<StatusProvider>()?.status(ResultCode::Error),
//!         }
//!     }
//! }
//!
//! let pool = LocalPool::new();
//! let mut builder = PlatformBuilder::new(Locale::new("en"));
//! builder.add_modules(
//!     CoreModules::new(IoConfig::new(pool.spawner()))
//!         .build()
//!         .disable::<TracingModule>(),
//! );
//! let mut platform = builder.finish().unwrap();
//! let demo = Demo::declare(platform.registry_mut()).unwrap();
//!
//! let io = platform.api::<IoRuntime>().unwrap();
//! let failing = demo.status.Err.clone();
//! let program = io.coroutine(move |_co: Co, x: u32| async move {
//!     if x > 10 {
//!         return Err(failing.erased(Text { text: "too big".into() }));
//!     }
//!     Ok(x * 3)
//! });
//! program.success(111);
//! assert_eq!(program.result().unwrap().unwrap_err().id().as_str(), "demo:status:Err");
//!
//! let chain = io.success(111).then(&io.sync_io(|x: u32| x * 3));
//! assert_eq!(chain.result(), Some(Ok(333)));
//! ```

pub use meridian_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use meridian_internal::prelude::*;
}
