//! Typed resource identities and plugin declaration for Meridian (Layer 1).
//!
//! `meridian_resource` lets independently written plugins publish typed,
//! globally addressable resources without a central registry knowing their
//! types in advance:
//!
//! - [`id`] - `plugin:category:key` ids, typed by category and payload
//! - [`leaf`] - policies turning a stamped id into a value
//! - [`provider`] - per-category factories and their registry
//! - [`registry`] - two-pass plugin declaration
//! - [`status`] - identified, parameterized outcomes
//! - [`intl`] - localized message ids
//! - [`builtin`] - statuses reported by the runtime itself
//! - [`macro@plugin`] - declarative plugin trees
//!
//! # Architecture
//!
//! - **Layer 1** (`meridian_resource`): resource identity (this crate)
//! - **Layer 2** (`meridian_io`): effect nodes and coroutine programs
//! - **Layer 3** (`meridian_platform`): module lifecycle, localization
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use meridian_resource::prelude::*;
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
//! let mut providers = ProviderRegistry::new();
//! providers.register(StatusProvider).unwrap();
//! let mut registry = PluginRegistry::new(Arc::new(providers.freeze()));
//!
//! let demo = Demo::declare(&mut registry).unwrap();
//! let status = demo.status.Err.create(Text { text: "boom".into() });
//! assert_eq!(status.id().as_str(), "demo:status:Err");
//! ```

// Lets `plugin!` expansions inside this crate use `meridian_resource::` paths.
extern crate self as meridian_resource;

/// Statuses reported by the runtime itself.
pub mod builtin;

/// Resource ids and category tags.
pub mod id;

/// Localized message ids.
pub mod intl;

/// Leaf policies.
pub mod leaf;

/// Resource providers and their registry.
pub mod provider;

/// Plugin declaration.
pub mod registry;

/// The status model.
pub mod status;

/// Re-export the `plugin!` declaration macro.
pub use meridian_resource_macros::plugin;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::builtin::PlatformError;
    pub use crate::id::{Category, PluginId, RawResourceId, ResourceId, ResourceIdError, ResourceType};
    pub use crate::intl::{IntlProvider, IntlString, StringCategory};
    pub use crate::leaf::Leaf;
    pub use crate::plugin;
    pub use crate::provider::{ProviderRegistry, Providers, RegistryError, ResourceProvider};
    pub use crate::registry::{DeclareError, PluginBuilder, PluginDescriptor, PluginRegistry};
    pub use crate::status::{
        Params, ResultCode, Status, StatusCategory, StatusFactory, StatusId, StatusProvider,
    };
}
