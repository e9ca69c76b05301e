//! Shared fixtures for `meridian_resource` integration tests.

#![allow(dead_code, reason = "each test file uses a different subset")]

use std::sync::Arc;

use meridian_resource::prelude::*;

/// Category used by test plugins for plain typed ids.
pub struct Class;

impl Category for Class {
    const NAME: &'static str = "class";
}

/// Payload kept by internal class leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct DocClass {
    pub label: &'static str,
}

/// A registry with no providers.
pub fn registry() -> PluginRegistry {
    PluginRegistry::new(Arc::new(Providers::default()))
}

/// A registry whose providers serve `status` and `string`.
pub fn registry_with_statuses() -> PluginRegistry {
    let mut providers = ProviderRegistry::new();
    providers
        .register(StatusProvider)
        .and_then(|registry| registry.register(IntlProvider))
        .expect("providers register once");
    PluginRegistry::new(Arc::new(providers.freeze()))
}
