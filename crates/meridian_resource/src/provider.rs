//! Resource providers.
//!
//! A provider owns one resource [`Category`] and hands out the
//! [`Leaf`](crate::leaf::Leaf) policies that turn a freshly stamped id into
//! the value stored in a plugin's resource tree. Providers are collected in a
//! [`ProviderRegistry`] during startup and then frozen into an immutable
//! [`Providers`] set, which is what plugin declarations read from.
//!
//! # Example
//!
//! ```
//! use meridian_resource::id::Category;
//! use meridian_resource::leaf::Leaf;
//! use meridian_resource::provider::{ProviderRegistry, ResourceProvider};
//!
//! pub struct Metric;
//! impl Category for Metric {
//!     const NAME: &'static str = "metric";
//! }
//!
//! pub struct MetricProvider;
//!
//! impl ResourceProvider for MetricProvider {
//!     type Category = Metric;
//! }
//!
//! impl MetricProvider {
//!     /// A metric named after its resource id.
//!     pub fn counter(&self) -> Leaf<String> {
//!         Leaf::factory(|id| format!("counter.{}", id.key())).in_category::<Metric>()
//!     }
//! }
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register(MetricProvider).unwrap();
//! let providers = registry.freeze();
//! assert!(providers.get::<MetricProvider>().is_ok());
//! ```

use core::any::{Any, TypeId};
use core::fmt;

use hashbrown::HashMap;
use indexmap::IndexMap;
use thiserror::Error;

use crate::id::Category;
use crate::registry::DeclareError;

/// Type-erased provider storage.
type BoxedProvider = Box<dyn Any + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// ResourceProvider
// ─────────────────────────────────────────────────────────────────────────────

/// A factory-of-factories for one resource category.
///
/// Implementors expose inherent methods returning
/// [`Leaf`](crate::leaf::Leaf) values; declarations call them through
/// [`Providers::get`].
///
/// # Thread Safety
///
/// Providers must be `Send + Sync`. The frozen [`Providers`] set is shared
/// through an `Arc` and may be handed to a [`PluginRegistry`](crate::registry::PluginRegistry)
/// on another thread. Only the effect layer is single-threaded; resource
/// declaration is not tied to it.
pub trait ResourceProvider: Send + Sync + 'static {
    /// The category this provider serves.
    type Category: Category;

    /// Returns the provider's name for error messages.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}

/// Errors raised while registering providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The same provider type was registered twice.
    #[error("provider `{0}` is already registered")]
    DuplicateProvider(&'static str),
    /// Another provider already serves the category.
    #[error("category `{category}` is already served by `{existing}`")]
    CategoryTaken {
        /// The contested category.
        category: &'static str,
        /// Name of the provider registered first.
        existing: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// ProviderRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Append-only collection of providers, open during startup.
///
/// Call [`freeze`](Self::freeze) once every module has registered its
/// providers.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<TypeId, BoxedProvider>,
    /// Category name → provider name, in registration order.
    categories: IndexMap<&'static str, String>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateProvider`] if `P` is already registered
    /// - [`RegistryError::CategoryTaken`] if another provider serves
    ///   `P::Category`
    pub fn register<P: ResourceProvider>(&mut self, provider: P) -> Result<&mut Self, RegistryError> {
        let type_id = TypeId::of::<P>();
        if self.providers.contains_key(&type_id) {
            return Err(RegistryError::DuplicateProvider(core::any::type_name::<P>()));
        }

        let category = <P::Category as Category>::NAME;
        if let Some(existing) = self.categories.get(category) {
            return Err(RegistryError::CategoryTaken {
                category,
                existing: existing.clone(),
            });
        }

        tracing::debug!(category, provider = provider.name(), "registered resource provider");
        self.categories.insert(category, provider.name().to_string());
        self.providers.insert(type_id, Box::new(provider));
        Ok(self)
    }

    /// Returns true if a provider of type `P` is registered.
    #[must_use]
    pub fn contains<P: ResourceProvider>(&self) -> bool {
        self.providers.contains_key(&TypeId::of::<P>())
    }

    /// Returns the number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Closes the registry.
    #[must_use]
    pub fn freeze(self) -> Providers {
        Providers {
            providers: self.providers,
            categories: self.categories,
        }
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────────────────────────────────────

/// Frozen provider set handed to plugin declarations.
#[derive(Default)]
pub struct Providers {
    providers: HashMap<TypeId, BoxedProvider>,
    categories: IndexMap<&'static str, String>,
}

impl Providers {
    /// Returns the provider of type `P`.
    ///
    /// # Errors
    ///
    /// Returns [`DeclareError::MissingProvider`] if `P` was never registered.
    pub fn get<P: ResourceProvider>(&self) -> Result<&P, DeclareError> {
        self.providers
            .get(&TypeId::of::<P>())
            .and_then(|boxed| boxed.downcast_ref::<P>())
            .ok_or(DeclareError::MissingProvider(core::any::type_name::<P>()))
    }

    /// Returns true if a provider of type `P` is present.
    #[must_use]
    pub fn contains<P: ResourceProvider>(&self) -> bool {
        self.providers.contains_key(&TypeId::of::<P>())
    }

    /// Returns the name of the provider serving `category`, if any.
    #[must_use]
    pub fn provider_of(&self, category: &str) -> Option<&str> {
        self.categories.get(category).map(String::as_str)
    }

    /// Iterates over served categories in registration order.
    pub fn categories(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.categories.keys().copied()
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers")
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}
