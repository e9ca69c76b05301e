//! Plugin declaration.
//!
//! A plugin is declared exactly once, under a unique name, into a
//! [`PluginRegistry`]. Declaration is a two-pass walk over the plugin's
//! resource tree:
//!
//! 1. **Stamp** every leaf with its id `plugin:category:key`
//!    ([`PluginBuilder::stamp`]).
//! 2. **Resolve** every leaf through its [`Leaf`] policy
//!    ([`PluginBuilder::resolve`]).
//!
//! Because all ids exist before any factory runs, factories may refer to the
//! ids of sibling resources. The [`plugin!`](crate::plugin) macro generates
//! both passes from a declarative tree; the builder can also be driven by
//! hand.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use meridian_resource::id::{Category, ResourceId};
//! use meridian_resource::leaf::Leaf;
//! use meridian_resource::provider::Providers;
//! use meridian_resource::registry::PluginRegistry;
//!
//! struct Class;
//! impl Category for Class {
//!     const NAME: &'static str = "class";
//! }
//!
//! let mut registry = PluginRegistry::new(Arc::new(Providers::default()));
//! let mut builder = registry.builder("core").unwrap();
//! let doc = builder.stamp("class", "Doc").unwrap();
//! let doc: ResourceId<Class, ()> = builder.resolve(&doc, Leaf::external()).unwrap();
//! builder.finish().unwrap();
//!
//! assert_eq!(doc.as_str(), "core:class:Doc");
//! assert!(registry.contains(doc.raw()));
//! ```

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use indexmap::IndexMap;
use thiserror::Error;

use crate::id::{Category, PluginId, RawResourceId, ResourceId, ResourceIdError};
use crate::leaf::Leaf;
use crate::provider::Providers;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised while declaring a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclareError {
    /// A plugin with this name was declared before.
    #[error("plugin `{0}` is already declared")]
    DuplicatePlugin(PluginId),
    /// The same `(category, key)` pair appears twice in one plugin.
    #[error("resource `{0}` is declared twice")]
    DuplicateResource(RawResourceId),
    /// A category-bound leaf was placed under another category.
    #[error("resource `{id}` cannot take a value of category `{expected}`")]
    CategoryMismatch {
        /// The stamped id.
        id: RawResourceId,
        /// The category the leaf is bound to.
        expected: &'static str,
    },
    /// A declaration asked for a provider nobody registered.
    #[error("no provider `{0}` is registered")]
    MissingProvider(&'static str),
    /// The registry no longer accepts declarations.
    #[error("plugin registry is frozen, cannot declare `{0}`")]
    RegistryFrozen(String),
    /// A leaf was resolved against an id this builder never stamped.
    #[error("resource `{0}` was not stamped by this plugin")]
    Unstamped(RawResourceId),
    /// A stamped leaf was resolved twice.
    #[error("resource `{0}` was already resolved")]
    AlreadyResolved(RawResourceId),
    /// A stamped leaf was never resolved.
    #[error("resource `{0}` was stamped but never resolved")]
    Unresolved(RawResourceId),
    /// An id part was invalid.
    #[error(transparent)]
    InvalidId(#[from] ResourceIdError),
}

// ─────────────────────────────────────────────────────────────────────────────
// InternalValues
// ─────────────────────────────────────────────────────────────────────────────

/// Side table of values kept by [`Leaf::internal`].
#[derive(Default)]
pub(crate) struct InternalValues {
    values: HashMap<RawResourceId, Box<dyn Any>>,
}

impl InternalValues {
    pub(crate) fn insert(&mut self, id: RawResourceId, value: Box<dyn Any>) {
        self.values.insert(id, value);
    }

    fn get<T: 'static>(&self, id: &RawResourceId) -> Option<&T> {
        self.values.get(id).and_then(|value| value.downcast_ref::<T>())
    }

    fn absorb(&mut self, other: InternalValues) {
        self.values.extend(other.values);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginDescriptor
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime record of a declared plugin.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    id: PluginId,
    resources: Vec<RawResourceId>,
}

impl PluginDescriptor {
    /// Returns the plugin id.
    #[must_use]
    pub fn id(&self) -> &PluginId {
        &self.id
    }

    /// Returns the ids of every declared resource, in declaration order.
    #[must_use]
    pub fn resources(&self) -> &[RawResourceId] {
        &self.resources
    }

    /// Returns true if the plugin declared `id`.
    #[must_use]
    pub fn contains(&self, id: &RawResourceId) -> bool {
        self.resources.contains(id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of declared plugins.
///
/// Open for declarations until [`freeze`](Self::freeze) is called.
pub struct PluginRegistry {
    providers: Arc<Providers>,
    plugins: IndexMap<PluginId, PluginDescriptor>,
    internals: InternalValues,
    frozen: bool,
}

impl PluginRegistry {
    /// Creates an empty registry that declares against `providers`.
    #[must_use]
    pub fn new(providers: Arc<Providers>) -> Self {
        Self {
            providers,
            plugins: IndexMap::new(),
            internals: InternalValues::default(),
            frozen: false,
        }
    }

    /// Returns the frozen provider set.
    #[must_use]
    pub fn providers(&self) -> &Arc<Providers> {
        &self.providers
    }

    /// Starts declaring the plugin `name`.
    ///
    /// The plugin is recorded only when [`PluginBuilder::finish`] succeeds.
    ///
    /// # Errors
    ///
    /// - [`DeclareError::RegistryFrozen`] after [`freeze`](Self::freeze)
    /// - [`DeclareError::DuplicatePlugin`] if `name` is already declared
    /// - [`DeclareError::InvalidId`] if `name` is not a valid plugin id
    pub fn builder(&mut self, name: &str) -> Result<PluginBuilder<'_>, DeclareError> {
        if self.frozen {
            return Err(DeclareError::RegistryFrozen(name.to_string()));
        }
        let id = PluginId::new(name)?;
        if self.plugins.contains_key(&id) {
            return Err(DeclareError::DuplicatePlugin(id));
        }

        Ok(PluginBuilder {
            providers: Arc::clone(&self.providers),
            registry: self,
            id,
            stamped: IndexMap::new(),
            internals: InternalValues::default(),
        })
    }

    /// Returns the descriptor of plugin `name`.
    #[must_use]
    pub fn plugin(&self, name: &str) -> Option<&PluginDescriptor> {
        self.plugins.get(name)
    }

    /// Iterates over declared plugins in declaration order.
    pub fn plugins(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.values()
    }

    /// Returns the number of declared plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if no plugin is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Returns true if some plugin declared `id`.
    #[must_use]
    pub fn contains(&self, id: &RawResourceId) -> bool {
        self.plugins
            .get(id.plugin())
            .is_some_and(|plugin| plugin.contains(id))
    }

    /// Returns the value kept for an [`internal`](Leaf::internal) resource.
    #[must_use]
    pub fn internal<I: Category, T: 'static>(&self, id: &ResourceId<I, T>) -> Option<&T> {
        self.internals.get::<T>(id.raw())
    }

    /// Closes the registry to further declarations.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Returns true once the registry is frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .field("frozen", &self.frozen)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// In-progress declaration of one plugin.
///
/// Obtained from [`PluginRegistry::builder`]. Dropping the builder without
/// calling [`finish`](Self::finish) discards the declaration.
pub struct PluginBuilder<'r> {
    registry: &'r mut PluginRegistry,
    providers: Arc<Providers>,
    id: PluginId,
    /// Stamped ids and whether each has been resolved.
    stamped: IndexMap<RawResourceId, bool>,
    internals: InternalValues,
}

impl PluginBuilder<'_> {
    /// Returns the id of the plugin being declared.
    #[must_use]
    pub fn id(&self) -> &PluginId {
        &self.id
    }

    /// Returns the provider set leaves are drawn from.
    #[must_use]
    pub fn providers(&self) -> Arc<Providers> {
        Arc::clone(&self.providers)
    }

    /// First pass: assigns the id `plugin:category:key`.
    ///
    /// # Errors
    ///
    /// - [`DeclareError::DuplicateResource`] if the pair was stamped before
    /// - [`DeclareError::InvalidId`] if `category` or `key` is invalid
    pub fn stamp(&mut self, category: &str, key: &str) -> Result<RawResourceId, DeclareError> {
        let id = self.id.resource(category, key)?;
        if self.stamped.contains_key(&id) {
            return Err(DeclareError::DuplicateResource(id));
        }
        self.stamped.insert(id.clone(), false);
        Ok(id)
    }

    /// Second pass: realizes a stamped leaf through its policy.
    ///
    /// # Errors
    ///
    /// - [`DeclareError::Unstamped`] if `id` was not stamped by this builder
    /// - [`DeclareError::AlreadyResolved`] on a second resolution
    /// - [`DeclareError::CategoryMismatch`] if the leaf is bound to another
    ///   category
    /// - any error returned by a fallible factory
    ///
    /// A failed resolution leaves the leaf unresolved.
    pub fn resolve<V: 'static>(&mut self, id: &RawResourceId, leaf: Leaf<V>) -> Result<V, DeclareError> {
        match self.stamped.get(id) {
            None => return Err(DeclareError::Unstamped(id.clone())),
            Some(true) => return Err(DeclareError::AlreadyResolved(id.clone())),
            Some(false) => {}
        }
        let value = leaf.resolve(id, &mut self.internals)?;
        if let Some(resolved) = self.stamped.get_mut(id) {
            *resolved = true;
        }
        Ok(value)
    }

    /// Stamps and resolves a single leaf.
    ///
    /// # Errors
    ///
    /// See [`stamp`](Self::stamp) and [`resolve`](Self::resolve).
    pub fn declare<V: 'static>(&mut self, category: &str, key: &str, leaf: Leaf<V>) -> Result<V, DeclareError> {
        let id = self.stamp(category, key)?;
        self.resolve(&id, leaf)
    }

    /// Records the plugin in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`DeclareError::Unresolved`] if a stamped leaf was never
    /// resolved.
    pub fn finish(self) -> Result<PluginId, DeclareError> {
        if let Some((id, _)) = self.stamped.iter().find(|(_, resolved)| !**resolved) {
            return Err(DeclareError::Unresolved(id.clone()));
        }

        let descriptor = PluginDescriptor {
            id: self.id.clone(),
            resources: self.stamped.into_keys().collect(),
        };
        tracing::debug!(
            plugin = %self.id,
            resources = descriptor.resources.len(),
            "declared plugin"
        );

        self.registry.internals.absorb(self.internals);
        self.registry.plugins.insert(self.id.clone(), descriptor);
        Ok(self.id)
    }
}
