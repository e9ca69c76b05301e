//! Leaf policies.
//!
//! A [`Leaf`] describes how one entry of a plugin's resource tree is realized
//! once its id has been stamped:
//!
//! | Policy | Value |
//! |--------|-------|
//! | [`Leaf::external`] | the leaf's own typed id |
//! | [`Leaf::internal`] | the leaf's own typed id; the given value is kept in the registry |
//! | [`Leaf::factory`] | whatever the factory returns for the id, computed during declaration |
//! | [`Leaf::value`] | a plain constant |
//!
//! Providers build their leaves from the same constructors and bind them to
//! their category with [`Leaf::in_category`].

use core::any::Any;
use core::fmt;

use crate::id::{Category, RawResourceId, ResourceId};
use crate::registry::{DeclareError, InternalValues};

type Resolver<V> = Box<dyn FnOnce(&RawResourceId, &mut InternalValues) -> Result<V, DeclareError>>;

/// How a declared resource turns into its value.
pub struct Leaf<V> {
    category: Option<&'static str>,
    resolve: Resolver<V>,
}

impl<I: Category, T: 'static> Leaf<ResourceId<I, T>> {
    /// Resolves to the leaf's own id; nothing else is recorded.
    #[must_use]
    pub fn external() -> Self {
        Self {
            category: Some(I::NAME),
            resolve: Box::new(|id, _| Ok(ResourceId::from_raw_unchecked(id.clone()))),
        }
    }

    /// Resolves to the leaf's own id and keeps `value` in the registry,
    /// retrievable with [`PluginRegistry::internal`](crate::registry::PluginRegistry::internal).
    #[must_use]
    pub fn internal(value: T) -> Self {
        Self {
            category: Some(I::NAME),
            resolve: Box::new(move |id, internals| {
                internals.insert(id.clone(), Box::new(value) as Box<dyn Any>);
                Ok(ResourceId::from_raw_unchecked(id.clone()))
            }),
        }
    }
}

impl<V: 'static> Leaf<V> {
    /// Resolves to `factory(id)`.
    ///
    /// The factory runs during declaration, exactly once. A panic inside it
    /// propagates out of the declaration.
    #[must_use]
    pub fn factory(factory: impl FnOnce(&RawResourceId) -> V + 'static) -> Self {
        Self {
            category: None,
            resolve: Box::new(move |id, _| Ok(factory(id))),
        }
    }

    /// Like [`factory`](Self::factory) for factories that can fail.
    #[must_use]
    pub fn try_factory(
        factory: impl FnOnce(&RawResourceId) -> Result<V, DeclareError> + 'static,
    ) -> Self {
        Self {
            category: None,
            resolve: Box::new(move |id, _| factory(id)),
        }
    }

    /// Resolves to a constant.
    #[must_use]
    pub fn value(value: V) -> Self {
        Self {
            category: None,
            resolve: Box::new(move |_, _| Ok(value)),
        }
    }

    /// Restricts the leaf to resources of category `I`.
    #[must_use]
    pub fn in_category<I: Category>(mut self) -> Self {
        self.category = Some(I::NAME);
        self
    }

    /// Transforms the resolved value.
    #[must_use]
    pub fn map<U: 'static>(self, f: impl FnOnce(V) -> U + 'static) -> Leaf<U> {
        let resolve = self.resolve;
        Leaf {
            category: self.category,
            resolve: Box::new(move |id, internals| resolve(id, internals).map(f)),
        }
    }

    /// The category this leaf is bound to, if any.
    #[must_use]
    pub fn category(&self) -> Option<&'static str> {
        self.category
    }

    pub(crate) fn resolve(self, id: &RawResourceId, internals: &mut InternalValues) -> Result<V, DeclareError> {
        if let Some(expected) = self.category
            && id.category() != expected
        {
            return Err(DeclareError::CategoryMismatch {
                id: id.clone(),
                expected,
            });
        }
        (self.resolve)(id, internals)
    }
}

impl<V> fmt::Debug for Leaf<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}
