//! Platform startup.
//!
//! [`PlatformBuilder`] collects [`Module`]s, runs their lifecycle in
//! dependency order and produces a running [`Platform`]:
//!
//! ```text
//! add_modules ─► build (providers open) ─► freeze providers ─► ready (declare plugins) ─► Platform
//! ```
//!
//! # Example
//!
//! ```
//! use futures::executor::LocalPool;
//! use meridian_platform::prelude::*;
//!
//! let pool = LocalPool::new();
//! let mut builder = PlatformBuilder::new(Locale::with_country("en", "US"));
//! builder.add_modules(CoreModules::new(IoConfig::new(pool.spawner())).build());
//! let platform = builder.finish().unwrap();
//!
//! assert!(platform.contains_api::<IoRuntime>());
//! assert!(platform.registry().plugin("platform").is_some());
//! ```

use core::any::TypeId;
use core::fmt;
use core::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use meridian_resource::provider::{ProviderRegistry, Providers, ResourceProvider};
use meridian_resource::registry::PluginRegistry;

use crate::api::{Api, BoxedApi};
use crate::error::{Phase, PlatformBuildError};
use crate::locale::Locale;
use crate::module::{Module, ModuleId, Modules};

/// Internal entry for an added module.
struct ModuleEntry {
    id: ModuleId,
    module: Box<dyn Module>,
    /// Cached for logs and error messages.
    name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// PlatformBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Collects modules and starts the platform.
///
/// Modules receive `&mut PlatformBuilder` in both lifecycle steps. What they
/// may do depends on the current [`Phase`]:
///
/// | Operation | Collect | Build | Ready |
/// |-----------|---------|-------|-------|
/// | [`add_modules`](Self::add_modules) | ✓ | ✓ | panics |
/// | [`register_provider`](Self::register_provider) | ✓ | ✓ | error |
/// | [`insert_api`](Self::insert_api) | ✓ | ✓ | ✓ |
/// | [`registry_mut`](Self::registry_mut) | error | error | ✓ |
pub struct PlatformBuilder {
    locale: Locale,
    phase: Phase,
    apis: HashMap<TypeId, BoxedApi>,
    /// Modules added but not yet built.
    pending: Vec<ModuleEntry>,
    /// Modules built so far, in build order.
    built: Vec<ModuleEntry>,
    /// For duplicate detection.
    module_ids: HashSet<ModuleId>,
    providers: ProviderRegistry,
    /// Replaced by one over the frozen providers when the ready phase begins.
    registry: PluginRegistry,
}

impl PlatformBuilder {
    /// A builder for a platform running in `locale`.
    #[must_use]
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            phase: Phase::Collect,
            apis: HashMap::new(),
            pending: Vec::new(),
            built: Vec::new(),
            module_ids: HashSet::new(),
            providers: ProviderRegistry::new(),
            registry: PluginRegistry::new(Arc::new(Providers::default())),
        }
    }

    /// Returns the platform locale.
    #[must_use]
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Modules
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds a module or a [`ModuleGroupBuilder`](crate::module::ModuleGroupBuilder).
    ///
    /// Modules added from another module's `build()` are built after the
    /// current batch.
    ///
    /// # Panics
    ///
    /// - If a unique module is added twice
    /// - If called during the ready phase
    pub fn add_modules<M: Modules>(&mut self, modules: M) -> &mut Self {
        modules.add_to_platform(self);
        self
    }

    pub(crate) fn add_module_boxed(&mut self, id: ModuleId, module: Box<dyn Module>) {
        let name = module.name().to_string();

        assert!(
            self.phase != Phase::Ready,
            "Module '{name}' was added during the ready phase.\n\
             Add modules before `finish()` or from another module's `build()`."
        );
        if module.is_unique() && self.module_ids.contains(&id) {
            panic!(
                "Module '{}' is unique and was already added.\n\
                 If you intended to add this module multiple times, \
                 set `is_unique()` to return `false`.",
                name
            );
        }

        self.module_ids.insert(id);
        self.pending.push(ModuleEntry { id, module, name });
    }

    /// Returns true if a module of type `M` was added.
    #[must_use]
    pub fn has_module<M: Module>(&self) -> bool {
        self.module_ids.contains(&ModuleId::of::<M>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Providers and Plugins
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers a resource provider.
    ///
    /// # Errors
    ///
    /// - [`PlatformBuildError::WrongPhase`] once providers are frozen
    /// - [`PlatformBuildError::Registry`] if the provider or its category is
    ///   already registered
    pub fn register_provider<P: ResourceProvider>(&mut self, provider: P) -> Result<&mut Self, PlatformBuildError> {
        if self.phase == Phase::Ready {
            return Err(PlatformBuildError::WrongPhase {
                operation: "register_provider",
                phase: self.phase,
            });
        }
        self.providers.register(provider)?;
        Ok(self)
    }

    /// Returns the frozen providers, once the ready phase has begun.
    #[must_use]
    pub fn providers(&self) -> Option<&Arc<Providers>> {
        (self.phase == Phase::Ready).then(|| self.registry.providers())
    }

    /// Returns the plugin registry to declare into.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformBuildError::WrongPhase`] before the ready phase.
    pub fn registry_mut(&mut self) -> Result<&mut PluginRegistry, PlatformBuildError> {
        if self.phase != Phase::Ready {
            return Err(PlatformBuildError::WrongPhase {
                operation: "registry_mut",
                phase: self.phase,
            });
        }
        Ok(&mut self.registry)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // APIs
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts an API, returning the one it replaces.
    pub fn insert_api<A: Api>(&mut self, api: A) -> Option<A> {
        insert_api(&mut self.apis, api)
    }

    /// Returns the API of type `A`.
    #[must_use]
    pub fn api<A: Api>(&self) -> Option<&A> {
        get_api(&self.apis)
    }

    /// Returns the API of type `A` on behalf of `module`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformBuildError::MissingApi`] if no module inserted it.
    pub fn require_api<A: Api>(&self, module: &str) -> Result<&A, PlatformBuildError> {
        self.api::<A>().ok_or_else(|| PlatformBuildError::MissingApi {
            module: module.to_string(),
            api: core::any::type_name::<A>(),
        })
    }

    /// Returns true if an API of type `A` exists.
    #[must_use]
    pub fn contains_api<A: Api>(&self) -> bool {
        self.apis.contains_key(&TypeId::of::<A>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Startup
    // ─────────────────────────────────────────────────────────────────────────

    /// Runs every module's lifecycle and returns the running platform.
    ///
    /// 1. Sorts modules by their dependencies
    /// 2. Calls `build()` on each, in order
    /// 3. Freezes the providers and opens the plugin registry
    /// 4. Calls `ready()` on each, in order
    ///
    /// # Errors
    ///
    /// - [`PlatformBuildError::MissingDependency`] or
    ///   [`PlatformBuildError::CircularDependency`] if modules cannot be
    ///   ordered
    /// - the first error returned by a module
    pub fn finish(mut self) -> Result<Platform, PlatformBuildError> {
        tracing::info!(
            name = env!("CARGO_PKG_NAME"),
            version = env!("CARGO_PKG_VERSION"),
            license = env!("CARGO_PKG_LICENSE"),
            locale = %self.locale,
            "starting platform"
        );

        self.phase = Phase::Build;
        loop {
            let batch = self.sort_pending()?;
            if batch.is_empty() {
                break;
            }
            for entry in batch {
                tracing::info!("initializing `{}` module...", entry.name);
                entry.module.build(&mut self)?;
                self.built.push(entry);
            }
        }

        let providers = core::mem::take(&mut self.providers).freeze();
        self.registry = PluginRegistry::new(Arc::new(providers));
        self.phase = Phase::Ready;

        let built = core::mem::take(&mut self.built);
        for entry in &built {
            entry.module.ready(&mut self)?;
        }

        tracing::info!(modules = built.len(), plugins = self.registry.len(), "platform ready");

        Ok(Platform {
            locale: self.locale,
            apis: self.apis,
            registry: self.registry,
            modules: built.into_iter().map(|entry| entry.name).collect(),
        })
    }

    /// Drains the pending modules in dependency order.
    ///
    /// Dependencies on already built modules are satisfied.
    fn sort_pending(&mut self) -> Result<Vec<ModuleEntry>, PlatformBuildError> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id: HashMap<ModuleId, Vec<usize>> = HashMap::new();
        for (i, entry) in self.pending.iter().enumerate() {
            by_id.entry(entry.id).or_default().push(i);
        }

        let n = self.pending.len();
        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, entry) in self.pending.iter().enumerate() {
            for dep in entry.module.dependencies() {
                if let Some(indices) = by_id.get(&dep) {
                    for &dep_idx in indices.iter().filter(|&&dep_idx| dep_idx != i) {
                        dependents[dep_idx].push(i);
                        in_degree[i] += 1;
                    }
                } else if !self.built.iter().any(|built| built.id == dep) {
                    return Err(PlatformBuildError::MissingDependency {
                        module: entry.name.clone(),
                        dependency: dep.type_name(),
                    });
                }
            }
        }

        // Kahn's algorithm, always taking the earliest added module that is free
        let mut queue: BinaryHeap<Reverse<usize>> = (0..n).filter(|&i| in_degree[i] == 0).map(Reverse).collect();
        let mut sorted: Vec<usize> = Vec::with_capacity(n);

        while let Some(Reverse(idx)) = queue.pop() {
            sorted.push(idx);
            for &dependent in &dependents[idx] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push(Reverse(dependent));
                }
            }
        }

        if sorted.len() != n {
            let in_cycle = in_degree
                .iter()
                .enumerate()
                .filter(|(_, degree)| **degree > 0)
                .map(|(i, _)| self.pending[i].name.clone())
                .collect();
            return Err(PlatformBuildError::CircularDependency(in_cycle));
        }

        let mut slots: Vec<Option<ModuleEntry>> = core::mem::take(&mut self.pending).into_iter().map(Some).collect();
        Ok(sorted.into_iter().filter_map(|i| slots[i].take()).collect())
    }
}

impl fmt::Debug for PlatformBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformBuilder")
            .field("locale", &self.locale)
            .field("phase", &self.phase)
            .field("pending", &self.pending.iter().map(|entry| &entry.name).collect::<Vec<_>>())
            .field("apis", &self.apis.len())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Platform
// ─────────────────────────────────────────────────────────────────────────────

/// A started platform: its APIs and the plugin registry.
///
/// The registry stays open so the application can declare its own plugins
/// until [`freeze_plugins`](Self::freeze_plugins) is called.
pub struct Platform {
    locale: Locale,
    apis: HashMap<TypeId, BoxedApi>,
    registry: PluginRegistry,
    modules: Vec<String>,
}

impl Platform {
    /// Shorthand for [`PlatformBuilder::new`].
    #[must_use]
    pub fn builder(locale: Locale) -> PlatformBuilder {
        PlatformBuilder::new(locale)
    }

    /// Returns the platform locale.
    #[must_use]
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Returns the API of type `A`.
    #[must_use]
    pub fn api<A: Api>(&self) -> Option<&A> {
        get_api(&self.apis)
    }

    /// Returns true if an API of type `A` exists.
    #[must_use]
    pub fn contains_api<A: Api>(&self) -> bool {
        self.apis.contains_key(&TypeId::of::<A>())
    }

    /// Returns the frozen providers.
    #[must_use]
    pub fn providers(&self) -> &Arc<Providers> {
        self.registry.providers()
    }

    /// Returns the plugin registry.
    #[must_use]
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Returns the plugin registry for further declarations.
    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    /// Closes the plugin registry.
    pub fn freeze_plugins(&mut self) {
        self.registry.freeze();
    }

    /// Names of the started modules, in build order.
    #[must_use]
    pub fn modules(&self) -> &[String] {
        &self.modules
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("locale", &self.locale)
            .field("modules", &self.modules)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn insert_api<A: Api>(apis: &mut HashMap<TypeId, BoxedApi>, api: A) -> Option<A> {
    apis.insert(TypeId::of::<A>(), Box::new(api))
        .and_then(|old| old.downcast::<A>().ok())
        .map(|old| *old)
}

fn get_api<A: Api>(apis: &HashMap<TypeId, BoxedApi>) -> Option<&A> {
    apis.get(&TypeId::of::<A>())
        .and_then(|boxed| boxed.downcast_ref::<A>())
}
