//! Modules: units of platform startup.
//!
//! A [`Module`] contributes to a platform in two steps:
//!
//! 1. **`build()`** registers resource providers and inserts APIs. Providers
//!    are still open, so every category a plugin may use must be registered
//!    here.
//! 2. **`ready()`** runs once every module is built and the providers are
//!    frozen. This is where plugins are declared, since their leaves draw
//!    on the frozen providers.
//!
//! Modules run in dependency order: a module listed in another's
//! [`dependencies`](Module::dependencies) is built, and readied, first.
//!
//! # Example
//!
//! ```
//! use meridian_platform::prelude::*;
//!
//! struct Greeter;
//!
//! impl Module for Greeter {
//!     fn build(&self, platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
//!         platform.insert_api(Greeting("hello"));
//!         Ok(())
//!     }
//! }
//!
//! struct Greeting(&'static str);
//! impl Api for Greeting {}
//!
//! let mut builder = PlatformBuilder::new(Locale::new("en"));
//! builder.add_modules(Greeter);
//! let platform = builder.finish().unwrap();
//! assert_eq!(platform.api::<Greeting>().map(|g| g.0), Some("hello"));
//! ```

use core::any::TypeId;

use crate::error::PlatformBuildError;
use crate::platform::PlatformBuilder;

// ─────────────────────────────────────────────────────────────────────────────
// ModuleId
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a module type.
///
/// Used to name dependencies and to detect duplicate unique modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ModuleId {
    /// The id of module type `M`.
    #[must_use]
    pub fn of<M: Module>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: core::any::type_name::<M>(),
        }
    }

    /// Returns the module's [`TypeId`].
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the module's type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Module Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of platform startup.
///
/// See the [module docs](self) for the lifecycle.
pub trait Module: 'static {
    /// Registers providers and APIs.
    ///
    /// # Errors
    ///
    /// Any error aborts startup.
    fn build(&self, platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError>;

    /// Declares plugins once all providers are frozen.
    ///
    /// # Errors
    ///
    /// Any error aborts startup.
    fn ready(&self, _platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        Ok(())
    }

    /// Name used in logs and error messages.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Modules that must be built before this one.
    fn dependencies(&self) -> Vec<ModuleId> {
        Vec::new()
    }

    /// Whether adding this module type twice is an error.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Modules Trait (for add_modules polymorphism)
// ─────────────────────────────────────────────────────────────────────────────

/// Anything [`PlatformBuilder::add_modules`] accepts: a single [`Module`] or
/// a [`ModuleGroupBuilder`].
pub trait Modules {
    /// Adds the module(s) to `platform`.
    fn add_to_platform(self, platform: &mut PlatformBuilder);
}

impl<M: Module> Modules for M {
    fn add_to_platform(self, platform: &mut PlatformBuilder) {
        platform.add_module_boxed(ModuleId::of::<M>(), Box::new(self));
    }
}

impl Modules for ModuleGroupBuilder {
    fn add_to_platform(self, platform: &mut PlatformBuilder) {
        for boxed in self.modules {
            platform.add_module_boxed(boxed.id, boxed.module);
        }
    }
}

/// A named bundle of modules.
pub trait ModuleGroup {
    /// Produces the bundle, which may still be edited before it is added.
    fn build(self) -> ModuleGroupBuilder;
}

// ─────────────────────────────────────────────────────────────────────────────
// ModuleGroupBuilder
// ─────────────────────────────────────────────────────────────────────────────

struct BoxedModule {
    id: ModuleId,
    module: Box<dyn Module>,
}

/// An ordered, editable list of modules.
///
/// # Example
///
/// ```
/// use meridian_platform::prelude::*;
///
/// struct A;
/// impl Module for A {
///     fn build(&self, _: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
///         Ok(())
///     }
/// }
///
/// struct B;
/// impl Module for B {
///     fn build(&self, _: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
///         Ok(())
///     }
/// }
///
/// let group = ModuleGroupBuilder::new().add(A).add(B).disable::<A>();
/// assert_eq!(group.len(), 1);
/// ```
#[derive(Default)]
pub struct ModuleGroupBuilder {
    modules: Vec<BoxedModule>,
}

impl ModuleGroupBuilder {
    /// An empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `module`.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add<M: Module>(mut self, module: M) -> Self {
        self.modules.push(boxed(module));
        self
    }

    /// Inserts `module` before `Target`, or first if `Target` is absent.
    #[must_use]
    pub fn add_before<M: Module, Target: Module>(mut self, module: M) -> Self {
        let position = self.position_of::<Target>().unwrap_or(0);
        self.modules.insert(position, boxed(module));
        self
    }

    /// Inserts `module` after `Target`, or last if `Target` is absent.
    #[must_use]
    pub fn add_after<M: Module, Target: Module>(mut self, module: M) -> Self {
        let position = self
            .position_of::<Target>()
            .map_or(self.modules.len(), |index| index + 1);
        self.modules.insert(position, boxed(module));
        self
    }

    /// Removes every module of type `M`.
    #[must_use]
    pub fn disable<M: Module>(mut self) -> Self {
        let id = ModuleId::of::<M>();
        self.modules.retain(|boxed| boxed.id != id);
        self
    }

    /// Returns true if a module of type `M` is in the group.
    #[must_use]
    pub fn contains<M: Module>(&self) -> bool {
        self.position_of::<M>().is_some()
    }

    /// Returns the number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if the group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|boxed| boxed.module.name())
    }

    fn position_of<M: Module>(&self) -> Option<usize> {
        let id = ModuleId::of::<M>();
        self.modules.iter().position(|boxed| boxed.id == id)
    }
}

fn boxed<M: Module>(module: M) -> BoxedModule {
    BoxedModule {
        id: ModuleId::of::<M>(),
        module: Box::new(module),
    }
}
