//! Integration tests for module ordering, phases and the platform plugin.


use futures::executor::LocalPool;
use meridian_platform::prelude::*;
use meridian_resource::builtin::{self, PlatformError, UNKNOWN_ERROR};
use meridian_resource::prelude::*;
use test_utils::{Journal, core_modules, start};

// ═══════════════════════════════════════════════════════════════════════════════
// MODULES UNDER TEST
// ═══════════════════════════════════════════════════════════════════════════════

macro_rules! recording_module {
    ($name:ident, $label:literal $(, deps = [$($dep:ty),*])?) => {
        struct $name(Journal);

        impl Module for $name {
            fn build(&self, _platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
                self.0.log(concat!("build ", $label));
                Ok(())
            }

            fn ready(&self, _platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
                self.0.log(concat!("ready ", $label));
                Ok(())
            }

            fn name(&self) -> &str {
                $label
            }

            fn dependencies(&self) -> Vec<ModuleId> {
                vec![$($(ModuleId::of::<$dep>()),*)?]
            }
        }
    };
}

recording_module!(Net, "net");
recording_module!(Store, "store", deps = [Net]);
recording_module!(Ui, "ui", deps = [Store, Net]);
recording_module!(Audio, "audio");
recording_module!(Ping, "ping", deps = [Pong]);
recording_module!(Pong, "pong", deps = [Ping]);

/// Added any number of times.
struct Counted(Journal);

impl Module for Counted {
    fn build(&self, _platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        self.0.log("build counted");
        Ok(())
    }

    fn is_unique(&self) -> bool {
        false
    }
}

/// Adds [`Audio`] from its own build step.
struct Installer(Journal);

impl Module for Installer {
    fn build(&self, platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        self.0.log("build installer");
        platform.add_modules(Audio(self.0.clone()));
        Ok(())
    }
}

/// Fails to build.
struct Broken;

impl Module for Broken {
    fn build(&self, _platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        Err(PlatformBuildError::MissingApi {
            module: "broken".to_string(),
            api: "Nothing",
        })
    }
}

/// Registers a provider too late.
struct LateProvider;

impl Module for LateProvider {
    fn build(&self, _platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        Ok(())
    }

    fn ready(&self, platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        platform.register_provider(IntlProvider)?;
        Ok(())
    }
}

/// Declares too early.
struct EarlyDeclare;

impl Module for EarlyDeclare {
    fn build(&self, platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        platform.registry_mut()?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORDERING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn modules_build_then_ready_in_dependency_order() {
    let journal = Journal::default();
    let mut builder = PlatformBuilder::new(Locale::default());
    builder
        .add_modules(Ui(journal.clone()))
        .add_modules(Store(journal.clone()))
        .add_modules(Net(journal.clone()));
    let platform = builder.finish().unwrap();

    assert_eq!(
        journal.entries(),
        ["build net", "build store", "build ui", "ready net", "ready store", "ready ui"]
    );
    assert_eq!(platform.modules(), ["net", "store", "ui"]);
}

#[test]
fn independent_modules_keep_insertion_order() {
    let journal = Journal::default();
    let mut builder = PlatformBuilder::new(Locale::default());
    builder.add_modules(Audio(journal.clone())).add_modules(Net(journal.clone()));
    builder.finish().unwrap();

    assert_eq!(journal.entries(), ["build audio", "build net", "ready audio", "ready net"]);
}

#[test]
fn module_added_during_build_is_built_next() {
    let journal = Journal::default();
    let mut builder = PlatformBuilder::new(Locale::default());
    builder.add_modules(Installer(journal.clone()));
    builder.finish().unwrap();

    assert_eq!(journal.entries(), ["build installer", "build audio", "ready audio"]);
}

#[test]
fn non_unique_module_runs_per_instance() {
    let journal = Journal::default();
    let mut builder = PlatformBuilder::new(Locale::default());
    builder
        .add_modules(Counted(journal.clone()))
        .add_modules(Counted(journal.clone()));
    builder.finish().unwrap();

    assert_eq!(journal.entries(), ["build counted", "build counted"]);
}

#[test]
fn group_modules_are_ordered_like_single_ones() {
    let journal = Journal::default();
    let group = ModuleGroupBuilder::new()
        .add(Store(journal.clone()))
        .add(Net(journal.clone()));
    let mut builder = PlatformBuilder::new(Locale::default());
    builder.add_modules(group);
    builder.finish().unwrap();

    assert_eq!(journal.entries()[..2], ["build net", "build store"]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// STARTUP ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn missing_dependency_is_reported() {
    let mut builder = PlatformBuilder::new(Locale::default());
    builder.add_modules(Store(Journal::default()));

    match builder.finish() {
        Err(PlatformBuildError::MissingDependency { module, dependency }) => {
            assert_eq!(module, "store");
            assert!(dependency.ends_with("Net"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn circular_dependency_is_reported() {
    let mut builder = PlatformBuilder::new(Locale::default());
    builder
        .add_modules(Ping(Journal::default()))
        .add_modules(Pong(Journal::default()));

    match builder.finish() {
        Err(PlatformBuildError::CircularDependency(names)) => {
            assert_eq!(names, ["ping", "pong"]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
#[should_panic(expected = "is unique and was already added")]
fn unique_module_added_twice_panics() {
    let mut builder = PlatformBuilder::new(Locale::default());
    builder
        .add_modules(Net(Journal::default()))
        .add_modules(Net(Journal::default()));
}

#[test]
fn failing_build_aborts_startup() {
    let journal = Journal::default();
    let mut builder = PlatformBuilder::new(Locale::default());
    builder.add_modules(Broken).add_modules(Net(journal.clone()));

    assert!(matches!(builder.finish(), Err(PlatformBuildError::MissingApi { .. })));
    assert!(journal.entries().is_empty());
}

#[test]
fn providers_close_when_ready_begins() {
    let mut builder = PlatformBuilder::new(Locale::default());
    builder.add_modules(LateProvider);

    assert_eq!(
        builder.finish().unwrap_err(),
        PlatformBuildError::WrongPhase {
            operation: "register_provider",
            phase: Phase::Ready,
        }
    );
}

#[test]
fn registry_opens_when_ready_begins() {
    let mut builder = PlatformBuilder::new(Locale::default());
    assert!(builder.registry_mut().is_err());
    builder.add_modules(EarlyDeclare);

    let err = builder.finish().unwrap_err();
    assert_eq!(
        err,
        PlatformBuildError::WrongPhase {
            operation: "registry_mut",
            phase: Phase::Build,
        }
    );
    assert_eq!(err.to_string(), "`registry_mut` is not available during the build phase");
}

#[test]
fn same_provider_twice_is_a_registry_error() {
    let pool = LocalPool::new();
    let mut builder = PlatformBuilder::new(Locale::default());
    builder.add_modules(core_modules(&pool));
    builder.register_provider(StatusProvider).unwrap();

    assert!(matches!(builder.finish(), Err(PlatformBuildError::Registry(_))));
}

#[test]
fn i18n_without_io_is_a_missing_dependency() {
    let mut builder = PlatformBuilder::new(Locale::default());
    builder.add_modules(I18nModule);

    match builder.finish() {
        Err(PlatformBuildError::MissingDependency { module, dependency }) => {
            assert_eq!(module, "i18n");
            assert!(dependency.ends_with("IoModule"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CORE MODULES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn core_modules_provide_apis_and_categories() {
    let pool = LocalPool::new();
    let platform = start(&pool, Net(Journal::default()));

    assert!(platform.contains_api::<IoRuntime>());
    assert!(platform.contains_api::<I18n>());
    assert!(platform.contains_api::<PlatformStatuses>());
    assert!(!platform.contains_api::<TracingConfig>());
    assert!(platform.providers().provider_of("status").is_some());
    assert!(platform.providers().provider_of("string").is_some());
    assert_eq!(platform.modules(), ["io", "status", "i18n", "net"]);
}

#[test]
fn platform_plugin_declares_built_in_statuses() {
    let pool = LocalPool::new();
    let platform = start(&pool, ModuleGroupBuilder::new());

    let descriptor = platform.registry().plugin("platform").unwrap();
    assert_eq!(descriptor.resources().len(), 5);

    let statuses = platform.api::<PlatformStatuses>().unwrap();
    assert_eq!(statuses.id.as_str(), "platform");
    assert_eq!(statuses.status.UnknownError.id().as_str(), "platform:status:UnknownError");
    assert!(platform.registry().contains(builtin::unsupported_locale("xx").id().raw()));

    let cast = statuses
        .status
        .NoStringLoader
        .cast(&builtin::no_string_loader(&PluginId::new("demo").unwrap()))
        .unwrap();
    assert_eq!(cast.params().plugin, "demo");

    let rejected = statuses.status.MissingString.cast(&builtin::unknown_error("x")).unwrap_err();
    assert_eq!(rejected.id().as_str(), statuses.status.CastException.id().as_str());
}

#[test]
fn application_declares_after_start_until_frozen() {
    plugin! {
        struct App = "app" |p| {
            status {
                Failed: StatusFactory = p.get::<StatusProvider>()?.status(ResultCode::Error),
            }
        }
    }

    let pool = LocalPool::new();
    let mut platform = start(&pool, ModuleGroupBuilder::new());

    let app = App::declare(platform.registry_mut()).unwrap();
    assert_eq!(app.status.Failed.id().as_str(), "app:status:Failed");
    assert!(matches!(
        PlatformStatuses::declare(platform.registry_mut()),
        Err(DeclareError::DuplicatePlugin(_))
    ));

    platform.freeze_plugins();
    assert!(matches!(
        App::declare(platform.registry_mut()),
        Err(DeclareError::RegistryFrozen(_))
    ));
}

#[test]
fn platform_runtime_converts_errors() {
    let pool = LocalPool::new();
    let platform = start(&pool, ModuleGroupBuilder::new());
    let io = platform.api::<IoRuntime>().unwrap();

    let foreign = io.try_sync_io(|_: ()| Err::<(), _>("socket closed"));
    foreign.success(());
    let status = foreign.result().unwrap().unwrap_err();
    assert_eq!(status.id().key(), UNKNOWN_ERROR);

    let known = io.try_sync_io(|_: ()| Err::<(), _>(PlatformError(builtin::unsupported_locale("tlh"))));
    known.success(());
    assert_eq!(known.result(), Some(Err(builtin::unsupported_locale("tlh"))));
}

#[test]
fn tracing_module_exposes_its_config() {
    let pool = LocalPool::new();
    let mut builder = PlatformBuilder::new(Locale::default());
    builder.add_modules(
        CoreModules::new(IoConfig::new(pool.spawner()))
            .with_tracing(TracingModule::new().with_format(TracingFormat::Compact))
            .build(),
    );
    let platform = builder.finish().unwrap();

    let config = platform.api::<TracingConfig>().unwrap();
    assert_eq!(config.format, TracingFormat::Compact);
    assert_eq!(platform.modules()[0], "tracing");
}

#[test]
fn insert_api_returns_the_replaced_value() {
    struct Answer(u32);
    impl Api for Answer {}

    let mut builder = PlatformBuilder::new(Locale::default());
    assert!(builder.insert_api(Answer(1)).is_none());
    assert_eq!(builder.insert_api(Answer(2)).map(|old| old.0), Some(1));
    assert_eq!(builder.api::<Answer>().map(|answer| answer.0), Some(2));
    assert!(builder.require_api::<IoRuntime>("test").is_err());
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════════

mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn position(order: &[&str], label: &str) -> usize {
        order
            .iter()
            .position(|entry| *entry == label)
            .unwrap_or_else(|| panic!("`{label}` was not built"))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// Whatever order modules are added in, each is built once after its
        /// dependencies, and `ready` follows the build order.
        #[test]
        fn dependencies_build_first_in_any_insertion_order(
            order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
        ) {
            let journal = Journal::default();
            let mut builder = PlatformBuilder::new(Locale::default());
            for index in order {
                match index {
                    0 => builder.add_modules(Net(journal.clone())),
                    1 => builder.add_modules(Store(journal.clone())),
                    2 => builder.add_modules(Ui(journal.clone())),
                    _ => builder.add_modules(Audio(journal.clone())),
                };
            }
            let platform = builder.finish().unwrap();

            let entries = journal.entries();
            let built: Vec<&str> = entries.iter().filter_map(|entry| entry.strip_prefix("build ")).collect();
            let readied: Vec<&str> = entries.iter().filter_map(|entry| entry.strip_prefix("ready ")).collect();

            prop_assert_eq!(built.len(), 4);
            prop_assert!(position(&built, "net") < position(&built, "store"));
            prop_assert!(position(&built, "store") < position(&built, "ui"));
            prop_assert_eq!(&readied, &built);
            prop_assert_eq!(platform.modules(), built.as_slice());
        }
    }
}
