//! Integration tests for localized status messages.
//!
//! A `demo` module declares a status carrying a localized message and
//! registers a string loader; the tests translate that message through the
//! platform's [`I18n`] API.


use futures::executor::LocalPool;
use meridian_io::prelude::*;
use meridian_platform::prelude::*;
use meridian_resource::builtin::{MISSING_STRING, NO_STRING_LOADER, UNSUPPORTED_LOCALE};
use meridian_resource::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use test_utils::{Counter, start};

// ═══════════════════════════════════════════════════════════════════════════════
// DEMO MODULE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
}

plugin! {
    pub struct Demo = "demo" |p| {
        status {
            Err: StatusFactory<Text> = p
                .get::<StatusProvider>()?
                .status_with_message(ResultCode::Error, ResourceId::parse("demo:string:Err")?),
        }
        string {
            Err: IntlString<Text> = p.get::<IntlProvider>()?.string(),
            Missing: IntlString = p.get::<IntlProvider>()?.string(),
        }
    }
}

impl Api for Demo {}

/// Declares [`Demo`] and serves English strings, counting loader calls.
struct DemoModule {
    loads: Counter,
    asynchronous: bool,
}

impl Module for DemoModule {
    fn build(&self, _platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        Ok(())
    }

    fn ready(&self, platform: &mut PlatformBuilder) -> Result<(), PlatformBuildError> {
        let demo = Demo::declare(platform.registry_mut()?)?;
        let io = platform.require_api::<IoRuntime>(self.name())?.clone();
        let loads = self.loads.clone();
        let asynchronous = self.asynchronous;

        platform
            .require_api::<I18n>(self.name())?
            .set_loader(&demo.id, move || {
                loads.hit();
                if asynchronous {
                    io.async_io(|locale: Locale| async move { english(&locale) })
                } else {
                    io.try_sync_io(|locale: Locale| english(&locale))
                }
            });
        platform.insert_api(demo);
        Ok(())
    }

    fn dependencies(&self) -> Vec<ModuleId> {
        vec![ModuleId::of::<I18nModule>()]
    }
}

fn english(locale: &Locale) -> Result<LocalizedStrings, PlatformError> {
    if locale.language() != "en" {
        return Err(PlatformError(meridian_resource::builtin::unsupported_locale(locale)));
    }
    Ok(LocalizedStrings::from([("Err".to_string(), "Error: {text}".to_string())]))
}

fn demo_platform(pool: &LocalPool, asynchronous: bool) -> (Platform, Counter) {
    let loads = Counter::default();
    let platform = start(
        pool,
        DemoModule {
            loads: loads.clone(),
            asynchronous,
        },
    );
    (platform, loads)
}

fn failure_key(node: &Io<Locale, String>) -> String {
    match node.result() {
        Some(Err(status)) => status.id().key().to_string(),
        other => panic!("expected a failure, got {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSLATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn status_message_is_translated_with_its_params() {
    let pool = LocalPool::new();
    let (platform, _) = demo_platform(&pool, false);
    let demo = platform.api::<Demo>().unwrap();
    let i18n = platform.api::<I18n>().unwrap();

    let status = demo.status.Err.create(Text { text: "boom".into() });
    assert_eq!(status.id().as_str(), "demo:status:Err");
    let message = status.message().unwrap();
    assert_eq!(message, &demo.string.Err);

    let text = i18n.translate(message, status.params());
    text.success(platform.locale().clone());
    assert_eq!(text.result(), Some(Ok("Error: boom".to_string())));
}

#[test]
fn loader_runs_once_per_plugin_and_locale() {
    let pool = LocalPool::new();
    let (platform, loads) = demo_platform(&pool, false);
    let demo = platform.api::<Demo>().unwrap();
    let i18n = platform.api::<I18n>().unwrap();

    for word in ["one", "two"] {
        let text = i18n.translate(&demo.string.Err, &Text { text: word.into() });
        text.success(Locale::new("en"));
        assert_eq!(text.result(), Some(Ok(format!("Error: {word}"))));
    }
    assert_eq!(loads.get(), 1);

    let text = i18n.translate(&demo.string.Err, &Text { text: "x".into() });
    text.success(Locale::with_country("en", "GB"));
    assert_eq!(loads.get(), 2);
    assert_eq!(text.result(), Some(Ok("Error: x".to_string())));
}

#[test]
fn concurrent_translations_share_one_async_load() {
    let mut pool = LocalPool::new();
    let (platform, loads) = demo_platform(&pool, true);
    let demo = platform.api::<Demo>().unwrap();
    let i18n = platform.api::<I18n>().unwrap();

    let first = i18n.translate(&demo.string.Err, &Text { text: "a".into() });
    let second = i18n.translate(&demo.string.Err, &Text { text: "b".into() });
    first.success(Locale::new("en"));
    second.success(Locale::new("en"));
    assert_eq!(first.state(), State::Pending);
    assert_eq!(second.state(), State::Pending);

    pool.run_until_stalled();
    assert_eq!(loads.get(), 1);
    assert_eq!(first.result(), Some(Ok("Error: a".to_string())));
    assert_eq!(second.result(), Some(Ok("Error: b".to_string())));
}

// ═══════════════════════════════════════════════════════════════════════════════
// FAILURES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn unsupported_locale_fails_and_is_cached() {
    let pool = LocalPool::new();
    let (platform, loads) = demo_platform(&pool, false);
    let demo = platform.api::<Demo>().unwrap();
    let i18n = platform.api::<I18n>().unwrap();

    for _ in 0..2 {
        let text = i18n.translate(&demo.string.Err, &Text { text: "x".into() });
        text.success(Locale::new("fr"));
        assert_eq!(failure_key(&text), UNSUPPORTED_LOCALE);
    }
    assert_eq!(loads.get(), 1);
}

#[test]
fn missing_message_fails() {
    let pool = LocalPool::new();
    let (platform, _) = demo_platform(&pool, false);
    let demo = platform.api::<Demo>().unwrap();
    let i18n = platform.api::<I18n>().unwrap();

    let text = i18n.translate(&demo.string.Missing, &json!({}));
    text.success(Locale::new("en"));
    assert_eq!(failure_key(&text), MISSING_STRING);
    match text.result() {
        Some(Err(status)) => assert_eq!(status.params(), &json!({ "id": "demo:string:Missing" })),
        other => panic!("expected a failure, got {other:?}"),
    }
}

#[test]
fn plugin_without_loader_fails() {
    let pool = LocalPool::new();
    let platform = start(&pool, ModuleGroupBuilder::new());
    let i18n = platform.api::<I18n>().unwrap();
    let orphan: IntlString = ResourceId::parse("orphan:string:Hello").unwrap();

    assert!(!i18n.has_loader(&PluginId::new("orphan").unwrap()));
    let text = i18n.translate(&orphan, &json!({}));
    text.success(Locale::new("en"));
    assert_eq!(failure_key(&text), NO_STRING_LOADER);
}

#[test]
fn failed_translation_reaches_the_failure_callback() {
    let pool = LocalPool::new();
    let (platform, _) = demo_platform(&pool, false);
    let demo = platform.api::<Demo>().unwrap();
    let i18n = platform.api::<I18n>().unwrap();

    let observed = Counter::default();
    let seen = observed.clone();
    let text = i18n.translate(&demo.string.Missing, &json!({}));
    text.subscribe(|_| panic!("must not succeed"), move |_| seen.hit());
    text.success(Locale::new("en"));
    assert_eq!(observed.get(), 1);
}
