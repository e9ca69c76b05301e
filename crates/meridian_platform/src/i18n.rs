//! Localized strings.
//!
//! Each plugin registers a *loader*: a function producing a node that maps a
//! [`Locale`] to the plugin's message templates. [`I18n::translate`] turns an
//! [`IntlString`] and its parameters into an effect node yielding the
//! formatted text.
//!
//! A loader runs at most once per `(plugin, locale)`. Its node is cached, so
//! callers translating concurrently subscribe to the same node and receive
//! its result by replay.
//!
//! Templates substitute `{name}` with the parameter `name`. String
//! parameters are inserted verbatim, others in their JSON form. Unknown
//! placeholders are left as they are.
//!
//! # Example
//!
//! ```
//! use futures::executor::LocalPool;
//! use meridian_io::prelude::*;
//! use meridian_platform::prelude::*;
//! use meridian_resource::prelude::*;
//! use serde_json::json;
//!
//! let pool = LocalPool::new();
//! let io = IoRuntime::new(IoConfig::new(pool.spawner()));
//! let i18n = I18n::new(io.clone());
//!
//! let plugin = PluginId::new("demo").unwrap();
//! let loader_io = io.clone();
//! i18n.set_loader(&plugin, move || {
//!     loader_io.sync_io(|_: Locale| {
//!         LocalizedStrings::from([("Hello".to_string(), "Hello, {name}!".to_string())])
//!     })
//! });
//!
//! let hello: IntlString = IntlString::parse("demo:string:Hello").unwrap();
//! let text = i18n.translate(&hello, &json!({ "name": "Ada" }));
//! text.success(Locale::new("en"));
//! assert_eq!(text.result(), Some(Ok("Hello, Ada!".to_string())));
//! ```

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use meridian_io::IoRuntime;
use meridian_io::coroutine::Co;
use meridian_io::node::Io;
use meridian_resource::builtin::{self, PlatformError};
use meridian_resource::id::PluginId;
use meridian_resource::intl::IntlString;
use meridian_resource::status::{Params, Status};
use serde::Serialize;

use crate::api::Api;
use crate::locale::Locale;

/// Message templates of one plugin in one locale, keyed by message key.
pub type LocalizedStrings = HashMap<String, String>;

type Loader = Rc<dyn Fn() -> Io<Locale, LocalizedStrings>>;

struct I18nInner {
    runtime: IoRuntime,
    loaders: RefCell<HashMap<PluginId, Loader>>,
    cache: RefCell<HashMap<(PluginId, Locale), Io<Locale, LocalizedStrings>>>,
}

/// The localization API.
///
/// Cheap to clone; clones share loaders and cache.
#[derive(Clone)]
pub struct I18n {
    inner: Rc<I18nInner>,
}

impl Api for I18n {}

impl I18n {
    /// A localization service creating its nodes on `runtime`.
    #[must_use]
    pub fn new(runtime: IoRuntime) -> Self {
        Self {
            inner: Rc::new(I18nInner {
                runtime,
                loaders: RefCell::new(HashMap::new()),
                cache: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Sets the string loader of `plugin`, replacing any previous one.
    ///
    /// Bundles already loaded through the previous loader stay cached.
    pub fn set_loader(&self, plugin: &PluginId, loader: impl Fn() -> Io<Locale, LocalizedStrings> + 'static) {
        tracing::debug!(plugin = %plugin, "string loader registered");
        self.inner
            .loaders
            .borrow_mut()
            .insert(plugin.clone(), Rc::new(loader));
    }

    /// Returns true if `plugin` has a loader.
    #[must_use]
    pub fn has_loader(&self, plugin: &PluginId) -> bool {
        self.inner.loaders.borrow().contains_key(plugin)
    }

    /// The node loading the strings of `plugin` in `locale`.
    ///
    /// The returned node is already fed. Without a loader it fails with
    /// `platform:status:NoStringLoader`; that failure is not cached.
    #[must_use]
    pub fn strings(&self, plugin: &PluginId, locale: &Locale) -> Io<Locale, LocalizedStrings> {
        let key = (plugin.clone(), locale.clone());
        if let Some(node) = self.inner.cache.borrow().get(&key) {
            return node.clone();
        }

        let loader = self.inner.loaders.borrow().get(plugin).cloned();
        let Some(loader) = loader else {
            let status = builtin::no_string_loader(plugin);
            let node = self
                .inner
                .runtime
                .try_sync_io(move |_: Locale| Err::<LocalizedStrings, _>(PlatformError(status)));
            node.success(locale.clone());
            return node;
        };

        tracing::debug!(plugin = %plugin, locale = %locale, "loading strings");
        let node = loader();
        self.inner.cache.borrow_mut().insert(key, node.clone());
        node.success(locale.clone());
        node
    }

    /// A node formatting `message` with `params` in the locale it is fed.
    ///
    /// Fails with `platform:status:NoStringLoader` if the message's plugin
    /// has no loader, with `platform:status:MissingString` if the loaded
    /// bundle lacks the message, or with whatever status the loader fails
    /// with (such as `platform:status:UnsupportedLocale`).
    #[must_use]
    pub fn translate<P: Serialize>(&self, message: &IntlString<P>, params: &P) -> Io<Locale, String> {
        let i18n = self.clone();
        let id = message.raw().clone();
        let params = serde_json::to_value(params).map_err(|err| builtin::unknown_error(err.to_string()));

        self.inner.runtime.coroutine(move |co: Co, locale: Locale| async move {
            let params = params?;
            let strings = co.wait(&i18n.strings(&id.plugin_id(), &locale)).await;
            let template = strings.get(id.key()).ok_or_else(|| builtin::missing_string(&id))?;
            Ok::<_, Status>(format_message(template, &params))
        })
    }
}

impl fmt::Debug for I18n {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I18n")
            .field("loaders", &self.inner.loaders.borrow().len())
            .field("cached", &self.inner.cache.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Substitutes `{name}` placeholders in `template` with fields of `params`.
#[must_use]
pub fn format_message(template: &str, params: &Params) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        let name = &after[..close];
        match params.get(name) {
            Some(Params::String(text)) => out.push_str(text),
            Some(value) => out.push_str(&value.to_string()),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}
