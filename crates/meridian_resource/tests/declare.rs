//! Integration tests for plugin declaration through the `plugin!` macro.
//!
//! Covers the shape of the generated tree, the id assigned to every leaf
//! policy, the registry side table for internal values and the error paths a
//! declaration can take.

#![deny(unfulfilled_lint_expectations)]

mod test_utils;

use meridian_resource::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use test_utils::{Class, DocClass, registry, registry_with_statuses};

// ═══════════════════════════════════════════════════════════════════════════════
// PLUGINS UNDER TEST
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
}

plugin! {
    pub struct Demo = "demo" |p| {
        status {
            Err: StatusFactory<Text> = p.get::<StatusProvider>()?.status(ResultCode::Error),
            Done: StatusFactory<()> = p.get::<StatusProvider>()?.status(ResultCode::Ok),
        }
        class {
            Object: ResourceId<Class, DocClass> = Leaf::external(),
            Doc: ResourceId<Class, DocClass> = Leaf::internal(DocClass { label: "document" }),
        }
        r#const {
            N5: u32 = Leaf::value(5),
            Label: String = Leaf::factory(|id| format!("{id}-OK")),
        }
    }
}

plugin! {
    /// A plugin using no provider at all.
    struct Bare = "bare" {
        class {
            Thing: ResourceId<Class, ()> = Leaf::external(),
        }
    }
}

plugin! {
    struct NeedsStatus = "needs-status" |p| {
        status {
            Err: StatusFactory = p.get::<StatusProvider>()?.status(ResultCode::Error),
        }
    }
}

plugin! {
    /// Keys spelled in snake_case.
    struct Lower = "lower" {
        class {
            plain_thing: ResourceId<Class, ()> = Leaf::external(),
        }
        r#const {
            answer: u32 = Leaf::value(42),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TREE SHAPE AND IDS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn external_leaf_is_its_own_id() {
    let mut registry = registry_with_statuses();
    let demo = Demo::declare(&mut registry).unwrap();

    assert_eq!(demo.id.as_str(), "demo");
    assert_eq!(demo.class.Object.as_str(), "demo:class:Object");
    assert_eq!(demo.class.Object.plugin(), "demo");
    assert_eq!(demo.class.Object.category(), "class");
    assert_eq!(demo.class.Object.key(), "Object");
}

#[test]
fn internal_leaf_is_its_own_id_and_cached() {
    let mut registry = registry_with_statuses();
    let demo = Demo::declare(&mut registry).unwrap();

    assert_eq!(demo.class.Doc.as_str(), "demo:class:Doc");
    assert_eq!(
        registry.internal(&demo.class.Doc),
        Some(&DocClass { label: "document" })
    );
    assert_eq!(registry.internal(&demo.class.Object), None);
}

#[test]
fn factory_leaf_sees_its_id() {
    let mut registry = registry_with_statuses();
    let demo = Demo::declare(&mut registry).unwrap();

    assert_eq!(demo.r#const.Label, "demo:const:Label-OK");
    assert_eq!(demo.r#const.N5, 5);
}

#[test]
fn registry_records_every_resource() {
    let mut registry = registry_with_statuses();
    Demo::declare(&mut registry).unwrap();

    let plugin = registry.plugin(Demo::NAME).unwrap();
    let ids: Vec<&str> = plugin.resources().iter().map(RawResourceId::as_str).collect();
    assert_eq!(
        ids,
        vec![
            "demo:status:Err",
            "demo:status:Done",
            "demo:class:Object",
            "demo:class:Doc",
            "demo:const:N5",
            "demo:const:Label",
        ]
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATUS FACTORIES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn declared_status_creates_stamped_status() {
    let mut registry = registry_with_statuses();
    let demo = Demo::declare(&mut registry).unwrap();

    let status = demo.status.Err.create(Text { text: "boom".into() });
    assert_eq!(status.id().as_str(), "demo:status:Err");
    assert_eq!(status.result(), ResultCode::Error);
    assert_eq!(status.params(), &Text { text: "boom".into() });

    let erased = status.erase();
    assert_eq!(erased.params(), &json!({ "text": "boom" }));
}

#[test]
fn cast_between_declared_statuses() {
    let mut registry = registry_with_statuses();
    let demo = Demo::declare(&mut registry).unwrap();

    let err = demo.status.Err.erased(Text { text: "boom".into() });
    assert!(demo.status.Err.cast(&err).is_ok());

    let rejected = demo.status.Done.cast(&err).unwrap_err();
    assert_eq!(rejected.id().as_str(), "platform:status:CastException");
    assert_eq!(rejected.params(), &json!({ "id": "demo:status:Err" }));
}

#[test]
fn ok_status_keeps_result_code() {
    let mut registry = registry_with_statuses();
    let demo = Demo::declare(&mut registry).unwrap();

    let done = demo.status.Done.create(());
    assert_eq!(done.result(), ResultCode::Ok);
    assert!(!done.is_error());
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn plugin_is_declared_once() {
    let mut registry = registry_with_statuses();
    Demo::declare(&mut registry).unwrap();

    let err = Demo::declare(&mut registry).err().unwrap();
    assert!(matches!(err, DeclareError::DuplicatePlugin(ref id) if id.as_str() == "demo"));
}

#[test]
fn missing_provider_fails_declaration() {
    let mut registry = registry();
    let err = NeedsStatus::declare(&mut registry).err().unwrap();
    assert!(matches!(err, DeclareError::MissingProvider(_)));
    assert!(registry.plugin("needs-status").is_none());
}

#[test]
fn provider_free_plugin_declares_anywhere() {
    let mut registry = registry();
    let bare = Bare::declare(&mut registry).unwrap();
    assert_eq!(bare.class.Thing.as_str(), "bare:class:Thing");
    assert_eq!(registry.len(), 1);
}

#[test]
fn snake_case_keys_declare_cleanly() {
    let mut registry = registry();
    let lower = Lower::declare(&mut registry).unwrap();
    assert_eq!(lower.class.plain_thing.as_str(), "lower:class:plain_thing");
    assert_eq!(lower.r#const.answer, 42);
}

#[test]
fn frozen_registry_rejects_plugin() {
    let mut registry = registry();
    registry.freeze();
    assert!(matches!(
        Bare::declare(&mut registry),
        Err(DeclareError::RegistryFrozen(_))
    ));
}
