//! Resource identities.
//!
//! Every resource a plugin declares is addressed by a three-part id,
//! `plugin:category:key`. The untyped form is [`RawResourceId`]; the typed
//! form [`ResourceId<I, T>`] additionally carries the category tag `I` and the
//! payload type `T` at compile time. Neither tag is inspected at runtime beyond
//! the category name check performed on construction.
//!
//! # Example
//!
//! ```
//! use meridian_resource::id::{Category, PluginId, RawResourceId, ResourceId};
//!
//! struct Class;
//! impl Category for Class {
//!     const NAME: &'static str = "class";
//! }
//!
//! struct Document;
//!
//! let plugin = PluginId::new("core").unwrap();
//! let id = ResourceId::<Class, Document>::new(&plugin, "Doc").unwrap();
//! assert_eq!(id.to_string(), "core:class:Doc");
//!
//! let raw = RawResourceId::parse("core:class:Doc").unwrap();
//! assert_eq!(id.raw(), &raw);
//! ```

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::str::FromStr;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Separates the parts of a resource id.
pub const SEPARATOR: char = ':';

// ─────────────────────────────────────────────────────────────────────────────
// Category
// ─────────────────────────────────────────────────────────────────────────────

/// Zero-sized tag naming a resource category.
///
/// Categories partition a plugin's resources (`status`, `string`, `class`,
/// ...). Each category is served by at most one
/// [`ResourceProvider`](crate::provider::ResourceProvider).
///
/// # Example
///
/// ```
/// use meridian_resource::id::Category;
///
/// pub struct Class;
///
/// impl Category for Class {
///     const NAME: &'static str = "class";
/// }
/// ```
pub trait Category: 'static {
    /// The category name used as the middle part of resource ids.
    const NAME: &'static str;
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised while building or parsing resource ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceIdError {
    /// The text does not have exactly three `:`-separated parts.
    #[error("`{0}` is not a resource id, expected `plugin:category:key`")]
    Malformed(String),
    /// One of the parts is empty or contains the separator.
    #[error("{part} `{value}` must be non-empty and must not contain `:`")]
    InvalidPart {
        /// Which part was rejected (`plugin`, `category` or `key`).
        part: &'static str,
        /// The rejected value.
        value: String,
    },
    /// The id names a different category than the typed id expects.
    #[error("resource `{id}` belongs to category `{found}`, not `{expected}`")]
    CategoryMismatch {
        /// The offending id.
        id: String,
        /// The category required by the typed id.
        expected: &'static str,
        /// The category found in the id.
        found: String,
    },
}

fn validate(part: &'static str, value: &str) -> Result<(), ResourceIdError> {
    if value.is_empty() || value.contains(SEPARATOR) {
        return Err(ResourceIdError::InvalidPart {
            part,
            value: value.to_string(),
        });
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Name of a declared plugin, the first part of every id it owns.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(Arc<str>);

impl PluginId {
    /// Creates a plugin id.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceIdError::InvalidPart`] if `name` is empty or
    /// contains `:`.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ResourceIdError> {
        let name = name.as_ref();
        validate("plugin", name)?;
        Ok(Self(Arc::from(name)))
    }

    /// Returns the plugin name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the id of a resource owned by this plugin.
    ///
    /// # Errors
    ///
    /// Returns an error if `category` or `key` is not a valid id part.
    pub fn resource(&self, category: &str, key: &str) -> Result<RawResourceId, ResourceIdError> {
        RawResourceId::new(self.as_str(), category, key)
    }
}

impl core::borrow::Borrow<str> for PluginId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PluginId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PluginId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PluginId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::new(name).map_err(D::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RawResourceId
// ─────────────────────────────────────────────────────────────────────────────

/// Untyped resource id, `plugin:category:key`.
///
/// Cloning is cheap: the text is shared.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawResourceId {
    repr: Arc<str>,
    category_at: usize,
    key_at: usize,
}

impl RawResourceId {
    /// Assembles an id from its three parts.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceIdError::InvalidPart`] if any part is empty or
    /// contains `:`.
    pub fn new(plugin: &str, category: &str, key: &str) -> Result<Self, ResourceIdError> {
        validate("plugin", plugin)?;
        validate("category", category)?;
        validate("key", key)?;
        Ok(Self::assemble(plugin, category, key))
    }

    /// Parses `plugin:category:key`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceIdError::Malformed`] unless the text consists of
    /// exactly three non-empty parts.
    pub fn parse(text: &str) -> Result<Self, ResourceIdError> {
        let mut parts = text.split(SEPARATOR);
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(plugin), Some(category), Some(key), None)
                if !plugin.is_empty() && !category.is_empty() && !key.is_empty() =>
            {
                Ok(Self::assemble(plugin, category, key))
            }
            _ => Err(ResourceIdError::Malformed(text.to_string())),
        }
    }

    /// Joins parts that are already known to be valid.
    pub(crate) fn assemble(plugin: &str, category: &str, key: &str) -> Self {
        let repr: Arc<str> = Arc::from(format!("{plugin}{SEPARATOR}{category}{SEPARATOR}{key}"));
        let category_at = plugin.len() + 1;
        let key_at = category_at + category.len() + 1;
        Self {
            repr,
            category_at,
            key_at,
        }
    }

    /// Returns the plugin part.
    #[must_use]
    pub fn plugin(&self) -> &str {
        &self.repr[..self.category_at - 1]
    }

    /// Returns the plugin part as a [`PluginId`].
    #[must_use]
    pub fn plugin_id(&self) -> PluginId {
        PluginId(Arc::from(self.plugin()))
    }

    /// Returns the category part.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.repr[self.category_at..self.key_at - 1]
    }

    /// Returns the key part.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.repr[self.key_at..]
    }

    /// Returns the full `plugin:category:key` text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.repr
    }
}

impl FromStr for RawResourceId {
    type Err = ResourceIdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl fmt::Debug for RawResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawResourceId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for RawResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RawResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RawResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(D::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourceId
// ─────────────────────────────────────────────────────────────────────────────

/// Typed resource id.
///
/// `I` is the [`Category`] tag and `T` the payload type the id refers to.
/// Both are phantom: a `ResourceId` is just a [`RawResourceId`] whose
/// category has been checked against `I::NAME`.
pub struct ResourceId<I, T> {
    raw: RawResourceId,
    _marker: PhantomData<fn() -> (I, T)>,
}

impl<I: Category, T> ResourceId<I, T> {
    /// Creates the id `plugin:I::NAME:key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not a valid id part.
    pub fn new(plugin: &PluginId, key: &str) -> Result<Self, ResourceIdError> {
        let raw = plugin.resource(I::NAME, key)?;
        Ok(Self::from_raw_unchecked(raw))
    }

    /// Wraps a raw id after checking its category.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceIdError::CategoryMismatch`] if the raw id does not
    /// belong to `I`.
    pub fn from_raw(raw: RawResourceId) -> Result<Self, ResourceIdError> {
        if raw.category() != I::NAME {
            return Err(ResourceIdError::CategoryMismatch {
                id: raw.to_string(),
                expected: I::NAME,
                found: raw.category().to_string(),
            });
        }
        Ok(Self::from_raw_unchecked(raw))
    }

    /// Parses and category-checks `plugin:category:key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed or names another category.
    pub fn parse(text: &str) -> Result<Self, ResourceIdError> {
        Self::from_raw(RawResourceId::parse(text)?)
    }
}

impl<I, T> ResourceId<I, T> {
    pub(crate) fn from_raw_unchecked(raw: RawResourceId) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the untyped id.
    #[must_use]
    pub fn raw(&self) -> &RawResourceId {
        &self.raw
    }

    /// Consumes the typed id, returning the untyped one.
    #[must_use]
    pub fn into_raw(self) -> RawResourceId {
        self.raw
    }

    /// Returns the plugin part.
    #[must_use]
    pub fn plugin(&self) -> &str {
        self.raw.plugin()
    }

    /// Returns the category part.
    #[must_use]
    pub fn category(&self) -> &str {
        self.raw.category()
    }

    /// Returns the key part.
    #[must_use]
    pub fn key(&self) -> &str {
        self.raw.key()
    }

    /// Returns the full `plugin:category:key` text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.raw.as_str()
    }

    /// Reinterprets the payload type, keeping the id unchanged.
    #[must_use]
    pub fn retype<U>(self) -> ResourceId<I, U> {
        ResourceId::from_raw_unchecked(self.raw)
    }
}

impl<I, T> Clone for ResourceId<I, T> {
    fn clone(&self) -> Self {
        Self::from_raw_unchecked(self.raw.clone())
    }
}

impl<I, T> PartialEq for ResourceId<I, T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<I, T> Eq for ResourceId<I, T> {}

impl<I, T> PartialEq<RawResourceId> for ResourceId<I, T> {
    fn eq(&self, other: &RawResourceId) -> bool {
        &self.raw == other
    }
}

impl<I, T> Hash for ResourceId<I, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<I, T> fmt::Debug for ResourceId<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceId").field(&self.as_str()).finish()
    }
}

impl<I, T> fmt::Display for ResourceId<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<I, T> Serialize for ResourceId<I, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de, I: Category, T> Deserialize<'de> for ResourceId<I, T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawResourceId::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(D::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourceType
// ─────────────────────────────────────────────────────────────────────────────

/// Zero-sized handle for a category and payload type.
///
/// Used where a value is needed only to drive type inference.
pub struct ResourceType<I, T>(PhantomData<fn() -> (I, T)>);

impl<I: Category, T> ResourceType<I, T> {
    /// Returns the handle.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }

    /// Returns the category name.
    #[must_use]
    pub fn id(&self) -> &'static str {
        I::NAME
    }

    /// Builds the typed id of `key` in `plugin`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not a valid id part.
    pub fn resource(&self, plugin: &PluginId, key: &str) -> Result<ResourceId<I, T>, ResourceIdError> {
        ResourceId::new(plugin, key)
    }
}

impl<I: Category, T> Default for ResourceType<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, T> Clone for ResourceType<I, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, T> Copy for ResourceType<I, T> {}

impl<I: Category, T> fmt::Debug for ResourceType<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceType").field(&I::NAME).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Class;
    impl Category for Class {
        const NAME: &'static str = "class";
    }

    struct Other;
    impl Category for Other {
        const NAME: &'static str = "other";
    }

    #[test]
    fn raw_id_parts() {
        let id = RawResourceId::new("core", "class", "Doc").unwrap();
        assert_eq!(id.plugin(), "core");
        assert_eq!(id.category(), "class");
        assert_eq!(id.key(), "Doc");
        assert_eq!(id.as_str(), "core:class:Doc");
        assert_eq!(id.plugin_id(), PluginId::new("core").unwrap());
    }

    #[test]
    fn parse_requires_three_parts() {
        assert!(RawResourceId::parse("a:b:c").is_ok());
        for bad in ["", "a", "a:b", "a:b:c:d", "a::c", ":b:c", "a:b:"] {
            assert_eq!(
                RawResourceId::parse(bad),
                Err(ResourceIdError::Malformed(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_parts_are_named() {
        let err = RawResourceId::new("core", "", "Doc").unwrap_err();
        assert_eq!(
            err,
            ResourceIdError::InvalidPart {
                part: "category",
                value: String::new(),
            }
        );
        assert!(PluginId::new("a:b").is_err());
    }

    #[test]
    fn typed_id_checks_category() {
        let raw = RawResourceId::parse("core:class:Doc").unwrap();
        assert!(ResourceId::<Class, ()>::from_raw(raw.clone()).is_ok());

        let err = ResourceId::<Other, ()>::from_raw(raw).unwrap_err();
        assert!(matches!(err, ResourceIdError::CategoryMismatch { expected: "other", .. }));
    }

    #[test]
    fn retype_keeps_id() {
        let plugin = PluginId::new("core").unwrap();
        let id = ResourceId::<Class, u32>::new(&plugin, "Doc").unwrap();
        let retyped: ResourceId<Class, String> = id.clone().retype();
        assert_eq!(retyped.raw(), id.raw());
    }

    #[test]
    fn serializes_as_text() {
        let id = ResourceId::<Class, ()>::parse("core:class:Doc").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"core:class:Doc\"");

        let back: ResourceId<Class, ()> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let wrong: Result<ResourceId<Other, ()>, _> = serde_json::from_str(&json);
        assert!(wrong.is_err());
    }

    #[test]
    fn resource_type_names_category() {
        let ty = ResourceType::<Class, ()>::new();
        assert_eq!(ty.id(), "class");
        let plugin = PluginId::new("core").unwrap();
        assert_eq!(ty.resource(&plugin, "Doc").unwrap().as_str(), "core:class:Doc");
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        fn part() -> impl Strategy<Value = String> {
            "[A-Za-z0-9_.-]{1,12}"
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(256))]

            /// Valid parts always assemble into an id that parses back to
            /// the same parts.
            #[test]
            fn parse_recovers_parts(plugin in part(), category in part(), key in part()) {
                let text = format!("{plugin}:{category}:{key}");
                let id = RawResourceId::parse(&text).unwrap();
                prop_assert_eq!(id.plugin(), plugin.as_str());
                prop_assert_eq!(id.category(), category.as_str());
                prop_assert_eq!(id.key(), key.as_str());
                prop_assert_eq!(id, RawResourceId::new(&plugin, &category, &key).unwrap());
            }

            /// Any text without exactly two separators is rejected.
            #[test]
            fn wrong_separator_count_is_rejected(
                parts in prop::collection::vec(part(), 1..6usize)
                    .prop_filter("three parts parse", |parts| parts.len() != 3)
            ) {
                let text = parts.join(":");
                prop_assert!(RawResourceId::parse(&text).is_err());
            }
        }
    }
}
