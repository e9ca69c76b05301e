//! Statuses owned by the `platform` plugin.
//!
//! The runtime itself reports a handful of failures: conversion of foreign
//! errors, rejected casts and missing localization. Their ids live under the
//! reserved `platform` plugin name so they can be produced before (or without)
//! any plugin declaration.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::{Category, PluginId, RawResourceId, ResourceId};
use crate::status::{ResultCode, Status, StatusCategory, StatusFactory, StatusId};

/// Name of the plugin owning the built-in statuses.
pub const PLATFORM_PLUGIN: &str = "platform";

/// Key of the status reported for errors without a status of their own.
pub const UNKNOWN_ERROR: &str = "UnknownError";
/// Key of the status reported by a rejected [`StatusFactory::cast`].
pub const CAST_EXCEPTION: &str = "CastException";
/// Key of the status reported when a plugin has no string loader.
pub const NO_STRING_LOADER: &str = "NoStringLoader";
/// Key of the status reported when a loaded bundle lacks a message.
pub const MISSING_STRING: &str = "MissingString";
/// Key of the status reported when a loader cannot serve a locale.
pub const UNSUPPORTED_LOCALE: &str = "UnsupportedLocale";

/// Parameters of `platform:status:UnknownError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownErrorParams {
    /// The error's display text.
    pub message: String,
}

/// Parameters of `platform:status:CastException`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastExceptionParams {
    /// Id of the status that failed the cast.
    pub id: String,
}

/// Parameters of `platform:status:NoStringLoader`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoStringLoaderParams {
    /// Plugin without a loader.
    pub plugin: String,
}

/// Parameters of `platform:status:MissingString`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingStringParams {
    /// Id of the missing message.
    pub id: String,
}

/// Parameters of `platform:status:UnsupportedLocale`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedLocaleParams {
    /// The rejected locale.
    pub locale: String,
}

/// Returns the id of the built-in status `key`.
#[must_use]
pub fn platform_status_id<P>(key: &str) -> StatusId<P> {
    ResourceId::from_raw_unchecked(RawResourceId::assemble(PLATFORM_PLUGIN, StatusCategory::NAME, key))
}

fn error<P: Serialize>(key: &str, params: P) -> Status {
    StatusFactory::new(platform_status_id::<P>(key), ResultCode::Error).erased(params)
}

/// `platform:status:UnknownError { message }`.
#[must_use]
pub fn unknown_error(message: impl Into<String>) -> Status {
    error(
        UNKNOWN_ERROR,
        UnknownErrorParams {
            message: message.into(),
        },
    )
}

/// `platform:status:CastException { id }`.
#[must_use]
pub fn cast_exception(id: &RawResourceId) -> Status {
    error(CAST_EXCEPTION, CastExceptionParams { id: id.to_string() })
}

/// `platform:status:NoStringLoader { plugin }`.
#[must_use]
pub fn no_string_loader(plugin: &PluginId) -> Status {
    error(
        NO_STRING_LOADER,
        NoStringLoaderParams {
            plugin: plugin.to_string(),
        },
    )
}

/// `platform:status:MissingString { id }`.
#[must_use]
pub fn missing_string(id: &RawResourceId) -> Status {
    error(MISSING_STRING, MissingStringParams { id: id.to_string() })
}

/// `platform:status:UnsupportedLocale { locale }`.
#[must_use]
pub fn unsupported_locale(locale: impl fmt::Display) -> Status {
    error(
        UNSUPPORTED_LOCALE,
        UnsupportedLocaleParams {
            locale: locale.to_string(),
        },
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// PlatformError
// ─────────────────────────────────────────────────────────────────────────────

/// An error that already knows its status.
///
/// Operations return it to fail with a specific status instead of the
/// generic `UnknownError`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct PlatformError(pub Status);

impl PlatformError {
    /// Returns the carried status.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.0
    }

    /// Consumes the error, returning the carried status.
    #[must_use]
    pub fn into_status(self) -> Status {
        self.0
    }
}

impl From<Status> for PlatformError {
    fn from(status: Status) -> Self {
        Self(status)
    }
}
