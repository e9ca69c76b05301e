//! The status model.
//!
//! A [`Status`] is the value that travels down an effect pipeline when
//! something goes wrong (or, with [`ResultCode::Ok`], a structured non-error
//! outcome). Its identity is itself a resource: plugins declare status
//! factories under the `status` category and every status created by such a
//! factory carries the factory's id.
//!
//! Statuses travel through the runtime in their erased form
//! ([`Status<Params>`], params as JSON). [`StatusFactory::cast`] recovers the
//! typed form.
//!
//! # Example
//!
//! ```
//! use meridian_resource::id::PluginId;
//! use meridian_resource::status::{ResultCode, StatusFactory, StatusId};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct Text {
//!     text: String,
//! }
//!
//! let plugin = PluginId::new("demo").unwrap();
//! let factory = StatusFactory::<Text>::new(StatusId::new(&plugin, "Err").unwrap(), ResultCode::Error);
//!
//! let status = factory.erased(Text { text: "boom".into() });
//! assert_eq!(status.id().as_str(), "demo:status:Err");
//!
//! let typed = factory.cast(&status).unwrap();
//! assert_eq!(typed.params().text, "boom");
//! ```

use core::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::builtin;
use crate::id::{Category, ResourceId};
use crate::intl::IntlString;
use crate::leaf::Leaf;
use crate::provider::ResourceProvider;

/// Untyped status parameters.
pub type Params = serde_json::Value;

/// Category tag of status resources.
#[derive(Debug, Clone, Copy)]
pub struct StatusCategory;

impl Category for StatusCategory {
    const NAME: &'static str = "status";
}

/// Id of a status whose parameters have type `P`.
pub type StatusId<P = Params> = ResourceId<StatusCategory, P>;

// ─────────────────────────────────────────────────────────────────────────────
// ResultCode
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome class of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultCode {
    /// Structured non-error outcome.
    Ok,
    /// Failure.
    Error,
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::Error => f.write_str("error"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// An immutable, identified outcome with parameters.
///
/// The optional `message` names a localized string formatted with the same
/// parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status<P = Params> {
    id: StatusId<P>,
    result: ResultCode,
    params: P,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<IntlString<P>>,
}

impl<P> Status<P> {
    /// Returns the status id.
    #[must_use]
    pub fn id(&self) -> &StatusId<P> {
        &self.id
    }

    /// Returns the outcome class.
    #[must_use]
    pub fn result(&self) -> ResultCode {
        self.result
    }

    /// Returns true for [`ResultCode::Error`].
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.result == ResultCode::Error
    }

    /// Returns the parameters.
    #[must_use]
    pub fn params(&self) -> &P {
        &self.params
    }

    /// Consumes the status, returning its parameters.
    #[must_use]
    pub fn into_params(self) -> P {
        self.params
    }

    /// Returns the localized message id, if the status has one.
    #[must_use]
    pub fn message(&self) -> Option<&IntlString<P>> {
        self.message.as_ref()
    }
}

impl<P: Serialize> Status<P> {
    /// Converts to the untyped form carried by effect nodes.
    ///
    /// Parameters that cannot be represented as JSON are dropped: the erased
    /// status carries `null` and a warning is logged. Use
    /// [`try_erase`](Self::try_erase) to detect that case.
    #[must_use]
    pub fn erase(self) -> Status {
        let params = serde_json::to_value(&self.params).unwrap_or_else(|err| {
            tracing::warn!(status = %self.id, error = %err, "status params are not serializable, dropping them");
            Params::Null
        });
        self.with_params(params)
    }

    /// Converts to the untyped form carried by effect nodes.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if the parameters cannot be
    /// represented as JSON.
    pub fn try_erase(self) -> Result<Status, serde_json::Error> {
        let params = serde_json::to_value(&self.params)?;
        Ok(self.with_params(params))
    }

    fn with_params(self, params: Params) -> Status {
        Status {
            id: self.id.retype(),
            result: self.result,
            params,
            message: self.message.map(ResourceId::retype),
        }
    }
}

impl Status {
    /// Builds an untyped status directly.
    #[must_use]
    pub fn new(id: StatusId, result: ResultCode, params: Params) -> Self {
        Self {
            id,
            result,
            params,
            message: None,
        }
    }
}

impl<P: fmt::Debug> fmt::Display for Status<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {:?}", self.id, self.result, self.params)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StatusFactory
// ─────────────────────────────────────────────────────────────────────────────

/// Creates statuses of one id and checks incoming statuses against it.
pub struct StatusFactory<P = Params> {
    id: StatusId<P>,
    result: ResultCode,
    message: Option<IntlString<P>>,
}

impl<P> StatusFactory<P> {
    /// Creates a factory for `id`.
    #[must_use]
    pub fn new(id: StatusId<P>, result: ResultCode) -> Self {
        Self {
            id,
            result,
            message: None,
        }
    }

    /// Attaches a localized message to every created status.
    #[must_use]
    pub fn with_message(mut self, message: IntlString<P>) -> Self {
        self.message = Some(message);
        self
    }

    /// Returns the id stamped on created statuses.
    #[must_use]
    pub fn id(&self) -> &StatusId<P> {
        &self.id
    }

    /// Returns the outcome class of created statuses.
    #[must_use]
    pub fn result(&self) -> ResultCode {
        self.result
    }

    /// Creates a typed status.
    #[must_use]
    pub fn create(&self, params: P) -> Status<P> {
        Status {
            id: self.id.clone(),
            result: self.result,
            params,
            message: self.message.clone(),
        }
    }

    /// Returns true if `status` carries this factory's id.
    #[must_use]
    pub fn matches(&self, status: &Status) -> bool {
        status.id() == self.id.raw()
    }
}

impl<P> Clone for StatusFactory<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            result: self.result,
            message: self.message.clone(),
        }
    }
}

impl<P> PartialEq for StatusFactory<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.result == other.result && self.message == other.message
    }
}

impl<P> fmt::Debug for StatusFactory<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusFactory")
            .field("id", &self.id)
            .field("result", &self.result)
            .field("message", &self.message)
            .finish()
    }
}

impl<P: Serialize> StatusFactory<P> {
    /// Creates a status and erases it for delivery through effect nodes.
    ///
    /// Parameters that cannot be represented as JSON are dropped and the
    /// status carries `null`. See [`Status::try_erase`].
    #[must_use]
    pub fn erased(&self, params: P) -> Status {
        self.create(params).erase()
    }
}

impl<P: DeserializeOwned> StatusFactory<P> {
    /// Recovers the typed form of `status`.
    ///
    /// # Errors
    ///
    /// Returns a `platform:status:CastException` status naming the rejected
    /// id when `status` was not created by this factory or its parameters do
    /// not have the expected shape. The rejected parameters are not echoed.
    pub fn cast(&self, status: &Status) -> Result<Status<P>, Status> {
        if !self.matches(status) {
            return Err(builtin::cast_exception(status.id().raw()));
        }
        let params = serde_json::from_value::<P>(status.params().clone())
            .map_err(|_| builtin::cast_exception(status.id().raw()))?;
        Ok(Status {
            id: self.id.clone(),
            result: status.result(),
            params,
            message: status.message().cloned().map(ResourceId::retype),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StatusProvider
// ─────────────────────────────────────────────────────────────────────────────

/// Provider of the `status` category.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use meridian_resource::provider::ProviderRegistry;
/// use meridian_resource::registry::PluginRegistry;
/// use meridian_resource::status::{ResultCode, StatusFactory, StatusProvider};
///
/// let mut providers = ProviderRegistry::new();
/// providers.register(StatusProvider).unwrap();
/// let mut registry = PluginRegistry::new(Arc::new(providers.freeze()));
///
/// let mut builder = registry.builder("demo").unwrap();
/// let leaf = builder.providers().get::<StatusProvider>().unwrap().status(ResultCode::Error);
/// let factory: StatusFactory<u32> = builder.declare("status", "Err", leaf).unwrap();
/// builder.finish().unwrap();
///
/// assert_eq!(factory.create(7).id().as_str(), "demo:status:Err");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusProvider;

impl ResourceProvider for StatusProvider {
    type Category = StatusCategory;
}

impl StatusProvider {
    /// A status factory named after its resource id.
    #[must_use]
    pub fn status<P: 'static>(&self, result: ResultCode) -> Leaf<StatusFactory<P>> {
        Leaf::factory(move |id| StatusFactory::new(ResourceId::from_raw_unchecked(id.clone()), result))
            .in_category::<StatusCategory>()
    }

    /// Like [`status`](Self::status), attaching a localized message.
    #[must_use]
    pub fn status_with_message<P: 'static>(
        &self,
        result: ResultCode,
        message: IntlString<P>,
    ) -> Leaf<StatusFactory<P>> {
        self.status(result).map(move |factory| factory.with_message(message))
    }
}
