//! Receivers and producers of settled values.
//!
//! A [`Sink<T>`] receives exactly one settlement: a success value or a failure
//! [`Status`]. An [`Out<O>`] is anything that can deliver its settlement to a
//! sink. Effect nodes are both: a sink of their input and an out of their
//! result.

use core::fmt;
use std::rc::{Rc, Weak};

use meridian_resource::status::Status;

use crate::diagnostic::Diagnostic;

/// Settlement state of an effect node.
///
/// A node leaves `Pending` at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Not settled yet.
    Pending,
    /// Settled with a value.
    Success,
    /// Settled with a status.
    Failure,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
        })
    }
}

/// Receiver of one settlement.
pub trait Sink<T> {
    /// Delivers a success value.
    fn success(&self, value: T);

    /// Delivers a failure status.
    fn failure(&self, status: Status);

    /// Returns the node behind this sink, if it is one.
    ///
    /// Used to walk the node graph when rendering diagnostics. The node is
    /// held weakly, so rendering never keeps it alive.
    fn downstream(&self) -> Option<Weak<dyn Diagnostic>> {
        None
    }
}

impl<T, S: Sink<T> + ?Sized> Sink<T> for Rc<S> {
    fn success(&self, value: T) {
        (**self).success(value);
    }

    fn failure(&self, status: Status) {
        (**self).failure(status);
    }

    fn downstream(&self) -> Option<Weak<dyn Diagnostic>> {
        (**self).downstream()
    }
}

/// Producer of one settlement.
pub trait Out<O> {
    /// Subscribes `sink`.
    ///
    /// If the producer has already settled, the result is replayed to `sink`
    /// before this returns.
    fn pipe(&self, sink: Rc<dyn Sink<O>>);
}

/// Handler invoked for failures nobody asked to see.
pub type FailureHandler = Rc<dyn Fn(&Status)>;

/// A sink built from closures.
///
/// Without a failure callback, failures go to the fallback handler.
pub(crate) struct FnSink<T> {
    on_success: Box<dyn Fn(T)>,
    on_failure: Option<Box<dyn Fn(Status)>>,
    fallback: FailureHandler,
}

impl<T> FnSink<T> {
    pub(crate) fn new(
        on_success: Box<dyn Fn(T)>,
        on_failure: Option<Box<dyn Fn(Status)>>,
        fallback: FailureHandler,
    ) -> Self {
        Self {
            on_success,
            on_failure,
            fallback,
        }
    }
}

impl<T> Sink<T> for FnSink<T> {
    fn success(&self, value: T) {
        (self.on_success)(value);
    }

    fn failure(&self, status: Status) {
        match &self.on_failure {
            Some(on_failure) => on_failure(status),
            None => (self.fallback)(&status),
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use meridian_resource::builtin;

    use super::*;

    #[test]
    fn state_display() {
        assert_eq!(State::Pending.to_string(), "pending");
        assert_eq!(State::Success.to_string(), "success");
        assert_eq!(State::Failure.to_string(), "failure");
    }

    #[test]
    fn missing_failure_callback_uses_fallback() {
        let fallback_seen = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&fallback_seen);
        let sink = FnSink::<u32>::new(
            Box::new(|_| {}),
            None,
            Rc::new(move |status: &Status| seen.borrow_mut().push(status.id().to_string())),
        );

        sink.failure(builtin::unknown_error("boom"));
        assert_eq!(*fallback_seen.borrow(), vec!["platform:status:UnknownError"]);
    }

    #[test]
    fn failure_callback_wins_over_fallback() {
        let hits = Rc::new(RefCell::new(0));
        let counted = Rc::clone(&hits);
        let sink = FnSink::<u32>::new(
            Box::new(|_| {}),
            Some(Box::new(move |_| *counted.borrow_mut() += 1)),
            Rc::new(|_: &Status| panic!("fallback must not run")),
        );

        sink.failure(builtin::unknown_error("boom"));
        assert_eq!(*hits.borrow(), 1);
    }
}
