//! Single-settlement effect nodes for Meridian (Layer 2).
//!
//! An effect node takes one input, runs an operation and settles exactly once
//! with a value or a failure [`Status`](meridian_resource::status::Status).
//! Nodes are composed by subscription: piping one node into another feeds the
//! second with the first's result, and failures flow downstream unchanged.
//!
//! - [`node`] - the [`Io`](node::Io) handle, pipes and switches
//! - [`runtime`] - [`IoRuntime`], which creates nodes
//! - [`coroutine`] - sequential programs over nodes
//! - [`config`] - error conversion, failure handling and spawning
//! - [`diagnostic`] - rendering of node graphs
//!
//! Everything here is single-threaded: nodes are `Rc`-shared and deliver
//! synchronously in the stack of whoever settles them. Async operations run
//! on a local spawner such as [`futures::executor::LocalPool`] or a
//! [`tokio::task::LocalSet`].

/// Compact subscriber lists.
pub mod comp_list;

/// Runtime configuration.
pub mod config;

/// Coroutine programs.
pub mod coroutine;

/// Node graph diagnostics.
pub mod diagnostic;

/// Effect nodes.
pub mod node;

/// The node factory.
pub mod runtime;

/// Sinks and producers.
pub mod sink;

pub use runtime::IoRuntime;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::comp_list::CompList;
    pub use crate::config::{BoxError, IoConfig, TokioSpawner};
    pub use crate::coroutine::{Co, Yield};
    pub use crate::diagnostic::{Diagnostic, print_diagnostic, render_diagnostic};
    pub use crate::node::Io;
    pub use crate::pipe;
    pub use crate::runtime::IoRuntime;
    pub use crate::sink::{Out, Sink, State};
}
