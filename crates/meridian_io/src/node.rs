//! Effect nodes and the [`Io`] handle.
//!
//! A node receives one input, runs its operation and settles exactly once.
//! Everything subscribed to the node is notified in subscription order, and
//! late subscribers get the stored result replayed.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use futures::executor::LocalPool;
//! use meridian_io::prelude::*;
//!
//! let pool = LocalPool::new();
//! let io = IoRuntime::new(IoConfig::new(pool.spawner()));
//!
//! let seen = Rc::new(Cell::new(0));
//! let out = Rc::clone(&seen);
//! let chain = io.success(111).then(&io.sync_io(|x: u32| x * 3));
//! chain.on_success(move |x| out.set(x));
//!
//! assert_eq!(seen.get(), 333);
//! ```

use core::cell::RefCell;
use core::fmt;
use core::mem;
use std::rc::{Rc, Weak};

use meridian_resource::status::Status;

use crate::comp_list::CompList;
use crate::config::BoxError;
use crate::diagnostic::{self, Diagnostic, MAX_DEPTH};
use crate::runtime::IoShared;
use crate::sink::{FnSink, Out, Sink, State};

// ─────────────────────────────────────────────────────────────────────────────
// NodeCore
// ─────────────────────────────────────────────────────────────────────────────

/// Stored settlement of a node.
#[derive(Clone)]
enum Outcome<O> {
    Pending,
    Success(O),
    Failure(Status),
}

struct CoreState<O> {
    outcome: Outcome<O>,
    /// Subscribers still waiting. Emptied when the node settles.
    out: CompList<Rc<dyn Sink<O>>>,
    /// Node subscribers, for rendering only.
    downstream: Vec<Weak<dyn Diagnostic>>,
}

/// Settlement and subscribers shared by every node kind.
pub(crate) struct NodeCore<O> {
    id: String,
    shared: Rc<IoShared>,
    state: RefCell<CoreState<O>>,
}

impl<O: Clone + 'static> NodeCore<O> {
    pub(crate) fn new(shared: &Rc<IoShared>) -> Self {
        Self::with_outcome(shared, Outcome::Pending)
    }

    pub(crate) fn succeeded(shared: &Rc<IoShared>, value: O) -> Self {
        Self::with_outcome(shared, Outcome::Success(value))
    }

    pub(crate) fn failed(shared: &Rc<IoShared>, status: Status) -> Self {
        Self::with_outcome(shared, Outcome::Failure(status))
    }

    fn with_outcome(shared: &Rc<IoShared>, outcome: Outcome<O>) -> Self {
        Self {
            id: shared.next_id("io-"),
            shared: Rc::clone(shared),
            state: RefCell::new(CoreState {
                outcome,
                out: CompList::Empty,
                downstream: Vec::new(),
            }),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn shared(&self) -> &Rc<IoShared> {
        &self.shared
    }

    pub(crate) fn state(&self) -> State {
        match self.state.borrow().outcome {
            Outcome::Pending => State::Pending,
            Outcome::Success(_) => State::Success,
            Outcome::Failure(_) => State::Failure,
        }
    }

    pub(crate) fn result(&self) -> Option<Result<O, Status>> {
        match &self.state.borrow().outcome {
            Outcome::Pending => None,
            Outcome::Success(value) => Some(Ok(value.clone())),
            Outcome::Failure(status) => Some(Err(status.clone())),
        }
    }

    /// Settles with `value` and notifies subscribers. Ignored once settled.
    pub(crate) fn succeed(&self, value: O) {
        let Some(sinks) = self.settle(Outcome::Success(value.clone())) else {
            return;
        };
        tracing::debug!(node = %self.id, sinks = sinks.len(), "settled success");
        for sink in sinks {
            sink.success(value.clone());
        }
    }

    /// Settles with `status` and notifies subscribers. Ignored once settled.
    pub(crate) fn fail(&self, status: Status) {
        let Some(sinks) = self.settle(Outcome::Failure(status.clone())) else {
            return;
        };
        tracing::debug!(node = %self.id, status = %status.id(), sinks = sinks.len(), "settled failure");
        for sink in sinks {
            sink.failure(status.clone());
        }
    }

    /// Stores the outcome and hands over the subscribers to notify.
    ///
    /// The borrow is released before anyone is notified, so subscribers may
    /// pipe into this node while being notified.
    fn settle(&self, outcome: Outcome<O>) -> Option<CompList<Rc<dyn Sink<O>>>> {
        let mut state = self.state.borrow_mut();
        if !matches!(state.outcome, Outcome::Pending) {
            tracing::warn!(node = %self.id, "node already settled, ignoring");
            return None;
        }
        state.outcome = outcome;
        Some(mem::take(&mut state.out))
    }

    /// Subscribes `sink`, or replays the outcome to it if settled.
    ///
    /// A settled node does not keep the sink.
    pub(crate) fn pipe(&self, sink: Rc<dyn Sink<O>>) {
        let replay = {
            let mut state = self.state.borrow_mut();
            if let Some(node) = sink.downstream() {
                state.downstream.retain(|live| live.strong_count() > 0);
                state.downstream.push(node);
            }
            if matches!(state.outcome, Outcome::Pending) {
                state.out.push(sink);
                return;
            }
            state.outcome.clone()
        };
        match replay {
            Outcome::Pending => {}
            Outcome::Success(value) => sink.success(value),
            Outcome::Failure(status) => sink.failure(status),
        }
    }

    pub(crate) fn error_to_status(&self, error: BoxError) -> Status {
        self.shared.config().error_to_status(error)
    }

    pub(crate) fn render(&self, level: usize, out: &mut String) {
        if level > MAX_DEPTH {
            diagnostic::write_elided(level, out);
            return;
        }
        diagnostic::write_line(level, &self.id, &self.state(), out);
        let downstream: Vec<Rc<dyn Diagnostic>> = self
            .state
            .borrow()
            .downstream
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for node in downstream {
            node.render(level + 1, out);
        }
    }
}

/// A type-erased node with input `I` and output `O`.
pub(crate) trait IoNode<I, O>: Sink<I> + Diagnostic {
    fn pipe(&self, sink: Rc<dyn Sink<O>>);

    fn shared(&self) -> &Rc<IoShared>;

    fn result(&self) -> Option<Result<O, Status>>;
}

/// Implements [`Diagnostic`] and [`IoNode`] for a node kind whose settlement
/// lives in a `core: NodeCore<O>` field.
macro_rules! core_node {
    ($node:ident<$($param:ident),*>, $input:ty, $output:ty) => {
        impl<$($param: 'static),*> $crate::diagnostic::Diagnostic for $node<$($param),*>
        where
            $output: Clone,
        {
            fn id(&self) -> &str {
                self.core.id()
            }

            fn state(&self) -> $crate::sink::State {
                self.core.state()
            }

            fn render(&self, level: usize, out: &mut String) {
                self.core.render(level, out);
            }
        }

        impl<$($param: 'static),*> $crate::node::IoNode<$input, $output> for $node<$($param),*>
        where
            $output: Clone,
        {
            fn pipe(&self, sink: ::std::rc::Rc<dyn $crate::sink::Sink<$output>>) {
                self.core.pipe(sink);
            }

            fn shared(&self) -> &::std::rc::Rc<$crate::runtime::IoShared> {
                self.core.shared()
            }

            fn result(&self) -> Option<Result<$output, ::meridian_resource::status::Status>> {
                self.core.result()
            }
        }
    };
}

pub(crate) use core_node;

// ─────────────────────────────────────────────────────────────────────────────
// Io
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to an effect node taking `I` and settling with `O`.
///
/// Cloning the handle shares the node. Nodes are created by
/// [`IoRuntime`](crate::IoRuntime).
pub struct Io<I, O> {
    node: Rc<dyn IoNode<I, O>>,
}

impl<I, O> Clone for Io<I, O> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<I: 'static, O: Clone + 'static> Io<I, O> {
    pub(crate) fn from_node(node: Rc<dyn IoNode<I, O>>) -> Self {
        Self { node }
    }

    /// Feeds the input. A node accepts one input; later ones are ignored.
    pub fn success(&self, input: I) {
        self.node.success(input);
    }

    /// Fails the node with an upstream status. The node settles `Failure`
    /// without running its operation, and the status flows downstream.
    pub fn failure(&self, status: Status) {
        self.node.failure(status);
    }

    /// Subscribes `sink` to the result, replaying it if already settled.
    pub fn pipe(&self, sink: impl Sink<O> + 'static) {
        self.node.pipe(Rc::new(sink));
    }

    /// Subscribes callbacks to the result.
    pub fn subscribe(&self, on_success: impl Fn(O) + 'static, on_failure: impl Fn(Status) + 'static) {
        let sink = FnSink::new(
            Box::new(on_success),
            Some(Box::new(on_failure)),
            Rc::clone(self.node.shared().config().default_failure_handler()),
        );
        self.node.pipe(Rc::new(sink));
    }

    /// Subscribes a success callback. A failure goes to the runtime's default
    /// failure handler.
    pub fn on_success(&self, on_success: impl Fn(O) + 'static) {
        let sink = FnSink::new(
            Box::new(on_success),
            None,
            Rc::clone(self.node.shared().config().default_failure_handler()),
        );
        self.node.pipe(Rc::new(sink));
    }

    /// Pipes this node into `next` and returns the composite.
    ///
    /// Feeding the composite feeds this node; subscribing to it subscribes
    /// to `next`.
    #[must_use]
    pub fn then<P: Clone + 'static>(&self, next: &Io<O, P>) -> Io<I, P> {
        self.node.pipe(Rc::new(next.clone()));
        let node = PipeNode {
            id: self.node.shared().next_id("io-pipe-"),
            first: self.clone(),
            last: next.clone(),
        };
        Io::from_node(Rc::new(node))
    }

    /// Returns the node id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.node.id()
    }

    /// Returns the settlement state.
    #[must_use]
    pub fn state(&self) -> State {
        self.node.state()
    }

    /// Returns the settled result, if any.
    #[must_use]
    pub fn result(&self) -> Option<Result<O, Status>> {
        self.node.result()
    }

    /// Renders this node and its subscribers.
    #[must_use]
    pub fn render_diagnostic(&self) -> String {
        diagnostic::render_diagnostic(&*self.node)
    }

    /// Logs [`render_diagnostic`](Self::render_diagnostic).
    pub fn print_diagnostic(&self) {
        diagnostic::print_diagnostic(&*self.node);
    }
}

impl<I: 'static, O: Clone + 'static> Sink<I> for Io<I, O> {
    fn success(&self, value: I) {
        self.node.success(value);
    }

    fn failure(&self, status: Status) {
        self.node.failure(status);
    }

    fn downstream(&self) -> Option<Weak<dyn Diagnostic>> {
        let node: Rc<dyn Diagnostic> = self.node.clone();
        Some(Rc::downgrade(&node))
    }
}

impl<I: 'static, O: Clone + 'static> Diagnostic for Io<I, O> {
    fn id(&self) -> &str {
        self.node.id()
    }

    fn state(&self) -> State {
        self.node.state()
    }

    fn render(&self, level: usize, out: &mut String) {
        self.node.render(level, out);
    }
}

impl<I: 'static, O: Clone + 'static> Out<O> for Io<I, O> {
    fn pipe(&self, sink: Rc<dyn Sink<O>>) {
        self.node.pipe(sink);
    }
}

impl<I, O> fmt::Debug for Io<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Io")
            .field("id", &self.node.id())
            .field("state", &self.node.state())
            .finish()
    }
}

/// Chains nodes left to right.
///
/// `pipe!(a, b, c)` is `a.then(&b).then(&c)`.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use futures::executor::LocalPool;
/// use meridian_io::pipe;
/// use meridian_io::prelude::*;
///
/// let pool = LocalPool::new();
/// let io = IoRuntime::new(IoConfig::new(pool.spawner()));
///
/// let chain = pipe!(
///     io.sync_io(|x: u32| x + 1),
///     io.sync_io(|x: u32| x * 2),
///     io.sync_io(|x: u32| x.to_string()),
/// );
/// let seen = Rc::new(Cell::new(None));
/// let out = Rc::clone(&seen);
/// chain.on_success(move |text| out.set(Some(text)));
/// chain.success(4);
///
/// assert_eq!(seen.take().as_deref(), Some("10"));
/// ```
#[macro_export]
macro_rules! pipe {
    ($first:expr $(,)?) => {
        ::core::clone::Clone::clone(&$first)
    };
    ($first:expr, $($rest:expr),+ $(,)?) => {{
        let chain = $first;
        $(let chain = chain.then(&$rest);)+
        chain
    }};
}

// ─────────────────────────────────────────────────────────────────────────────
// Node kinds
// ─────────────────────────────────────────────────────────────────────────────

/// Operation run once by a [`SyncNode`].
pub(crate) type SyncOp<I, O> = Box<dyn FnOnce(I) -> Result<O, BoxError>>;

/// Runs its operation in the caller's stack and settles before returning.
pub(crate) struct SyncNode<I, O> {
    pub(crate) core: NodeCore<O>,
    pub(crate) op: RefCell<Option<SyncOp<I, O>>>,
}

impl<I: 'static, O: Clone + 'static> Sink<I> for SyncNode<I, O> {
    fn success(&self, input: I) {
        let Some(op) = self.op.borrow_mut().take() else {
            tracing::warn!(node = %self.core.id(), "node already received its input, ignoring");
            return;
        };
        match op(input) {
            Ok(value) => self.core.succeed(value),
            Err(error) => {
                let status = self.core.error_to_status(error);
                self.core.fail(status);
            }
        }
    }

    fn failure(&self, status: Status) {
        self.op.borrow_mut().take();
        self.core.fail(status);
    }
}

core_node!(SyncNode<I, O>, I, O);

/// Settled at creation; input is ignored.
pub(crate) struct SettledNode<O> {
    pub(crate) core: NodeCore<O>,
}

impl<O: Clone + 'static> Sink<()> for SettledNode<O> {
    fn success(&self, (): ()) {
        tracing::debug!(node = %self.core.id(), "settled node ignores its input");
    }

    fn failure(&self, status: Status) {
        self.core.fail(status);
    }
}

core_node!(SettledNode<O>, (), O);

/// Composite of two piped nodes.
struct PipeNode<I, X, O> {
    id: String,
    first: Io<I, X>,
    last: Io<X, O>,
}

impl<I: 'static, X: Clone + 'static, O: Clone + 'static> Sink<I> for PipeNode<I, X, O> {
    fn success(&self, input: I) {
        self.first.success(input);
    }

    fn failure(&self, status: Status) {
        self.first.failure(status);
    }
}

impl<I: 'static, X: Clone + 'static, O: Clone + 'static> Diagnostic for PipeNode<I, X, O> {
    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> State {
        self.last.state()
    }

    fn render(&self, level: usize, out: &mut String) {
        if level > MAX_DEPTH {
            diagnostic::write_elided(level, out);
            return;
        }
        diagnostic::write_line(level, &self.id, &"pipe", out);
        self.first.node.render(level + 1, out);
    }
}

impl<I: 'static, X: Clone + 'static, O: Clone + 'static> IoNode<I, O> for PipeNode<I, X, O> {
    fn pipe(&self, sink: Rc<dyn Sink<O>>) {
        self.last.node.pipe(sink);
    }

    fn shared(&self) -> &Rc<IoShared> {
        self.first.node.shared()
    }

    fn result(&self) -> Option<Result<O, Status>> {
        self.last.result()
    }
}

/// Predicate choosing the branch of a [`SwitchNode`].
pub(crate) type Predicate<I> = Box<dyn Fn(&I) -> bool>;

/// Forwards its input to one of two branches and settles from that branch.
pub(crate) struct SwitchNode<I, O> {
    pub(crate) core: NodeCore<O>,
    pub(crate) predicate: Predicate<I>,
    /// Taken on dispatch, so a settled switch does not keep its branches.
    pub(crate) branches: RefCell<Option<(Io<I, O>, Io<I, O>)>>,
    pub(crate) this: std::rc::Weak<Self>,
}

impl<I: 'static, O: Clone + 'static> Sink<I> for SwitchNode<I, O> {
    fn success(&self, input: I) {
        let Some((then_branch, else_branch)) = self.branches.borrow_mut().take() else {
            tracing::warn!(node = %self.core.id(), "node already received its input, ignoring");
            return;
        };
        let Some(this) = self.this.upgrade() else {
            return;
        };
        let branch = if (self.predicate)(&input) {
            then_branch
        } else {
            else_branch
        };
        tracing::debug!(node = %self.core.id(), branch = %branch.id(), "switch dispatched");
        branch.node.pipe(Rc::new(SwitchForward(this)));
        branch.success(input);
    }

    fn failure(&self, status: Status) {
        self.branches.borrow_mut().take();
        self.core.fail(status);
    }
}

core_node!(SwitchNode<I, O>, I, O);

/// Settles a switch from its chosen branch.
struct SwitchForward<I, O>(Rc<SwitchNode<I, O>>);

impl<I: 'static, O: Clone + 'static> Sink<O> for SwitchForward<I, O> {
    fn success(&self, value: O) {
        self.0.core.succeed(value);
    }

    fn failure(&self, status: Status) {
        self.0.core.fail(status);
    }
}
