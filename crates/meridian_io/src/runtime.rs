//! The node factory.
//!
//! An [`IoRuntime`] owns the [`IoConfig`] and the id sequence of every node it
//! creates. Runtimes are independent: two runtimes number their nodes
//! separately and may use different spawners or error conversions.

use core::cell::{Cell, RefCell};
use core::fmt;
use core::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, LocalFutureObj};
use futures::task::SpawnError;
use meridian_resource::status::Status;

use crate::config::{BoxError, IoConfig};
use crate::coroutine::{Co, CoroutineNode, Program};
use crate::diagnostic;
use crate::node::{Io, NodeCore, SettledNode, SwitchNode, SyncNode, SyncOp, core_node};
use crate::sink::Sink;

/// State shared by a runtime and its nodes.
pub(crate) struct IoShared {
    config: IoConfig,
    sequence: Cell<u64>,
}

impl IoShared {
    pub(crate) fn config(&self) -> &IoConfig {
        &self.config
    }

    pub(crate) fn next_id(&self, prefix: &str) -> String {
        let n = self.sequence.get();
        self.sequence.set(n + 1);
        format!("{prefix}{}", diagnostic::to_base32(n))
    }
}

/// Creates effect nodes.
///
/// Cloning the runtime shares its configuration and id sequence.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use futures::executor::LocalPool;
/// use meridian_io::prelude::*;
///
/// let mut pool = LocalPool::new();
/// let io = IoRuntime::new(IoConfig::new(pool.spawner()));
///
/// let fetch = io.async_io(|n: u32| async move { Ok::<_, BoxError>(n * 2) });
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let out = Rc::clone(&seen);
/// fetch.on_success(move |n| out.borrow_mut().push(n));
///
/// fetch.success(21);
/// assert!(seen.borrow().is_empty());
///
/// pool.run_until_stalled();
/// assert_eq!(*seen.borrow(), vec![42]);
/// ```
#[derive(Clone)]
pub struct IoRuntime {
    shared: Rc<IoShared>,
}

impl IoRuntime {
    /// Creates a runtime.
    #[must_use]
    pub fn new(config: IoConfig) -> Self {
        Self {
            shared: Rc::new(IoShared {
                config,
                sequence: Cell::new(0),
            }),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &IoConfig {
        self.shared.config()
    }

    /// A node running an infallible operation synchronously.
    #[must_use]
    pub fn sync_io<I, O>(&self, op: impl FnOnce(I) -> O + 'static) -> Io<I, O>
    where
        I: 'static,
        O: Clone + 'static,
    {
        self.try_sync_io(move |input| Ok::<_, BoxError>(op(input)))
    }

    /// A node running a fallible operation synchronously.
    ///
    /// An `Err` is converted with the configured error-to-status conversion
    /// and settles the node as a failure. Panics are not caught.
    #[must_use]
    pub fn try_sync_io<I, O, E>(&self, op: impl FnOnce(I) -> Result<O, E> + 'static) -> Io<I, O>
    where
        I: 'static,
        O: Clone + 'static,
        E: Into<BoxError>,
    {
        let op: SyncOp<I, O> = Box::new(move |input: I| op(input).map_err(Into::<BoxError>::into));
        let node = SyncNode {
            core: NodeCore::new(&self.shared),
            op: RefCell::new(Some(op)),
        };
        Io::from_node(Rc::new(node))
    }

    /// A node whose operation returns a future.
    ///
    /// The future is spawned on the configured spawner when the input
    /// arrives; the node settles when it completes.
    #[must_use]
    pub fn async_io<I, O, E, F, Fut>(&self, op: F) -> Io<I, O>
    where
        I: 'static,
        O: Clone + 'static,
        E: Into<BoxError>,
        F: FnOnce(I) -> Fut + 'static,
        Fut: Future<Output = Result<O, E>> + 'static,
    {
        let op: AsyncOp<I, O> = Box::new(move |input: I| {
            op(input)
                .map(|result| result.map_err(Into::<BoxError>::into))
                .boxed_local()
        });
        let node = Rc::new_cyclic(|this| AsyncNode {
            core: NodeCore::new(&self.shared),
            op: RefCell::new(Some(op)),
            this: this.clone(),
        });
        Io::from_node(node)
    }

    /// A node already settled with `value`.
    #[must_use]
    pub fn success<O: Clone + 'static>(&self, value: O) -> Io<(), O> {
        Io::from_node(Rc::new(SettledNode {
            core: NodeCore::succeeded(&self.shared, value),
        }))
    }

    /// A node already settled with `status`.
    #[must_use]
    pub fn failure<O: Clone + 'static>(&self, status: Status) -> Io<(), O> {
        Io::from_node(Rc::new(SettledNode {
            core: NodeCore::failed(&self.shared, status),
        }))
    }

    /// A node forwarding its input to `then_branch` when `predicate` holds and
    /// to `else_branch` otherwise, settling with the chosen branch's result.
    #[must_use]
    pub fn switch<I, O>(
        &self,
        predicate: impl Fn(&I) -> bool + 'static,
        then_branch: &Io<I, O>,
        else_branch: &Io<I, O>,
    ) -> Io<I, O>
    where
        I: 'static,
        O: Clone + 'static,
    {
        let node = Rc::new_cyclic(|this| SwitchNode {
            core: NodeCore::new(&self.shared),
            predicate: Box::new(predicate),
            branches: RefCell::new(Some((then_branch.clone(), else_branch.clone()))),
            this: this.clone(),
        });
        Io::from_node(node)
    }

    /// A pass-through node logging every value it forwards.
    #[must_use]
    pub fn tap<T>(&self, label: &'static str) -> Io<T, T>
    where
        T: Clone + fmt::Debug + 'static,
    {
        self.sync_io(move |value: T| {
            tracing::info!(label, value = ?value, "tap");
            value
        })
    }

    /// A node running a coroutine program.
    ///
    /// The program receives a [`Co`] handle and the input. Awaiting
    /// [`Co::run`] yields a node and resumes with its success value; the
    /// first failure settles the program as a failure and drops it at that
    /// await point. Returning `Ok(value)` settles a success and `Err(status)`
    /// a failure.
    ///
    /// Programs may only await futures obtained from their [`Co`].
    ///
    /// # Example
    ///
    /// ```
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// use futures::executor::LocalPool;
    /// use meridian_io::prelude::*;
    ///
    /// let pool = LocalPool::new();
    /// let io = IoRuntime::new(IoConfig::new(pool.spawner()));
    ///
    /// let inc = io.clone();
    /// let program = io.coroutine(move |co: Co, x: u32| async move {
    ///     let a = co.run(&inc.sync_io(|x: u32| x + 1), x).await;
    ///     let b = co.run(&inc.sync_io(|x: u32| x * 10), a).await;
    ///     Ok(b)
    /// });
    ///
    /// let seen = Rc::new(Cell::new(0));
    /// let out = Rc::clone(&seen);
    /// program.on_success(move |x| out.set(x));
    /// program.success(4);
    /// assert_eq!(seen.get(), 50);
    /// ```
    #[must_use]
    pub fn coroutine<I, O, F, Fut>(&self, program: F) -> Io<I, O>
    where
        I: 'static,
        O: Clone + 'static,
        F: FnOnce(Co, I) -> Fut + 'static,
        Fut: Future<Output = Result<O, Status>> + 'static,
    {
        let program: Program<I, O> = Box::new(move |co: Co, input: I| program(co, input).boxed_local());
        Io::from_node(CoroutineNode::new(&self.shared, program))
    }
}

impl fmt::Debug for IoRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoRuntime")
            .field("next", &self.shared.sequence.get())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AsyncNode
// ─────────────────────────────────────────────────────────────────────────────

type AsyncOp<I, O> = Box<dyn FnOnce(I) -> LocalBoxFuture<'static, Result<O, BoxError>>>;

/// Spawns its operation and settles when the future completes.
struct AsyncNode<I, O> {
    core: NodeCore<O>,
    op: RefCell<Option<AsyncOp<I, O>>>,
    this: std::rc::Weak<Self>,
}

impl<I: 'static, O: Clone + 'static> Sink<I> for AsyncNode<I, O> {
    fn success(&self, input: I) {
        let Some(op) = self.op.borrow_mut().take() else {
            tracing::warn!(node = %self.core.id(), "node already received its input, ignoring");
            return;
        };
        let Some(this) = self.this.upgrade() else {
            return;
        };
        let future = op(input);
        let task = async move {
            match future.await {
                Ok(value) => this.core.succeed(value),
                Err(error) => {
                    let status = this.core.error_to_status(error);
                    this.core.fail(status);
                }
            }
        };
        if let Err(error) = self.spawn(task) {
            let status = self.core.error_to_status(Box::new(error));
            self.core.fail(status);
        }
    }

    fn failure(&self, status: Status) {
        self.op.borrow_mut().take();
        self.core.fail(status);
    }
}

impl<I: 'static, O: Clone + 'static> AsyncNode<I, O> {
    fn spawn(&self, task: impl Future<Output = ()> + 'static) -> Result<(), SpawnError> {
        tracing::debug!(node = %self.core.id(), "spawning async operation");
        self.core
            .shared()
            .config()
            .spawn(LocalFutureObj::new(Box::pin(task)))
    }
}

core_node!(AsyncNode<I, O>, I, O);
