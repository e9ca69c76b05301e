//! Coroutine programs.
//!
//! A program is an `async` block that yields effect nodes through its [`Co`]
//! handle. The program runs inside a node of its own, driven by a trampoline:
//!
//! - a yielded node that settles while the program is being polled completes
//!   the await in place, so long runs of synchronous nodes do not grow the
//!   stack;
//! - a node that settles later (an async node) re-enters the trampoline from
//!   its notification;
//! - the first failure settles the program node and drops the program at its
//!   pending await point. It is never resumed.
//!
//! Programs are polled with a no-op waker, so they may only await their
//! [`Co`] handle. A program left pending with no yielded node outstanding
//! fails with `platform:status:UnknownError`.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use futures::executor::LocalPool;
//! use meridian_io::prelude::*;
//!
//! let mut pool = LocalPool::new();
//! let io = IoRuntime::new(IoConfig::new(pool.spawner()));
//!
//! let nodes = io.clone();
//! let program = io.coroutine(move |co: Co, name: String| async move {
//!     let upper = co.run(&nodes.sync_io(|s: String| s.to_uppercase()), name).await;
//!     let greeting = co
//!         .run(&nodes.async_io(|s: String| async move { Ok::<_, BoxError>(format!("hello {s}")) }), upper)
//!         .await;
//!     Ok(greeting)
//! });
//!
//! let seen = Rc::new(RefCell::new(None));
//! let out = Rc::clone(&seen);
//! program.on_success(move |text| *out.borrow_mut() = Some(text));
//! program.success("ada".to_string());
//!
//! pool.run_until_stalled();
//! assert_eq!(seen.borrow().as_deref(), Some("hello ADA"));
//! ```

use core::cell::{Cell, RefCell};
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::rc::{Rc, Weak};

use futures::future::{self, LocalBoxFuture};
use futures::task::noop_waker_ref;
use meridian_resource::builtin;
use meridian_resource::status::Status;

use crate::node::{Io, NodeCore, core_node};
use crate::runtime::IoShared;
use crate::sink::{Out, Sink};

/// A program body, boxed.
pub(crate) type Program<I, O> = Box<dyn FnOnce(Co, I) -> LocalBoxFuture<'static, Result<O, Status>>>;

/// The node running a program.
trait CoHost {
    /// A yielded node is about to be subscribed.
    fn suspend(&self);

    /// A yielded node settled with a value.
    fn resume(&self);

    /// A yielded node failed, or the program gave up.
    fn abort(&self, status: Status);
}

// ─────────────────────────────────────────────────────────────────────────────
// Co
// ─────────────────────────────────────────────────────────────────────────────

/// A program's handle to its executor.
#[derive(Clone)]
pub struct Co {
    host: Weak<dyn CoHost>,
}

impl Co {
    /// Feeds `input` to `node` and waits for its success value.
    ///
    /// If `node` fails, the program settles with that failure and does not
    /// resume.
    pub fn run<A: 'static, B: Clone + 'static>(&self, node: &Io<A, B>, input: A) -> Yield<B> {
        let node = node.clone();
        Yield::new(
            self.host.clone(),
            Box::new(move |sink| {
                Out::pipe(&node, sink);
                node.success(input);
            }),
        )
    }

    /// Waits for the success value of a node that is already fed.
    pub fn wait<B: 'static, N: Out<B> + Clone + 'static>(&self, node: &N) -> Yield<B> {
        let node = node.clone();
        Yield::new(self.host.clone(), Box::new(move |sink| node.pipe(sink)))
    }

    /// Runs a sub-program on this executor and returns its value.
    ///
    /// If the sub-program fails, so does the whole program.
    pub async fn delegate<A, B, F, Fut>(&self, program: F, input: A) -> B
    where
        F: FnOnce(Co, A) -> Fut,
        Fut: Future<Output = Result<B, Status>>,
    {
        match program(self.clone(), input).await {
            Ok(value) => value,
            Err(status) => {
                if let Some(host) = self.host.upgrade() {
                    host.abort(status);
                }
                future::pending().await
            }
        }
    }
}

impl core::fmt::Debug for Co {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Co")
            .field("alive", &(self.host.strong_count() > 0))
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Yield
// ─────────────────────────────────────────────────────────────────────────────

/// Future returned by [`Co::run`] and [`Co::wait`].
///
/// Nothing happens until it is first polled.
#[must_use = "a yielded node does nothing unless awaited"]
pub struct Yield<B> {
    host: Weak<dyn CoHost>,
    start: Option<Box<dyn FnOnce(Rc<dyn Sink<B>>)>>,
    slot: Rc<RefCell<Option<B>>>,
}

impl<B> Yield<B> {
    fn new(host: Weak<dyn CoHost>, start: Box<dyn FnOnce(Rc<dyn Sink<B>>)>) -> Self {
        Self {
            host,
            start: Some(start),
            slot: Rc::new(RefCell::new(None)),
        }
    }
}

impl<B: 'static> Future for Yield<B> {
    type Output = B;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<B> {
        let this = self.get_mut();
        if let Some(start) = this.start.take() {
            let Some(host) = this.host.upgrade() else {
                return Poll::Pending;
            };
            host.suspend();
            start(Rc::new(ResumeSink {
                slot: Rc::clone(&this.slot),
                host,
            }));
        }
        let value = this.slot.borrow_mut().take();
        value.map_or(Poll::Pending, Poll::Ready)
    }
}

/// Hands a yielded node's result back to the program.
struct ResumeSink<B> {
    slot: Rc<RefCell<Option<B>>>,
    host: Rc<dyn CoHost>,
}

impl<B> Sink<B> for ResumeSink<B> {
    fn success(&self, value: B) {
        *self.slot.borrow_mut() = Some(value);
        self.host.resume();
    }

    fn failure(&self, status: Status) {
        self.host.abort(status);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CoroutineNode
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct CoroutineNode<I, O> {
    core: NodeCore<O>,
    program: RefCell<Option<Program<I, O>>>,
    running: RefCell<Option<LocalBoxFuture<'static, Result<O, Status>>>>,
    aborted: RefCell<Option<Status>>,
    /// Set while the trampoline is on the stack.
    driving: Cell<bool>,
    /// Set when a resumption arrives while driving.
    woken: Cell<bool>,
    /// Yielded nodes that have not settled yet.
    outstanding: Cell<usize>,
    this: Weak<Self>,
}

impl<I: 'static, O: Clone + 'static> CoroutineNode<I, O> {
    pub(crate) fn new(shared: &Rc<IoShared>, program: Program<I, O>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            core: NodeCore::new(shared),
            program: RefCell::new(Some(program)),
            running: RefCell::new(None),
            aborted: RefCell::new(None),
            driving: Cell::new(false),
            woken: Cell::new(false),
            outstanding: Cell::new(0),
            this: this.clone(),
        })
    }

    /// Polls the program until it completes, fails or waits on a node that
    /// has not settled.
    fn drive(&self) {
        if self.driving.replace(true) {
            self.woken.set(true);
            return;
        }

        let mut cx = Context::from_waker(noop_waker_ref());
        let outcome = loop {
            self.woken.set(false);
            if let Some(status) = self.aborted.borrow_mut().take() {
                break Some(Err(status));
            }
            let poll = {
                let mut running = self.running.borrow_mut();
                let Some(program) = running.as_mut() else {
                    break None;
                };
                program.as_mut().poll(&mut cx)
            };
            match poll {
                Poll::Ready(result) => break Some(result),
                Poll::Pending if self.woken.get() => {}
                Poll::Pending if self.outstanding.get() == 0 => {
                    tracing::warn!(node = %self.core.id(), "program awaited a future outside its `Co` handle");
                    break Some(Err(builtin::unknown_error(
                        "coroutine program awaited a future outside its `Co` handle",
                    )));
                }
                Poll::Pending => break None,
            }
        };
        self.driving.set(false);

        if let Some(result) = outcome {
            let finished = self.running.borrow_mut().take();
            drop(finished);
            match result {
                Ok(value) => self.core.succeed(value),
                Err(status) => self.core.fail(status),
            }
        }
    }
}

impl<I: 'static, O: Clone + 'static> CoHost for CoroutineNode<I, O> {
    fn suspend(&self) {
        self.outstanding.set(self.outstanding.get() + 1);
    }

    fn resume(&self) {
        self.outstanding.set(self.outstanding.get().saturating_sub(1));
        self.drive();
    }

    fn abort(&self, status: Status) {
        self.outstanding.set(self.outstanding.get().saturating_sub(1));
        {
            let mut aborted = self.aborted.borrow_mut();
            if aborted.is_none() {
                *aborted = Some(status);
            }
        }
        self.drive();
    }
}

impl<I: 'static, O: Clone + 'static> Sink<I> for CoroutineNode<I, O> {
    fn success(&self, input: I) {
        let Some(program) = self.program.borrow_mut().take() else {
            tracing::warn!(node = %self.core.id(), "program already started, ignoring input");
            return;
        };
        let host: Weak<dyn CoHost> = self.this.clone();
        tracing::debug!(node = %self.core.id(), "starting program");
        let running = program(Co { host }, input);
        *self.running.borrow_mut() = Some(running);
        self.drive();
    }

    fn failure(&self, status: Status) {
        self.program.borrow_mut().take();
        self.abort(status);
    }
}

core_node!(CoroutineNode<I, O>, I, O);
