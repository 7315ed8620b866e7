//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, memos, and
//! effects. It owns the active-computation [`Registry`] and the microtask
//! [`Scheduler`], and it propagates changes when a signal is written.
//!
//! # How It Works
//!
//! 1. Every signal, memo and effect is created against a `Runtime` handle.
//!    Runtimes are independent: a read in one never subscribes a computation
//!    running in another.
//!
//! 2. When a memo or effect runs, the runtime pushes its subscriber onto the
//!    registry; reads made while it is on top subscribe it.
//!
//! 3. When a signal's value changes, the runtime:
//!    a. Marks every memo reachable from the signal as stale, following the
//!       memos' own subscriber sets (effects found on the way are collected)
//!    b. Runs the collected effects, each once, in discovery order
//!    c. Memos are lazy - they recompute on next access
//!
//! Because all staleness is settled before the first effect runs, an effect
//! never reads a memo that still caches a pre-write value.
//!
//! # Threading
//!
//! The runtime is single-threaded (`Rc` + `RefCell`) and is neither `Send`
//! nor `Sync`.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::context::Registry;
use super::effect::Effect;
use super::memo::Memo;
use super::signal::Signal;
use super::subscriber::{Subscriber, SubscriberId};
use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::render::{MicrotaskQueue, Microtask, Scheduler};

/// A value that is told when one of its dependencies changed.
pub(crate) trait Reactive {
    /// Mark this value as needing recomputation.
    ///
    /// Returns the dependents to propagate to, whether or not the value was
    /// already stale. A value left stale by a failed run still forwards.
    fn mark_stale(&self) -> Vec<Subscriber>;
}

/// Handle to a reactive graph.
///
/// Cloning the handle is cheap; clones share the same registry, config and
/// scheduler.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

struct RuntimeInner {
    registry: Registry,
    config: RuntimeConfig,
    scheduler: Rc<dyn Scheduler>,
}

impl Runtime {
    /// Create a runtime with the default config and its own microtask queue.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with its own [`MicrotaskQueue`], bounded by
    /// `config.microtask_budget`.
    pub fn with_config(config: RuntimeConfig) -> Self {
        let queue = MicrotaskQueue::with_budget(config.microtask_budget);
        Self::with_scheduler(config, Rc::new(queue))
    }

    /// Create a runtime that defers renders onto `scheduler`.
    pub fn with_scheduler(config: RuntimeConfig, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                registry: Registry::new(),
                config,
                scheduler,
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Create a signal owned by this runtime.
    pub fn signal<T>(&self, value: T) -> Signal<T>
    where
        T: Clone + PartialEq + 'static,
    {
        Signal::new(self, value)
    }

    /// Create a memo owned by this runtime. The computation does not run yet.
    pub fn memo<T, F>(&self, compute: F) -> Memo<T>
    where
        T: Clone + 'static,
        F: Fn() -> T + 'static,
    {
        Memo::new(self, compute)
    }

    /// Create an effect and run it once.
    pub fn effect<F>(&self, run: F) -> Effect
    where
        F: Fn() + 'static,
    {
        Effect::new(self, run)
    }

    /// The computation reads are currently attributed to, if any.
    pub fn current_subscriber(&self) -> Option<Subscriber> {
        self.inner.registry.peek()
    }

    /// Check if we're inside a reactive context.
    pub fn is_tracking(&self) -> bool {
        self.inner.registry.is_active()
    }

    /// Number of nested computations currently running.
    pub fn depth(&self) -> usize {
        self.inner.registry.depth()
    }

    /// Run `f` with `subscriber` as the current computation.
    pub fn track<R>(&self, subscriber: &Subscriber, f: impl FnOnce() -> R) -> R {
        let _ctx = self.inner.registry.enter(subscriber.clone());
        f()
    }

    /// Run `f` without tracking: reads inside it subscribe nobody.
    pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        let _ctx = self.inner.registry.enter_untracked();
        f()
    }

    /// Run an eager subscriber's callback inside its own tracking scope.
    pub(crate) fn execute(&self, subscriber: &Subscriber) {
        if let Some(callback) = subscriber.callback() {
            self.track(subscriber, || callback(subscriber));
        }
    }

    /// Propagate a change to `subscribers`, a snapshot taken by the writer.
    pub(crate) fn notify(&self, subscribers: Vec<Subscriber>) {
        let mut pending: VecDeque<Subscriber> = subscribers.into();
        let mut effects: IndexMap<SubscriberId, Subscriber> = IndexMap::new();
        let mut visited: IndexSet<SubscriberId> = IndexSet::new();

        while let Some(subscriber) = pending.pop_front() {
            if subscriber.is_eager() {
                effects.entry(subscriber.id()).or_insert(subscriber);
            } else if visited.insert(subscriber.id()) {
                if let Some(target) = subscriber.target() {
                    pending.extend(target.mark_stale());
                }
            }
        }

        if effects.is_empty() {
            return;
        }

        debug!(effects = effects.len(), "running notified effects");
        for effect in effects.into_values() {
            self.execute(&effect);
        }
    }

    /// Defer `task` until the current synchronous work has finished.
    pub fn queue_microtask(&self, task: Microtask) {
        self.inner.scheduler.queue_microtask(task);
    }

    /// Drain the scheduler's pending microtasks, returning how many ran.
    ///
    /// Schedulers driven by an external event loop return `Ok(0)`.
    pub fn flush(&self) -> Result<usize> {
        self.inner.scheduler.flush()
    }

    /// Number of microtasks waiting to run.
    pub fn pending_microtasks(&self) -> usize {
        self.inner.scheduler.pending()
    }

    /// Whether both handles refer to the same runtime.
    pub fn ptr_eq(&self, other: &Runtime) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .field("pending_microtasks", &self.pending_microtasks())
            .finish()
    }
}
