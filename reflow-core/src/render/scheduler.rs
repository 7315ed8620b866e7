//! Microtask Scheduling
//!
//! Render bindings defer every re-render to a microtask: a callback that runs
//! on the same thread once the current synchronous work (a signal write and
//! all the notifications it fans out to) has finished.
//!
//! Two schedulers are provided:
//!
//! - [`MicrotaskQueue`]: a FIFO the host drains explicitly with
//!   [`Runtime::flush`](crate::reactive::Runtime::flush). Deterministic, and
//!   the default for a new runtime.
//! - [`LocalTaskScheduler`]: hands each microtask to
//!   [`tokio::task::spawn_local`], for hosts that already run a tokio
//!   `LocalSet`. Tasks run the next time the set is polled.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::config::DEFAULT_MICROTASK_BUDGET;
use crate::error::{ReactiveError, Result};

/// A deferred callback.
pub type Microtask = Box<dyn FnOnce() + 'static>;

/// Defers callbacks until the current synchronous work is done.
pub trait Scheduler {
    /// Queue `task`. It must not run before this call returns.
    fn queue_microtask(&self, task: Microtask);

    /// Run pending tasks now, if this scheduler is drained by the host.
    fn flush(&self) -> Result<usize> {
        Ok(0)
    }

    /// Number of tasks queued and not yet run.
    fn pending(&self) -> usize;
}

/// FIFO microtask queue drained by [`flush`](Scheduler::flush).
///
/// Tasks queued while flushing run in the same flush, up to the budget.
#[derive(Clone)]
pub struct MicrotaskQueue {
    inner: Rc<QueueInner>,
}

struct QueueInner {
    tasks: RefCell<VecDeque<Microtask>>,
    budget: usize,
}

impl MicrotaskQueue {
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_MICROTASK_BUDGET)
    }

    /// Create a queue whose flushes run at most `budget` tasks.
    pub fn with_budget(budget: usize) -> Self {
        Self {
            inner: Rc::new(QueueInner {
                tasks: RefCell::new(VecDeque::new()),
                budget,
            }),
        }
    }

    pub fn budget(&self) -> usize {
        self.inner.budget
    }
}

impl Default for MicrotaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for MicrotaskQueue {
    fn queue_microtask(&self, task: Microtask) {
        self.inner.tasks.borrow_mut().push_back(task);
    }

    /// Run tasks until the queue is empty.
    ///
    /// Fails with [`ReactiveError::MicrotaskBudgetExceeded`] when more than
    /// `budget` tasks would run; the remaining tasks stay queued.
    fn flush(&self) -> Result<usize> {
        let mut ran = 0;
        loop {
            // Release the borrow before running: tasks may queue more tasks.
            let Some(task) = self.inner.tasks.borrow_mut().pop_front() else {
                break;
            };

            if ran == self.inner.budget {
                self.inner.tasks.borrow_mut().push_front(task);
                warn!(budget = self.inner.budget, "microtask flush exceeded its budget");
                return Err(ReactiveError::MicrotaskBudgetExceeded {
                    budget: self.inner.budget,
                });
            }

            task();
            ran += 1;
        }

        if ran > 0 {
            trace!(ran, "flushed microtasks");
        }
        Ok(ran)
    }

    fn pending(&self) -> usize {
        self.inner.tasks.borrow().len()
    }
}

impl fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("pending", &self.pending())
            .field("budget", &self.inner.budget)
            .finish()
    }
}

/// Scheduler backed by a tokio `LocalSet`.
///
/// # Panics
///
/// Queuing a task panics when called outside a `LocalSet` context.
#[derive(Debug, Clone, Default)]
pub struct LocalTaskScheduler {
    pending: Rc<Cell<usize>>,
}

impl LocalTaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for LocalTaskScheduler {
    fn queue_microtask(&self, task: Microtask) {
        let pending = Rc::clone(&self.pending);
        pending.set(pending.get() + 1);
        tokio::task::spawn_local(async move {
            pending.set(pending.get() - 1);
            task();
        });
    }

    fn pending(&self) -> usize {
        self.pending.get()
    }
}
