//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Memos Work
//!
//! 1. On first access, the memo runs its computation and caches the result.
//!
//! 2. When accessed again, if no dependencies have changed, returns cached value.
//!
//! 3. When a dependency changes, the memo is marked stale, and the staleness
//!    is passed on to everything that read the memo.
//!
//! 4. On next access, a stale memo recomputes once and is clean again.
//!
//! # Why This Matters
//!
//! This "lazy" approach avoids unnecessary recomputation:
//!
//! - A signal changes
//! - 10 memos depend on it
//! - Only the memos actually accessed will recompute
//! - Memos that are never read stay stale (no wasted work)
//!
//! A memo is both a subscriber and a publisher. While it computes, its own
//! invalidator sits on top of the registry, so the cells it reads subscribe
//! the memo rather than whoever asked for its value.

use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use super::runtime::{Reactive, Runtime};
use super::subscriber::{Subscriber, SubscriberSet};
use crate::error::ReactiveError;

/// Counter for generating unique memo IDs.
static MEMO_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique memo ID.
fn next_memo_id() -> u64 {
    MEMO_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Freshness of a memo's cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    /// The cached value is up-to-date.
    Clean,

    /// No value yet, or a dependency changed since the last computation.
    Stale,
}

/// A cached derived value that recomputes only when dependencies change.
///
/// # Example
///
/// ```rust
/// use reflow_core::reactive::Runtime;
///
/// let runtime = Runtime::new();
/// let count = runtime.signal(2);
/// let doubled = {
///     let count = count.clone();
///     runtime.memo(move || count.get() * 2)
/// };
///
/// assert_eq!(doubled.get(), 4);
/// count.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Memo<T> {
    /// Unique identifier for this memo.
    id: u64,

    runtime: Runtime,

    inner: Rc<MemoInner<T>>,
}

struct MemoInner<T> {
    id: u64,

    /// The computation function.
    compute: Box<dyn Fn() -> T>,

    /// The cached value (None if never computed).
    value: RefCell<Option<T>>,

    /// `value` may only be used while this is false.
    stale: Cell<bool>,

    computing: Cell<bool>,

    /// Pushed onto the registry while computing; upstream cells notify it.
    invalidator: Subscriber,

    /// Subscribers that read this memo.
    dependents: SubscriberSet,
}

impl<T> Reactive for MemoInner<T> {
    fn mark_stale(&self) -> Vec<Subscriber> {
        if !self.stale.replace(true) {
            trace!(memo = self.id, dependents = self.dependents.len(), "memo marked stale");
        }
        self.dependents.snapshot()
    }
}

/// Resets the computing flag, also when the computation panics.
struct ComputeGuard<'a>(&'a Cell<bool>);

impl Drop for ComputeGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<T> Memo<T>
where
    T: Clone + 'static,
{
    /// Create a new memo with the given computation function.
    ///
    /// The computation is not run immediately. It runs on first access.
    pub fn new<F>(runtime: &Runtime, compute: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        let id = next_memo_id();
        let inner = Rc::new_cyclic(|this: &Weak<MemoInner<T>>| {
            let target: Weak<dyn Reactive> = this.clone();
            MemoInner {
                id,
                compute: Box::new(compute),
                value: RefCell::new(None),
                stale: Cell::new(true),
                computing: Cell::new(false),
                invalidator: Subscriber::invalidator(target),
                dependents: SubscriberSet::new(),
            }
        });

        Self {
            id,
            runtime: runtime.clone(),
            inner,
        }
    }

    /// Get the memo's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the current value, recomputing if necessary.
    ///
    /// If called within a reactive context, the current computation is
    /// registered as a dependent of this memo.
    ///
    /// # Panics
    ///
    /// Panics with [`ReactiveError::Cycle`] if the memo's computation reads
    /// the memo itself.
    pub fn get(&self) -> T {
        let reader = self.runtime.current_subscriber();
        let value = self.get_untracked();

        if let Some(reader) = reader {
            let reader_id = reader.id();
            if self.inner.dependents.insert(reader) {
                trace!(memo = self.id, subscriber = ?reader_id, "subscribed to memo");
            }
        }

        value
    }

    /// Get the current value without registering the caller as a dependent.
    ///
    /// A stale memo still recomputes, and its own dependencies are tracked.
    pub fn get_untracked(&self) -> T {
        if !self.inner.stale.get() {
            if let Some(value) = self.inner.value.borrow().as_ref() {
                trace!(memo = self.id, "memo cache hit");
                return value.clone();
            }
        }
        self.recompute()
    }

    /// Recompute the memo's value.
    ///
    /// This runs the computation function within a reactive context to
    /// track dependencies.
    fn recompute(&self) -> T {
        if self.inner.computing.get() {
            panic!("{}", ReactiveError::Cycle { memo: self.id });
        }
        self.inner.computing.set(true);
        let _computing = ComputeGuard(&self.inner.computing);

        debug!(memo = self.id, "recomputing memo");
        let value = self
            .runtime
            .track(&self.inner.invalidator, || (self.inner.compute)());

        *self.inner.value.borrow_mut() = Some(value.clone());
        self.inner.stale.set(false);
        value
    }

    /// Get the current staleness state.
    pub fn state(&self) -> MemoState {
        if self.inner.stale.get() {
            MemoState::Stale
        } else {
            MemoState::Clean
        }
    }

    /// Get the number of dependents.
    pub fn dependent_count(&self) -> usize {
        self.inner.dependents.len()
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.borrow().is_some()
    }
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            runtime: self.runtime.clone(),
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.id)
            .field("stale", &self.inner.stale.get())
            .field("has_value", &self.inner.value.borrow().is_some())
            .field("dependent_count", &self.inner.dependents.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
