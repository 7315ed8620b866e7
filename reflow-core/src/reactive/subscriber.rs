//! Subscriber types for the reactive system.
//!
//! A Subscriber represents any computation that depends on reactive values.
//! There are two flavours:
//!
//! - eager subscribers (effects, render bindings) wrap a callback that the
//!   runtime re-runs when a dependency changes;
//! - invalidators belong to memos. Notifying one marks the memo stale instead
//!   of running anything.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::runtime::Reactive;

/// Unique identifier for a subscriber.
///
/// Each subscriber (memo, effect, or other reactive computation) gets a unique
/// ID when created. Subscriber sets are keyed by this ID, which is what makes
/// repeated reads during one run register the subscriber only once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
enum Reaction {
    /// Re-run this callback inside a tracking scope. It is handed the
    /// subscriber it runs as.
    Run(Rc<dyn Fn(&Subscriber)>),
    /// Mark a memo stale. Weak so a memo's upstream cells never keep it alive.
    Invalidate(Weak<dyn Reactive>),
}

/// A subscriber to reactive values.
///
/// Cloning a subscriber is cheap and keeps its identity: clones compare equal
/// by [`SubscriberId`] and share the same callback.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    reaction: Reaction,
}

impl Subscriber {
    /// Create an eager subscriber with the given callback.
    ///
    /// The callback is not run here. The runtime runs it inside a tracking
    /// scope when the subscriber is executed or notified.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self::reacting(move |_| callback())
    }

    /// Create an eager subscriber whose callback receives the subscriber
    /// itself, for work that must later run under the same identity.
    pub fn reacting<F>(callback: F) -> Self
    where
        F: Fn(&Subscriber) + 'static,
    {
        Self {
            id: SubscriberId::new(),
            reaction: Reaction::Run(Rc::new(callback)),
        }
    }

    pub(crate) fn invalidator(target: Weak<dyn Reactive>) -> Self {
        Self {
            id: SubscriberId::new(),
            reaction: Reaction::Invalidate(target),
        }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Whether notifying this subscriber runs a callback (effects) rather than
    /// marking a memo stale.
    pub fn is_eager(&self) -> bool {
        matches!(self.reaction, Reaction::Run(_))
    }

    pub(crate) fn callback(&self) -> Option<Rc<dyn Fn(&Subscriber)>> {
        match &self.reaction {
            Reaction::Run(callback) => Some(Rc::clone(callback)),
            Reaction::Invalidate(_) => None,
        }
    }

    /// The memo this subscriber invalidates, if it is still alive.
    pub(crate) fn target(&self) -> Option<Rc<dyn Reactive>> {
        match &self.reaction {
            Reaction::Run(_) => None,
            Reaction::Invalidate(target) => target.upgrade(),
        }
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subscriber {}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("eager", &self.is_eager())
            .finish()
    }
}

/// Insertion-ordered set of subscribers.
///
/// Entries are never removed: a subscriber stays registered for the lifetime
/// of the cell that recorded it.
#[derive(Default)]
pub struct SubscriberSet {
    entries: RefCell<IndexMap<SubscriberId, Subscriber>>,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber. Returns `false` if it was already present.
    pub fn insert(&self, subscriber: Subscriber) -> bool {
        let mut entries = self.entries.borrow_mut();
        if entries.contains_key(&subscriber.id) {
            return false;
        }
        entries.insert(subscriber.id, subscriber);
        true
    }

    /// Copy the current members, in insertion order.
    ///
    /// Notification always iterates a snapshot, so subscribers added while a
    /// notification pass is running are only seen by the next pass.
    pub fn snapshot(&self) -> Vec<Subscriber> {
        self.entries.borrow().values().cloned().collect()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.entries.borrow().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.borrow().keys()).finish()
    }
}
