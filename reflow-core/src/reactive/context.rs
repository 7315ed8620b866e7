//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! we can register the current computation as a dependent.
//!
//! # Implementation
//!
//! Each [`Runtime`](super::Runtime) owns one [`Registry`], a stack of the
//! computations currently executing. When entering a reactive context (e.g.,
//! running a memo or effect), we push the subscriber onto the stack. When the
//! computation completes, we pop it.
//!
//! Pushing returns a [`ReactiveContext`] guard that pops in `Drop`, so the
//! stack stays balanced when a computation panics. Nested contexts (a memo
//! read from inside an effect) restore the outer computation on exit.

use std::cell::RefCell;
use std::fmt;

use smallvec::SmallVec;

use super::subscriber::{Subscriber, SubscriberId};
use crate::error::{ReactiveError, Result};

/// Stack of running computations.
///
/// A frame is either a subscriber or an untracked frame (`None`), pushed by
/// [`Runtime::untracked`](super::Runtime::untracked) to hide the outer
/// computation from reads.
#[derive(Default)]
pub struct Registry {
    stack: RefCell<SmallVec<[Option<Subscriber>; 8]>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a computation onto the stack.
    pub fn push(&self, subscriber: Subscriber) {
        self.stack.borrow_mut().push(Some(subscriber));
    }

    pub(crate) fn push_untracked(&self) {
        self.stack.borrow_mut().push(None);
    }

    /// Remove the top frame.
    ///
    /// # Panics
    ///
    /// Panics with [`ReactiveError::RegistryUnderflow`] if the stack is empty.
    /// An unbalanced pop means every later read would be attributed to the
    /// wrong computation, so it is not recoverable.
    pub fn pop(&self) {
        if let Err(err) = self.try_pop() {
            panic!("{err}");
        }
    }

    /// Remove and return the top frame, or fail if the stack is empty.
    pub fn try_pop(&self) -> Result<Option<Subscriber>> {
        self.stack
            .borrow_mut()
            .pop()
            .ok_or(ReactiveError::RegistryUnderflow)
    }

    /// The computation reads should currently be attributed to.
    pub fn peek(&self) -> Option<Subscriber> {
        self.stack.borrow().last().cloned().flatten()
    }

    /// Number of frames on the stack, untracked frames included.
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Whether a read right now would subscribe someone.
    pub fn is_active(&self) -> bool {
        matches!(self.stack.borrow().last(), Some(Some(_)))
    }

    /// Push `subscriber` and return a guard that pops it when dropped.
    pub fn enter(&self, subscriber: Subscriber) -> ReactiveContext<'_> {
        let subscriber_id = subscriber.id();
        self.push(subscriber);
        ReactiveContext {
            registry: self,
            subscriber_id: Some(subscriber_id),
        }
    }

    pub(crate) fn enter_untracked(&self) -> ReactiveContext<'_> {
        self.push_untracked();
        ReactiveContext {
            registry: self,
            subscriber_id: None,
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack = self.stack.borrow();
        f.debug_list()
            .entries(stack.iter().map(|frame| frame.as_ref().map(Subscriber::id)))
            .finish()
    }
}

/// Guard that pops the context when dropped.
///
/// This ensures the context stack is properly maintained even if
/// the computation panics.
#[must_use = "the context is popped as soon as the guard is dropped"]
pub struct ReactiveContext<'a> {
    registry: &'a Registry,
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext<'_> {
    /// The subscriber this guard pushed, `None` for an untracked frame.
    pub fn subscriber_id(&self) -> Option<SubscriberId> {
        self.subscriber_id
    }
}

impl Drop for ReactiveContext<'_> {
    fn drop(&mut self) {
        match self.registry.try_pop() {
            Ok(frame) => {
                // Verify we're popping the right context.
                debug_assert_eq!(
                    frame.as_ref().map(Subscriber::id),
                    self.subscriber_id,
                    "ReactiveContext mismatch"
                );
            }
            // Already unwinding: a second panic would abort.
            Err(_) if std::thread::panicking() => {}
            Err(err) => panic!("{err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_tracks_subscriber() {
        let registry = Registry::new();
        let subscriber = Subscriber::new(|| {});

        assert!(!registry.is_active());
        assert!(registry.peek().is_none());

        {
            let ctx = registry.enter(subscriber.clone());

            assert!(registry.is_active());
            assert_eq!(registry.peek(), Some(subscriber.clone()));
            assert_eq!(ctx.subscriber_id(), Some(subscriber.id()));
        }

        // Context should be cleaned up after drop
        assert!(!registry.is_active());
        assert!(registry.peek().is_none());
        assert_eq!(registry.depth(), 0);
    }

    #[test]
    fn nested_contexts() {
        let registry = Registry::new();
        let outer = Subscriber::new(|| {});
        let inner = Subscriber::new(|| {});

        {
            let _outer = registry.enter(outer.clone());
            assert_eq!(registry.peek(), Some(outer.clone()));

            {
                let _inner = registry.enter(inner.clone());
                assert_eq!(registry.peek(), Some(inner.clone()));
                assert_eq!(registry.depth(), 2);
            }

            // After inner context drops, outer should be current
            assert_eq!(registry.peek(), Some(outer.clone()));
        }

        assert!(registry.peek().is_none());
    }

    #[test]
    fn untracked_frame_hides_outer_subscriber() {
        let registry = Registry::new();
        let outer = Subscriber::new(|| {});

        let _outer = registry.enter(outer.clone());
        {
            let ctx = registry.enter_untracked();
            assert!(ctx.subscriber_id().is_none());
            assert!(!registry.is_active());
            assert!(registry.peek().is_none());
        }
        assert_eq!(registry.peek(), Some(outer));
    }

    #[test]
    fn guard_pops_when_body_panics() {
        let registry = Registry::new();
        let subscriber = Subscriber::new(|| {});

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ctx = registry.enter(subscriber.clone());
            panic!("computation failed");
        }));

        assert!(result.is_err());
        assert_eq!(registry.depth(), 0);
    }

    #[test]
    fn try_pop_on_empty_stack_is_an_error() {
        let registry = Registry::new();
        assert_eq!(registry.try_pop(), Err(ReactiveError::RegistryUnderflow));
    }

    #[test]
    #[should_panic(expected = "registry popped while empty")]
    fn pop_on_empty_stack_panics() {
        Registry::new().pop();
    }
}
