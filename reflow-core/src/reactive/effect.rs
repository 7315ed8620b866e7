//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency changes, the runtime re-runs the effect.
//!
//! 3. Every run is tracked again, so reads made only on a later run are
//!    picked up too. Earlier subscriptions are kept.
//!
//! # Differences from Memo
//!
//! - Memos return a value; effects do not.
//! - Memos are lazy (compute on access); effects are eager (run when deps change).
//! - Memos cache results; effects just run their side effect.
//!
//! # Failures
//!
//! A panic inside the effect function unwinds to whoever triggered the run
//! (the creator, or the writer of a signal). The registry is restored on the
//! way out and the effect stays subscribed, so the next write runs it again.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::runtime::Runtime;
use super::subscriber::{Subscriber, SubscriberId};

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use reflow_core::reactive::Runtime;
///
/// let runtime = Runtime::new();
/// let count = runtime.signal(0);
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let _effect = {
///     let (count, seen) = (count.clone(), Rc::clone(&seen));
///     runtime.effect(move || seen.borrow_mut().push(count.get()))
/// };
///
/// count.set(5);
/// assert_eq!(*seen.borrow(), vec![0, 5]);
/// ```
#[derive(Clone)]
pub struct Effect {
    runtime: Runtime,

    /// The subscriber the effect runs as.
    subscriber: Subscriber,

    /// Number of times the effect has run.
    run_count: Rc<Cell<usize>>,
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies.
    pub fn new<F>(runtime: &Runtime, run: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self::with_subscriber(runtime, move |_| run())
    }

    /// Like [`new`](Self::new), but `run` is handed the effect's own
    /// subscriber on every run.
    pub fn with_subscriber<F>(runtime: &Runtime, run: F) -> Self
    where
        F: Fn(&Subscriber) + 'static,
    {
        let run_count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&run_count);
        let subscriber = Subscriber::reacting(move |subscriber| {
            counter.set(counter.get() + 1);
            run(subscriber);
        });

        let effect = Self {
            runtime: runtime.clone(),
            subscriber,
            run_count,
        };

        // Run immediately to establish dependencies
        effect.execute();

        effect
    }

    /// Get the effect's ID, shared with the subscriber it runs as.
    pub fn id(&self) -> SubscriberId {
        self.subscriber.id()
    }

    pub fn subscriber(&self) -> &Subscriber {
        &self.subscriber
    }

    /// Run the effect function now, tracking its reads.
    pub fn execute(&self) {
        self.runtime.execute(&self.subscriber);
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.run_count.get()
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.subscriber.id())
            .field("run_count", &self.run_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn effect_runs_on_creation() {
        let runtime = Runtime::new();
        let effect = runtime.effect(|| {});

        // Effect should have run once on creation
        assert_eq!(effect.run_count(), 1);
        assert!(!runtime.is_tracking());
    }

    #[test]
    fn effect_reruns_when_dependency_changes() {
        let runtime = Runtime::new();
        let signal = runtime.signal(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (signal_clone, seen_clone) = (signal.clone(), Rc::clone(&seen));
        let effect = runtime.effect(move || seen_clone.borrow_mut().push(signal_clone.get()));

        signal.set(1);
        signal.set(2);
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
        assert_eq!(effect.run_count(), 3);
    }

    #[test]
    fn effect_tracks_run_count() {
        let runtime = Runtime::new();
        let effect = runtime.effect(|| {});

        assert_eq!(effect.run_count(), 1);

        effect.execute();
        assert_eq!(effect.run_count(), 2);

        effect.execute();
        assert_eq!(effect.run_count(), 3);
    }

    #[test]
    fn later_runs_discover_new_dependencies() {
        let runtime = Runtime::new();
        let gate = runtime.signal(false);
        let late = runtime.signal(0);

        let (gate_clone, late_clone) = (gate.clone(), late.clone());
        let effect = runtime.effect(move || {
            if gate_clone.get() {
                late_clone.get();
            }
        });
        assert_eq!(late.subscriber_count(), 0);

        gate.set(true);
        assert_eq!(late.subscriber_count(), 1);

        late.set(1);
        assert_eq!(effect.run_count(), 3);
    }

    #[test]
    fn nested_effect_restores_outer_context() {
        let runtime = Runtime::new();
        let outer_signal = runtime.signal(0);
        let inner_runs = Rc::new(Cell::new(0));

        let rt = runtime.clone();
        let (signal_clone, inner_runs_clone) = (outer_signal.clone(), Rc::clone(&inner_runs));
        let outer = runtime.effect(move || {
            let counter = Rc::clone(&inner_runs_clone);
            rt.effect(move || counter.set(counter.get() + 1));
            // Read after the inner effect finished: must subscribe the outer one.
            signal_clone.get();
        });

        assert_eq!(inner_runs.get(), 1);
        outer_signal.set(1);
        assert_eq!(outer.run_count(), 2);
        assert_eq!(inner_runs.get(), 2);
    }

    #[test]
    fn panicking_effect_keeps_registry_consistent() {
        let runtime = Runtime::new();
        let signal = runtime.signal(0);

        let signal_clone = signal.clone();
        let effect = runtime.effect(move || {
            if signal_clone.get() == 1 {
                panic!("effect failed");
            }
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| signal.set(1)));
        assert!(result.is_err());
        assert_eq!(runtime.depth(), 0);

        // Still subscribed: the next write runs it again.
        signal.set(2);
        assert_eq!(effect.run_count(), 3);
    }

    #[test]
    fn effect_clone_shares_state() {
        let runtime = Runtime::new();
        let effect1 = runtime.effect(|| {});
        let effect2 = effect1.clone();

        assert_eq!(effect1.id(), effect2.id());

        effect1.execute();
        assert_eq!(effect1.run_count(), 2);
        assert_eq!(effect2.run_count(), 2);
    }

    #[test]
    fn with_subscriber_runs_as_itself() {
        let runtime = Runtime::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (seen_clone, rt) = (Rc::clone(&seen), runtime.clone());
        let effect = Effect::with_subscriber(&runtime, move |subscriber| {
            let current = rt.current_subscriber().map(|s| s.id());
            seen_clone.borrow_mut().push((subscriber.id(), current));
        });
        effect.execute();

        let expected = (effect.id(), Some(effect.id()));
        assert_eq!(*seen.borrow(), vec![expected, expected]);
        assert_eq!(effect.run_count(), 2);
    }
}
