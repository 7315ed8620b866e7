//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, memos, and effects.
//! These primitives form the foundation of Reflow's fine-grained reactivity.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (such as a memo or effect), the signal automatically
//! registers that context as a dependent. When the signal's value changes, all
//! dependents are notified.
//!
//! ## Memos
//!
//! A Memo is a derived value that caches its result. It re-evaluates only when
//! one of its dependencies changed and someone reads it again.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs whenever its dependencies
//! change. Effects are used to synchronize reactive state with external systems,
//! such as updating a mount point or logging.
//!
//! # Implementation Notes
//!
//! Every primitive belongs to a [`Runtime`], which owns a stack of running
//! computations (the [`Registry`]). When a signal is read, it checks the top
//! of that stack and, if a computation is running, subscribes it.
//!
//! Subscriptions are never removed. A computation that stops reading a cell
//! is still notified by it; there is no disposal.

mod context;
mod effect;
mod memo;
mod runtime;
mod signal;
mod subscriber;

pub use context::{ReactiveContext, Registry};
pub use effect::Effect;
pub use memo::{Memo, MemoState};
pub use runtime::Runtime;
pub use signal::Signal;
pub use subscriber::{Subscriber, SubscriberId, SubscriberSet};
