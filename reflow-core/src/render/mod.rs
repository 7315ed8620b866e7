//! Rendering
//!
//! This module connects the reactive core to text-producing views. A view's
//! render function is bound to a [`MountTarget`]; the binding renders once
//! synchronously, then re-renders on the microtask queue whenever the state
//! it read changes.
//!
//! - `output`: what a render function produces ([`RenderOutput`])
//! - `mount`: where it goes ([`MountTarget`], [`MountPoint`], [`Document`])
//! - `scheduler`: when deferred work runs ([`Scheduler`] and implementations)
//! - `binding`: [`bind`] and [`mount`], tying the three together

mod binding;
mod mount;
mod output;
mod scheduler;

pub use binding::{bind, mount, RenderBinding};
pub use mount::{Document, MountPoint, MountTarget};
pub use output::RenderOutput;
pub use scheduler::{LocalTaskScheduler, Microtask, MicrotaskQueue, Scheduler};
