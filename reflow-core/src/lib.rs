//! Reflow Core
//!
//! This crate provides the core runtime for the Reflow reactive rendering
//! library. It implements:
//!
//! - Reactive primitives (signals, memos, effects) with automatic dependency
//!   tracking
//! - Lazy, cached derived values with eager staleness propagation
//! - Render bindings that keep a mount target in sync with a view, deferring
//!   re-renders to a microtask queue
//!
//! Everything is single-threaded. A [`Runtime`](reactive::Runtime) is an
//! independent reactive graph; create one and build on it.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Core reactive primitives and dependency tracking
//! - `render`: Render bindings, mount targets and microtask scheduling
//! - `config`: Runtime policies
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust
//! use reflow_core::reactive::Runtime;
//! use reflow_core::render::{bind, MountPoint};
//!
//! let runtime = Runtime::new();
//! let mount = MountPoint::new();
//!
//! // Create a signal
//! let count = runtime.signal(0);
//!
//! // Create a derived value
//! let doubled = {
//!     let count = count.clone();
//!     runtime.memo(move || count.get() * 2)
//! };
//!
//! // Bind a view
//! let view = {
//!     let (count, doubled) = (count.clone(), doubled.clone());
//!     move || move || format!("Count is {} and double is {}", count.get(), doubled.get())
//! };
//! bind(&runtime, view, mount.clone());
//! assert_eq!(mount.content(), "Count is 0 and double is 0");
//!
//! // Update the signal; the re-render waits for the microtask queue
//! count.set(5);
//! runtime.flush().unwrap();
//! assert_eq!(mount.content(), "Count is 5 and double is 10");
//! ```

pub mod config;
pub mod error;
pub mod reactive;
pub mod render;

pub use config::{NotifyPolicy, RuntimeConfig};
pub use error::{ConfigError, ReactiveError, Result};
