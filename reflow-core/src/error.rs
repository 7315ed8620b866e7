//! Error types for the reactive runtime and the render layer.

use thiserror::Error;

/// Errors raised by the reactive runtime.
///
/// `RegistryUnderflow` and `Cycle` describe broken invariants. They are
/// raised as panics by the operations that detect them, because continuing
/// would attribute every later read to the wrong computation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReactiveError {
    /// `pop` was called on an empty active-computation registry.
    #[error("active-computation registry popped while empty")]
    RegistryUnderflow,

    /// A memo read itself while it was computing.
    #[error("memo {memo} read itself while computing")]
    Cycle { memo: u64 },

    /// The requested mount target does not exist.
    #[error("mount target `{selector}` does not exist")]
    MissingMountTarget { selector: String },

    /// A single flush ran more microtasks than the configured budget.
    #[error("microtask flush exceeded its budget of {budget} tasks")]
    MicrotaskBudgetExceeded { budget: usize },
}

/// Errors raised while loading a [`RuntimeConfig`](crate::config::RuntimeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid runtime config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;
