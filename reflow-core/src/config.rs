//! Runtime Configuration
//!
//! A [`Runtime`](crate::reactive::Runtime) reads its policies from a
//! [`RuntimeConfig`]. The config is plain data so hosts can embed it in their
//! own settings files; [`RuntimeConfig::from_json`] is provided for the common
//! case.
//!
//! ```rust,ignore
//! let config = RuntimeConfig::from_json(r#"{ "notify_policy": "always" }"#)?;
//! let runtime = Runtime::with_config(config);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of microtasks a single flush may run.
pub const DEFAULT_MICROTASK_BUDGET: usize = 10_000;

/// When a signal write notifies its subscribers.
///
/// The policy is runtime-wide. Memos have no equality check of their own:
/// they only notify when an upstream notification reaches them, so the policy
/// picked here governs the whole graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    /// Skip notification when the new value equals the old one.
    #[default]
    OnChange,

    /// Notify on every write, even if the value is unchanged.
    Always,
}

/// Settings for a reactive runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Write-time equality policy for signals.
    pub notify_policy: NotifyPolicy,

    /// Maximum number of microtasks one flush runs before giving up.
    ///
    /// A render that writes to a signal it reads keeps rescheduling itself;
    /// the budget turns that into an error instead of a hang.
    pub microtask_budget: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            notify_policy: NotifyPolicy::default(),
            microtask_budget: DEFAULT_MICROTASK_BUDGET,
        }
    }
}

impl RuntimeConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Return a copy with the given notify policy.
    pub fn notify_policy(mut self, policy: NotifyPolicy) -> Self {
        self.notify_policy = policy;
        self
    }

    /// Return a copy with the given microtask budget.
    pub fn microtask_budget(mut self, budget: usize) -> Self {
        self.microtask_budget = budget;
        self
    }
}
