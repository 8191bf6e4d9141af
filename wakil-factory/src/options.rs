//! Factory settings.
//!
//! [`FactoryOptions`] is plain data and deserializes from any serde
//! format, so it can live in an application's own config file:
//!
//! ```toml
//! [factories.exporters]
//! failure_policy = "cache"
//! wait_timeout_ms = 2000
//! ```

use std::time::Duration;

use serde::Deserialize;

/// What a singleton accessor does when its creation function fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Leave the cache empty; the next caller runs the creation function
    /// again.
    #[default]
    Retry,
    /// Remember the failure; every later caller gets the same error and
    /// the creation function never runs again.
    Cache,
}

/// Settings applied to every accessor a factory builds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FactoryOptions {
    /// Singleton failure handling; descriptors may override it.
    pub failure_policy: FailurePolicy,
    /// How long a caller waits for another caller's singleton creation.
    /// `None` waits as long as it takes.
    pub wait_timeout_ms: Option<u64>,
    /// Whether `build()` accepts a factory without accessors.
    pub allow_empty: bool,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Retry,
            wait_timeout_ms: None,
            allow_empty: true,
        }
    }
}

impl FactoryOptions {
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }
}
