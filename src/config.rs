//! # Queue configuration.
//!
//! Provides [`QueueConfig`], the centralized settings for a [`TaskQueue`].
//!
//! ## Field semantics
//! - `capacity`: maximum number of in-flight tasks (must be >= 1)
//! - `max_retries`: retry ceiling per task (`0` = fail on first error)
//! - `backoff`: delay policy between retry attempts
//!
//! Validation happens once, at queue construction; an invalid config never
//! produces a running queue.
//!
//! [`TaskQueue`]: crate::TaskQueue

use crate::error::ConfigError;
use crate::policies::BackoffPolicy;

/// Configuration for a task queue.
///
/// Defines:
/// - **Concurrency**: how many tasks may be in flight at once
/// - **Retry policy**: how many times a failing task is re-attempted
/// - **Backoff**: how long to wait before each re-attempt
///
/// ## Example
/// ```
/// use std::time::Duration;
/// use txqueue::{BackoffPolicy, QueueConfig};
///
/// let cfg = QueueConfig {
///     capacity: 1,
///     max_retries: 5,
///     backoff: BackoffPolicy { base: Duration::from_millis(250) },
/// };
/// assert!(cfg.validate().is_ok());
///
/// let bad = QueueConfig { capacity: 0, ..QueueConfig::default() };
/// assert!(bad.validate().is_err());
/// ```
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Maximum number of tasks in flight simultaneously.
    ///
    /// The admission loop never exceeds this at any instant. Must be at
    /// least 1; `0` is rejected by [`QueueConfig::validate`].
    pub capacity: usize,

    /// Maximum number of retries after a failed attempt.
    ///
    /// A task whose executor keeps failing runs `1 + max_retries` times in
    /// total and terminates `Failed` with `attempt == max_retries`.
    pub max_retries: u32,

    /// Delay policy applied before each retry re-admission.
    pub backoff: BackoffPolicy,
}

impl QueueConfig {
    /// Checks the configuration for programming errors.
    ///
    /// Called by [`TaskQueue::new`](crate::TaskQueue::new); exposed so
    /// callers can fail fast before wiring up an executor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    /// Default configuration:
    ///
    /// - `capacity = 3`
    /// - `max_retries = 3`
    /// - `backoff = BackoffPolicy::default()` (1s base, doubling)
    fn default() -> Self {
        Self {
            capacity: 3,
            max_retries: 3,
            backoff: BackoffPolicy::default(),
        }
    }
}
