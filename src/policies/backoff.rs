//! # Backoff policy for retrying tasks.
//!
//! [`BackoffPolicy`] maps a retry attempt number to a delay. The delay for
//! attempt `n` (1-indexed) is `base × 2^(n-1)`: the first retry waits
//! `base`, the second `2×base`, and so on.
//!
//! The policy is pure and deterministic — the same attempt number always
//! yields the same delay. A retried task is not eligible for re-admission
//! until its delay has elapsed.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use txqueue::BackoffPolicy;
//!
//! let backoff = BackoffPolicy { base: Duration::from_millis(1000) };
//!
//! assert_eq!(backoff.delay(1), Duration::from_millis(1000));
//! assert_eq!(backoff.delay(2), Duration::from_millis(2000));
//! assert_eq!(backoff.delay(3), Duration::from_millis(4000));
//! ```

use std::time::Duration;

/// Retry backoff policy.
///
/// Doubles the delay on every consecutive failure of the same task,
/// starting from [`BackoffPolicy::base`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry; doubles for each retry after that.
    pub base: Duration,
}

impl Default for BackoffPolicy {
    /// Returns a policy with `base = 1s`.
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given retry attempt (1-indexed).
    ///
    /// `delay(n) = base × 2^(n-1)`. Attempt `0` is treated as attempt `1`
    /// (a task is only delayed once it has failed at least once). The
    /// multiplication saturates instead of overflowing for absurd attempt
    /// numbers.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exp).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor)
    }
}
