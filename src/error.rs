//! Error types used by the queue runtime and executor adapters.
//!
//! This module defines two error types:
//!
//! - [`ConfigError`] — programming errors caught at queue construction.
//! - [`ExecError`] — failure outcome of a single executor attempt.
//!
//! Invalid references (`get`/`cancel` on an unknown id) are not errors:
//! they return `None`/`false` from the queue surface.

use thiserror::Error;

/// # Errors raised at queue construction time.
///
/// These represent misconfiguration, not runtime conditions, and are
/// surfaced before any task is accepted.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Concurrency capacity must admit at least one task.
    #[error("capacity must be at least 1")]
    ZeroCapacity,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroCapacity => "config_zero_capacity",
        }
    }
}

/// # Failure outcome of an executor attempt.
///
/// The executor adapter reports failures with this shape; panics inside the
/// adapter are caught by the queue and normalized into an `ExecError`
/// carrying the panic message. The retry coordinator never sees anything
/// else cross the adapter boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecError {
    /// Human-readable cause; becomes the task's `failure_reason` when the
    /// retry ceiling is exhausted.
    pub message: String,
}

impl ExecError {
    /// Creates a failure outcome with the given cause.
    ///
    /// # Example
    /// ```
    /// use txqueue::ExecError;
    ///
    /// let err = ExecError::new("nonce too low");
    /// assert_eq!(err.to_string(), "nonce too low");
    /// ```
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ExecError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ExecError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
