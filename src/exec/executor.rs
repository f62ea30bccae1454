//! # Executor adapter boundary.
//!
//! The queue performs no work itself: every admitted task is handed to an
//! injected [`Execute`] capability, which signs/broadcasts/calls whatever
//! the task's kind requires and reports success or failure.
//!
//! The adapter receives the task's [`CancellationToken`] as a cooperative
//! cancellation hook. Honoring it is optional: if the adapter ignores the
//! token, a cancelled in-flight call runs to completion and its outcome is
//! discarded by the queue.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::ExecError;
use crate::tasks::Task;

/// Shared handle to an executor adapter.
pub type ExecRef = Arc<dyn Execute>;

/// # The capability that actually performs a task's work.
///
/// Returns the external result handle (e.g. a transaction hash) on success,
/// or an [`ExecError`] carrying the cause on failure. The queue places no
/// constraints on what happens inside; it only interprets the outcome.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use txqueue::{ExecError, Execute, Task};
///
/// struct Broadcaster;
///
/// #[async_trait]
/// impl Execute for Broadcaster {
///     async fn execute(&self, task: &Task, ctx: CancellationToken) -> Result<String, ExecError> {
///         if ctx.is_cancelled() {
///             return Err(ExecError::new("cancelled before broadcast"));
///         }
///         // sign and broadcast task.payload ...
///         Ok(format!("0xhash-for-{}", task.id))
///     }
/// }
/// ```
#[async_trait]
pub trait Execute: Send + Sync + 'static {
    /// Performs one attempt of the task's work.
    ///
    /// `ctx` is cancelled when the caller cancels the task; implementations
    /// should check it at convenient points and bail out early, but are not
    /// required to.
    async fn execute(&self, task: &Task, ctx: CancellationToken) -> Result<String, ExecError>;
}
