//! # Function-backed executor (`ExecFn`)
//!
//! [`ExecFn`] wraps a closure `F: Fn(Task, CancellationToken) -> Fut`,
//! producing a fresh future per attempt. This avoids shared mutable state;
//! if attempts need common state, put an `Arc<...>` inside the closure
//! explicitly.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use txqueue::{ExecError, ExecFn, ExecRef, Task};
//!
//! let exec: ExecRef = ExecFn::arc(|task: Task, _ctx: CancellationToken| async move {
//!     Ok::<_, ExecError>(format!("0x{}", task.id))
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ExecError;
use crate::exec::executor::Execute;
use crate::tasks::Task;

/// Function-backed executor implementation.
///
/// Wraps a closure that *creates* a new future per attempt.
#[derive(Debug)]
pub struct ExecFn<F> {
    f: F,
}

impl<F> ExecFn<F> {
    /// Creates a new function-backed executor.
    ///
    /// Prefer [`ExecFn::arc`] when you immediately need an [`ExecRef`](crate::ExecRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the executor and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Execute for ExecFn<F>
where
    F: Fn(Task, CancellationToken) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<String, ExecError>> + Send + 'static,
{
    async fn execute(&self, task: &Task, ctx: CancellationToken) -> Result<String, ExecError> {
        (self.f)(task.clone(), ctx).await
    }
}
