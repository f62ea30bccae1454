//! # Task record and lifecycle status.
//!
//! [`Task`] is the unit of work tracked by the queue: an opaque payload
//! tagged with a [`TaskKind`], moving through the [`TaskStatus`] state
//! machine until it reaches a terminal status.
//!
//! ## State machine
//! ```text
//! Waiting ──► InFlight ──► Succeeded
//!    │            │  ▲ ──► Failed
//!    │            │  │
//!    │            └──┘ (retryable failure, after backoff)
//!    │            │
//!    └────────────┴──► Cancelled
//! ```
//!
//! ## Rules
//! - `id`, `kind`, and `payload` are immutable after creation.
//! - `attempt` only increases; it never exceeds the retry ceiling while the
//!   task is non-terminal.
//! - `result` is set only on `Succeeded`; `failure_reason` only on `Failed`.
//! - `completed_at` is stamped on entry to a terminal status and never
//!   changes afterwards.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a task, assigned at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Tag selecting which executor behavior applies to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Move funds out of the account.
    Withdraw,
    /// Transfer to another account.
    Transfer,
    /// Grant a spending allowance.
    Approve,
    /// Application-defined behavior, identified by label.
    Custom(String),
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Withdraw => f.write_str("withdraw"),
            TaskKind::Transfer => f.write_str("transfer"),
            TaskKind::Approve => f.write_str("approve"),
            TaskKind::Custom(label) => write!(f, "custom:{label}"),
        }
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued, not yet admitted by the limiter.
    Waiting,
    /// Admitted; the executor is running (or a retry is pending backoff).
    InFlight,
    /// Executor reported success; `result` holds the external handle.
    Succeeded,
    /// Retry ceiling exhausted; `failure_reason` holds the last cause.
    Failed,
    /// Cancelled by the caller before reaching success or failure.
    Cancelled,
}

impl TaskStatus {
    /// Returns `true` for `Succeeded`, `Failed`, and `Cancelled`.
    ///
    /// Terminal tasks never transition again; their eventual executor
    /// outcome (if one is still in progress) is discarded.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// A unit of work tracked by the queue.
///
/// The queue hands out clones of the record; mutation happens only inside
/// the store, one transition at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique id, assigned at submission.
    pub id: TaskId,
    /// Which executor behavior applies.
    pub kind: TaskKind,
    /// Opaque executor-defined parameters.
    pub payload: serde_json::Value,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Number of failed attempts so far.
    pub attempt: u32,
    /// External handle (e.g. a transaction hash); set only on success.
    pub result: Option<String>,
    /// Cause of the terminal failure; set only on `Failed`.
    pub failure_reason: Option<String>,
    /// When the task was submitted.
    pub created_at: SystemTime,
    /// When the task reached a terminal status.
    pub completed_at: Option<SystemTime>,
}

impl Task {
    pub(crate) fn new(kind: TaskKind, payload: serde_json::Value) -> Self {
        Self {
            id: TaskId::generate(),
            kind,
            payload,
            status: TaskStatus::Waiting,
            attempt: 0,
            result: None,
            failure_reason: None,
            created_at: SystemTime::now(),
            completed_at: None,
        }
    }
}
