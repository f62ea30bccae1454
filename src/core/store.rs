//! # Task store: authoritative registry and state machine.
//!
//! Holds the canonical set of tasks partitioned by lifecycle stage:
//!
//! ```text
//! ┌───────────────────────────── TaskStore ─────────────────────────────┐
//! │  tasks:   id → Task            (all tasks, any status)              │
//! │  waiting: [id, id, ...]        (admission order; retries at FRONT)  │
//! │  in_flight: usize              (slot accounting)                    │
//! │  tokens:  id → CancellationToken   (one per admitted task)          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every state transition is one method and one critical section under a
//! single mutex, so the partition invariants hold at every instant:
//! - a task is in the waiting deque iff its status is `Waiting`;
//! - `in_flight` equals the number of tasks with status `InFlight`;
//! - `in_flight` never exceeds the capacity passed to [`TaskStore::admit_next`].
//!
//! Methods return clone-out snapshots; callers deliver notifications after
//! the lock is released, so observers may re-enter the store.

use std::collections::{HashMap, VecDeque};
use std::time::SystemTime;

use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::tasks::{Task, TaskId, TaskKind, TaskStatus};

/// Counts derived from the store partitions at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Tasks waiting for admission.
    pub waiting: usize,
    /// Tasks currently occupying a slot.
    pub in_flight: usize,
    /// All tasks in the store, terminal ones included.
    pub total: usize,
}

/// Result of reporting a failed attempt.
pub(crate) enum FailOutcome {
    /// Retry granted; `task.attempt` has been incremented. The task keeps
    /// its slot until the backoff delay elapses and it is re-admitted to
    /// the waiting partition.
    Retry {
        task: Task,
        token: CancellationToken,
    },
    /// Retry ceiling exhausted; the task is now terminally `Failed`.
    Exhausted(Task),
    /// The task was no longer in flight (cancelled mid-flight); the
    /// outcome is dropped without a transition.
    Discarded,
}

/// Result of a cancellation request.
pub(crate) enum CancelOutcome {
    /// The task was waiting; it never executes.
    FromWaiting(Task),
    /// The task was in flight; its token has been cancelled and its slot
    /// freed. The executor call, if still running, resolves into nothing.
    FromFlight(Task),
    /// Unknown id or already-terminal task.
    Rejected,
}

#[derive(Default)]
struct State {
    tasks: HashMap<TaskId, Task>,
    waiting: VecDeque<TaskId>,
    in_flight: usize,
    tokens: HashMap<TaskId, CancellationToken>,
}

/// Authoritative registry of tasks and their partition membership.
#[derive(Default)]
pub(crate) struct TaskStore {
    state: Mutex<State>,
}

impl TaskStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Creates a task in `Waiting` at the back of the admission order.
    pub(crate) fn submit(&self, kind: TaskKind, payload: serde_json::Value) -> Task {
        let task = Task::new(kind, payload);
        let mut state = self.state.lock();
        state.waiting.push_back(task.id);
        state.tasks.insert(task.id, task.clone());
        task
    }

    /// Admits the head of the waiting deque if a slot is free.
    ///
    /// The capacity check and the `Waiting → InFlight` transition happen in
    /// the same critical section, so the in-flight count can never exceed
    /// `capacity`, no matter how many threads pump concurrently.
    pub(crate) fn admit_next(&self, capacity: usize) -> Option<(Task, CancellationToken)> {
        let mut state = self.state.lock();
        if state.in_flight >= capacity {
            return None;
        }
        let id = state.waiting.pop_front()?;
        let task = state.tasks.get_mut(&id)?;
        task.status = TaskStatus::InFlight;
        let task = task.clone();
        let token = CancellationToken::new();
        state.in_flight += 1;
        state.tokens.insert(id, token.clone());
        Some((task, token))
    }

    /// Applies a successful outcome: `InFlight → Succeeded`.
    ///
    /// Returns `None` when the task is no longer in flight (cancelled while
    /// the executor ran); the outcome is discarded in that case.
    pub(crate) fn settle_success(&self, id: TaskId, handle: String) -> Option<Task> {
        let mut state = self.state.lock();
        let task = state.tasks.get_mut(&id)?;
        if task.status != TaskStatus::InFlight {
            return None;
        }
        task.status = TaskStatus::Succeeded;
        task.result = Some(handle);
        task.completed_at = Some(SystemTime::now());
        let task = task.clone();
        state.in_flight -= 1;
        state.tokens.remove(&id);
        Some(task)
    }

    /// Applies a failed outcome.
    ///
    /// The retry guard compares `attempt` against the ceiling **before**
    /// incrementing: a task whose executor always fails runs
    /// `1 + max_retries` times and terminates with `attempt == max_retries`.
    pub(crate) fn fail_attempt(&self, id: TaskId, max_retries: u32, cause: String) -> FailOutcome {
        let mut state = self.state.lock();
        let Some(task) = state.tasks.get_mut(&id) else {
            return FailOutcome::Discarded;
        };
        if task.status != TaskStatus::InFlight {
            return FailOutcome::Discarded;
        }

        if task.attempt < max_retries {
            task.attempt += 1;
            let task = task.clone();
            // Slot stays occupied through the backoff window; the sleeper
            // frees it when the delay elapses.
            let token = state.tokens.get(&id).cloned().unwrap_or_default();
            FailOutcome::Retry { task, token }
        } else {
            task.status = TaskStatus::Failed;
            task.failure_reason = Some(cause);
            task.completed_at = Some(SystemTime::now());
            let task = task.clone();
            state.in_flight -= 1;
            state.tokens.remove(&id);
            FailOutcome::Exhausted(task)
        }
    }

    /// Re-admits a retried task to the FRONT of the waiting deque.
    ///
    /// This is the slot-freed point of the retry path: `InFlight → Waiting`
    /// after the backoff delay. Front insertion gives retries scheduling
    /// priority over never-run tasks. Returns `None` when the task was
    /// cancelled during the backoff window.
    pub(crate) fn requeue_front(&self, id: TaskId) -> Option<Task> {
        let mut state = self.state.lock();
        let task = state.tasks.get_mut(&id)?;
        if task.status != TaskStatus::InFlight {
            return None;
        }
        task.status = TaskStatus::Waiting;
        let task = task.clone();
        state.in_flight -= 1;
        state.tokens.remove(&id);
        state.waiting.push_front(id);
        Some(task)
    }

    /// Cancels a task unless it already reached success or failure.
    ///
    /// A waiting task is removed from the deque immediately and never
    /// executes. An in-flight task is marked terminal and its slot freed at
    /// once; the executor keeps running until it resolves on its own, and
    /// whatever it reports is discarded.
    pub(crate) fn cancel(&self, id: TaskId) -> CancelOutcome {
        let mut state = self.state.lock();
        let Some(task) = state.tasks.get_mut(&id) else {
            return CancelOutcome::Rejected;
        };
        match task.status {
            TaskStatus::Waiting => {
                task.status = TaskStatus::Cancelled;
                task.completed_at = Some(SystemTime::now());
                let task = task.clone();
                state.waiting.retain(|queued| *queued != id);
                CancelOutcome::FromWaiting(task)
            }
            TaskStatus::InFlight => {
                task.status = TaskStatus::Cancelled;
                task.completed_at = Some(SystemTime::now());
                let task = task.clone();
                state.in_flight -= 1;
                if let Some(token) = state.tokens.remove(&id) {
                    token.cancel();
                }
                CancelOutcome::FromFlight(task)
            }
            _ => CancelOutcome::Rejected,
        }
    }

    pub(crate) fn get(&self, id: TaskId) -> Option<Task> {
        self.state.lock().tasks.get(&id).cloned()
    }

    /// All tasks, ordered by submission time (id as tiebreaker).
    pub(crate) fn list_all(&self) -> Vec<Task> {
        let state = self.state.lock();
        let mut tasks: Vec<Task> = state.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        tasks
    }

    /// Waiting tasks in admission order (retries first, then FIFO).
    pub(crate) fn list_waiting(&self) -> Vec<Task> {
        let state = self.state.lock();
        state
            .waiting
            .iter()
            .filter_map(|id| state.tasks.get(id).cloned())
            .collect()
    }

    /// Removes every task with a terminal status.
    pub(crate) fn evict_completed(&self) {
        let mut state = self.state.lock();
        state.tasks.retain(|_, task| !task.status.is_terminal());
    }

    pub(crate) fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            waiting: state.waiting.len(),
            in_flight: state.in_flight,
            total: state.tasks.len(),
        }
    }
}
