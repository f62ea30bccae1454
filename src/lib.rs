//! # txqueue
//!
//! **txqueue** is a client-side dispatcher for discrete units of work
//! (in the source domain, blockchain transaction submissions). It executes
//! submitted tasks asynchronously under a concurrency ceiling, retries
//! failures with exponential backoff, and supports cooperative
//! cancellation. The actual work is performed by an injected executor; the
//! queue only schedules it and interprets the outcome.
//!
//! ## Architecture
//! ```text
//!  submit / cancel / get / stats / evict        subscribe(observer)
//!                │                                      │
//!                ▼                                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  TaskQueue                                                        │
//! │  - TaskStore (waiting deque + in-flight slots, one mutex)         │
//! │  - admission loop ("pump": fill free slots, never exceed cap)     │
//! │  - retry coordinator (backoff timers, attempt accounting)         │
//! │  - SubscriberSet (sync fan-out on every status transition)        │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐      ┌──────────┐      ┌──────────┐
//!   │  flight  │      │  flight  │      │  flight  │   (≤ capacity,
//!   │ (tokio   │      │ (tokio   │      │ (tokio   │    one per
//!   │  task)   │      │  task)   │      │  task)   │    admitted task)
//!   └────┬─────┘      └────┬─────┘      └────┬─────┘
//!        │                 │                 │
//!        ▼                 ▼                 ▼
//!   Execute::execute(task, token)   — injected adapter, catch_unwind
//! ```
//!
//! ## Lifecycle
//! ```text
//! submit ──► Waiting ──► InFlight ──► Succeeded (result handle)
//!               │            │  ▲ ──► Failed    (retries exhausted)
//!               │            │  │
//!               │            └──┘ backoff: base × 2^(attempt-1),
//!               │                 re-admitted at the FRONT of waiting
//!               │            │
//!               └────────────┴──► Cancelled (waiting: exact; in-flight:
//!                                 best-effort, outcome discarded)
//! ```
//!
//! ## Features
//! | Area             | Description                                          | Key types                        |
//! |------------------|------------------------------------------------------|----------------------------------|
//! | **Submission**   | Enqueue work; FIFO admission with retry priority.    | [`TaskQueue`], [`TaskKind`]      |
//! | **Concurrency**  | At most `capacity` tasks in flight, enforced always. | [`QueueConfig`]                  |
//! | **Retries**      | Bounded retries with deterministic backoff.          | [`BackoffPolicy`]                |
//! | **Cancellation** | Exact for waiting tasks, cooperative for in-flight.  | [`TaskQueue::cancel`]            |
//! | **Execution**    | Injected adapter boundary; panics become failures.   | [`Execute`], [`ExecFn`]          |
//! | **Observability**| Synchronous per-transition fan-out, `tracing` logs.  | [`Subscribe`], [`Subscription`]  |
//! | **Introspection**| Snapshots and live partition counts.                 | [`Task`], [`QueueStats`]         |
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use txqueue::{ExecError, ExecFn, QueueConfig, Task, TaskKind, TaskQueue, TaskStatus};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // The executor is the only place real work happens.
//!     let exec = ExecFn::arc(|task: Task, _ctx: CancellationToken| async move {
//!         // sign and broadcast task.payload ...
//!         Ok::<_, ExecError>(format!("0xhash-{}", task.id))
//!     });
//!
//!     let queue = TaskQueue::new(QueueConfig::default(), exec)?;
//!
//!     let _sub = queue.subscribe(|task: &Task| {
//!         println!("{} -> {:?}", task.id, task.status);
//!     });
//!
//!     let id = queue.submit(TaskKind::Transfer, serde_json::json!({"to": "0xabc"}));
//!
//!     // Wait for the terminal status.
//!     loop {
//!         match queue.get(id) {
//!             Some(task) if task.status.is_terminal() => {
//!                 assert_eq!(task.status, TaskStatus::Succeeded);
//!                 break;
//!             }
//!             _ => tokio::time::sleep(std::time::Duration::from_millis(10)).await,
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod exec;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::QueueConfig;
pub use core::{QueueStats, TaskQueue};
pub use error::{ConfigError, ExecError};
pub use exec::{ExecFn, ExecRef, Execute};
pub use policies::BackoffPolicy;
pub use subscribers::{Subscribe, Subscription};
pub use tasks::{Task, TaskId, TaskKind, TaskStatus};
