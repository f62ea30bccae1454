//! # TaskQueue: admission, execution, retry, and settlement.
//!
//! Owns the [`TaskStore`], the subscriber set, and the executor handle, and
//! drives every task through its lifecycle:
//!
//! ```text
//! submit(kind, payload)
//!   ├─► store: create Waiting task ──► notify(Waiting)
//!   └─► pump()
//!         while in_flight < capacity and waiting non-empty:
//!           ├─► store: Waiting → InFlight (atomic with capacity check)
//!           ├─► notify(InFlight)
//!           └─► spawn flight:
//!                 executor.execute(task, token)   (catch_unwind)
//!                   ├─ Ok(handle) ──► Succeeded ──► notify ──► pump()
//!                   ├─ Err, attempt < max ──► attempt += 1
//!                   │     └─► sleep(backoff)      (cancellable)
//!                   │           └─► Waiting @ FRONT ──► notify ──► pump()
//!                   ├─ Err, attempt = max ──► Failed ──► notify ──► pump()
//!                   └─ panic ──► normalized into Err (same paths as above)
//! ```
//!
//! ## Rules
//! - The in-flight count never exceeds capacity at any instant: the check
//!   and the transition share one critical section in the store.
//! - Each flight is an owned tokio task; its completion path runs after
//!   `catch_unwind`, so the slot-freed signal fires exactly once even when
//!   the executor panics.
//! - A task cancelled mid-flight stays `Cancelled`: settlement discards
//!   outcomes for tasks that are no longer in flight.
//! - No internal timeouts. An executor that never resolves holds its slot
//!   forever; wrap the executor if you need bounded attempts.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::QueueConfig;
use crate::core::store::{CancelOutcome, FailOutcome, QueueStats, TaskStore};
use crate::error::{ConfigError, ExecError};
use crate::exec::ExecRef;
use crate::subscribers::set::panic_message;
use crate::subscribers::{Subscribe, SubscriberSet, Subscription};
use crate::tasks::{Task, TaskId, TaskKind};

struct Shared {
    cfg: QueueConfig,
    store: TaskStore,
    subs: Arc<SubscriberSet>,
    exec: ExecRef,
}

/// Client-side dispatcher for units of work.
///
/// Accepts tasks, executes them through the injected [`Execute`] adapter
/// under a concurrency ceiling, retries failures with exponential backoff,
/// and notifies subscribers of every status transition.
///
/// The queue is an explicitly constructed, owned instance; clone the handle
/// to share it. All methods are synchronous and non-blocking, but `submit`
/// and `cancel` spawn work and must be called within a tokio runtime.
///
/// [`Execute`]: crate::Execute
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use txqueue::{ExecError, ExecFn, QueueConfig, Task, TaskKind, TaskQueue};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), txqueue::ConfigError> {
/// let exec = ExecFn::arc(|task: Task, _ctx: CancellationToken| async move {
///     Ok::<_, ExecError>(format!("0xhash-{}", task.id))
/// });
/// let queue = TaskQueue::new(QueueConfig::default(), exec)?;
///
/// let id = queue.submit(TaskKind::Transfer, serde_json::json!({"to": "0xabc"}));
/// assert!(queue.get(id).is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TaskQueue {
    shared: Arc<Shared>,
}

impl TaskQueue {
    /// Creates a queue with the given configuration and executor.
    ///
    /// Fails fast on invalid configuration; a misconfigured queue never
    /// accepts a task.
    pub fn new(cfg: QueueConfig, exec: ExecRef) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                cfg,
                store: TaskStore::new(),
                subs: Arc::new(SubscriberSet::new()),
                exec,
            }),
        })
    }

    /// Submits a task; it starts `Waiting` and is admitted as soon as a
    /// slot is free. Always succeeds.
    pub fn submit(&self, kind: TaskKind, payload: serde_json::Value) -> TaskId {
        let task = self.shared.store.submit(kind, payload);
        let id = task.id;
        debug!(task = %id, kind = %task.kind, "task submitted");
        self.shared.subs.emit(&task);
        Shared::pump(&self.shared);
        id
    }

    /// Requests cancellation of a task.
    ///
    /// Returns `true` if cancellation was applied, `false` if the task is
    /// unknown or already terminal. Cancelling a waiting task is exact: it
    /// never executes. Cancelling an in-flight task is best-effort: the
    /// task is marked `Cancelled` immediately and its slot freed, the
    /// executor's token is cancelled as a cooperative hint, and whatever
    /// the executor eventually reports is discarded.
    pub fn cancel(&self, id: TaskId) -> bool {
        match self.shared.store.cancel(id) {
            CancelOutcome::FromWaiting(task) => {
                debug!(task = %id, "cancelled while waiting");
                self.shared.subs.emit(&task);
                true
            }
            CancelOutcome::FromFlight(task) => {
                debug!(task = %id, "cancelled in flight");
                self.shared.subs.emit(&task);
                Shared::pump(&self.shared);
                true
            }
            CancelOutcome::Rejected => false,
        }
    }

    /// Returns a snapshot of the task, or `None` for an unknown id.
    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.shared.store.get(id)
    }

    /// Snapshots of all tasks in the store, terminal ones included.
    pub fn list_all(&self) -> Vec<Task> {
        self.shared.store.list_all()
    }

    /// Waiting tasks in admission order.
    ///
    /// FIFO by submission, except that retried tasks re-enter at the front
    /// and are scheduled before tasks that have never run. Under sustained
    /// retry load this can starve older never-tried tasks.
    pub fn list_waiting(&self) -> Vec<Task> {
        self.shared.store.list_waiting()
    }

    /// Counts derived from the store partitions at this instant.
    pub fn stats(&self) -> QueueStats {
        self.shared.store.stats()
    }

    /// Registers an observer for every status transition.
    ///
    /// Delivery is synchronous with the transition, in registration order,
    /// starting with the initial `Waiting` of tasks submitted afterwards.
    pub fn subscribe(&self, observer: impl Subscribe) -> Subscription {
        self.shared.subs.subscribe(Arc::new(observer))
    }

    /// Removes every task with a terminal status from the store.
    /// Waiting and in-flight tasks are unaffected.
    pub fn evict_completed(&self) {
        self.shared.store.evict_completed();
    }
}

impl Shared {
    /// Admission loop: fills free slots from the waiting deque.
    ///
    /// Runs on every submit, every slot-freed event, and every retry
    /// re-admission. Non-blocking: flights are spawned, not awaited.
    fn pump(this: &Arc<Shared>) {
        while let Some((task, token)) = this.store.admit_next(this.cfg.capacity) {
            debug!(task = %task.id, attempt = task.attempt, "task admitted");
            this.subs.emit(&task);
            Shared::spawn_flight(this, task, token);
        }
    }

    /// Spawns one executor attempt as an owned tokio task.
    ///
    /// The settlement path runs unconditionally: panics are caught and
    /// normalized into failure outcomes, so the slot is always released.
    fn spawn_flight(this: &Arc<Shared>, task: Task, token: CancellationToken) {
        let shared = Arc::clone(this);
        tokio::spawn(async move {
            let id = task.id;
            let call = shared.exec.execute(&task, token);
            let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic_err) => Err(ExecError::new(panic_message(&*panic_err))),
            };
            Shared::settle(&shared, id, outcome);
        });
    }

    /// Interprets one executor outcome.
    fn settle(this: &Arc<Shared>, id: TaskId, outcome: Result<String, ExecError>) {
        match outcome {
            Ok(handle) => {
                if let Some(task) = this.store.settle_success(id, handle) {
                    debug!(task = %id, attempt = task.attempt, "task succeeded");
                    this.subs.emit(&task);
                    Shared::pump(this);
                } else {
                    debug!(task = %id, "late success discarded");
                }
            }
            Err(cause) => match this.store.fail_attempt(id, this.cfg.max_retries, cause.message) {
                FailOutcome::Retry { task, token } => {
                    let delay = this.cfg.backoff.delay(task.attempt);
                    debug!(
                        task = %id,
                        attempt = task.attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retry scheduled"
                    );
                    Shared::spawn_requeue_timer(this, id, delay, token);
                }
                FailOutcome::Exhausted(task) => {
                    warn!(
                        task = %id,
                        attempt = task.attempt,
                        reason = task.failure_reason.as_deref().unwrap_or(""),
                        "retries exhausted"
                    );
                    this.subs.emit(&task);
                    Shared::pump(this);
                }
                FailOutcome::Discarded => {
                    debug!(task = %id, "late failure discarded");
                }
            },
        }
    }

    /// Waits out the backoff delay, then re-admits the task at the front
    /// of the waiting deque.
    ///
    /// The wait is cancellable: if the task is cancelled during the backoff
    /// window, the timer aborts and no re-admission happens. The store
    /// check repeats under the lock, so a cancellation racing the timer
    /// expiry is still honored.
    fn spawn_requeue_timer(this: &Arc<Shared>, id: TaskId, delay: Duration, token: CancellationToken) {
        let shared = Arc::clone(this);
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = token.cancelled() => return,
            }
            if let Some(task) = shared.store.requeue_front(id) {
                debug!(task = %id, attempt = task.attempt, "task re-admitted after backoff");
                shared.subs.emit(&task);
                Shared::pump(&shared);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ExecFn;
    use crate::policies::BackoffPolicy;
    use crate::tasks::TaskStatus;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::time::Duration;

    fn config(capacity: usize, max_retries: u32) -> QueueConfig {
        QueueConfig {
            capacity,
            max_retries,
            backoff: BackoffPolicy {
                base: Duration::from_millis(1000),
            },
        }
    }

    fn succeed_after(delay: Duration) -> ExecRef {
        ExecFn::arc(move |task: Task, _ctx: CancellationToken| async move {
            time::sleep(delay).await;
            Ok(format!("0x{}", task.id))
        })
    }

    fn always_fail(reason: &'static str) -> ExecRef {
        ExecFn::arc(move |_task: Task, _ctx: CancellationToken| async move {
            Err(ExecError::new(reason))
        })
    }

    /// Polls until the task satisfies `pred`; virtual time advances while
    /// polling, so backoff windows elapse without real waiting.
    async fn wait_for(queue: &TaskQueue, id: TaskId, pred: impl Fn(&Task) -> bool) -> Task {
        for _ in 0..50_000 {
            if let Some(task) = queue.get(id) {
                if pred(&task) {
                    return task;
                }
            }
            time::sleep(Duration::from_millis(1)).await;
        }
        panic!("task {id} never reached the expected state");
    }

    /// Observer recording (id, status) pairs in delivery order.
    fn recording_observer(log: Arc<Mutex<Vec<(TaskId, TaskStatus)>>>) -> impl Subscribe {
        move |task: &Task| {
            log.lock().push((task.id, task.status));
        }
    }

    #[test]
    fn test_zero_capacity_rejected_at_construction() {
        let err = TaskQueue::new(config(0, 3), always_fail("unused")).err();
        assert_eq!(err, Some(ConfigError::ZeroCapacity));
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_never_exceeds_capacity() {
        let queue = TaskQueue::new(config(2, 3), succeed_after(Duration::from_millis(50))).unwrap();

        let max_seen = Arc::new(AtomicUsize::new(0));
        let observer = {
            let queue = queue.clone();
            let max_seen = Arc::clone(&max_seen);
            move |_task: &Task| {
                max_seen.fetch_max(queue.stats().in_flight, Ordering::SeqCst);
            }
        };
        let _sub = queue.subscribe(observer);

        let ids: Vec<TaskId> = (0..5)
            .map(|i| queue.submit(TaskKind::Transfer, serde_json::json!({ "n": i })))
            .collect();
        assert_eq!(queue.stats().in_flight, 2);
        assert_eq!(queue.stats().waiting, 3);

        for id in ids {
            let task = wait_for(&queue, id, |t| t.status.is_terminal()).await;
            assert_eq!(task.status, TaskStatus::Succeeded);
            assert!(task.result.is_some());
        }
        assert!(max_seen.load(Ordering::SeqCst) <= 2);
        assert_eq!(queue.stats().in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_task_admitted_only_after_a_slot_frees() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let queue = TaskQueue::new(config(2, 3), succeed_after(Duration::from_millis(50))).unwrap();
        let _sub = queue.subscribe(recording_observer(Arc::clone(&log)));

        let a = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        let b = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        let c = queue.submit(TaskKind::Transfer, serde_json::Value::Null);

        wait_for(&queue, c, |t| t.status.is_terminal()).await;

        let log = log.lock();
        let c_admitted = log
            .iter()
            .position(|(id, status)| *id == c && *status == TaskStatus::InFlight)
            .expect("third task was admitted");
        let first_success = log
            .iter()
            .position(|(id, status)| {
                (*id == a || *id == b) && *status == TaskStatus::Succeeded
            })
            .expect("an earlier task succeeded");
        assert!(
            first_success < c_admitted,
            "third task admitted before any slot freed"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_task_runs_four_times_then_fails() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let queue = TaskQueue::new(config(1, 3), always_fail("rpc unreachable")).unwrap();
        let _sub = queue.subscribe(recording_observer(Arc::clone(&log)));

        let started = time::Instant::now();
        let id = queue.submit(TaskKind::Withdraw, serde_json::Value::Null);
        let task = wait_for(&queue, id, |t| t.status.is_terminal()).await;

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.attempt, 3);
        assert_eq!(task.failure_reason.as_deref(), Some("rpc unreachable"));
        assert!(task.completed_at.is_some());

        let admissions = log
            .lock()
            .iter()
            .filter(|(tid, status)| *tid == id && *status == TaskStatus::InFlight)
            .count();
        assert_eq!(admissions, 4, "1 initial run + 3 retries");

        // Backoff between runs: 1s + 2s + 4s of virtual time.
        assert!(started.elapsed() >= Duration::from_millis(7000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds_with_attempt_two() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicU32::new(0));
        let exec = {
            let calls = Arc::clone(&calls);
            ExecFn::arc(move |task: Task, _ctx: CancellationToken| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ExecError::new("flaky"))
                    } else {
                        Ok(format!("0x{}", task.id))
                    }
                }
            })
        };
        let queue = TaskQueue::new(config(1, 3), exec).unwrap();
        let _sub = queue.subscribe(recording_observer(Arc::clone(&log)));

        let id = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        let task = wait_for(&queue, id, |t| t.status.is_terminal()).await;

        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.attempt, 2, "attempt equals failure count at success");

        let log = log.lock();
        let admissions = log
            .iter()
            .filter(|(tid, status)| *tid == id && *status == TaskStatus::InFlight)
            .count();
        let waits = log
            .iter()
            .filter(|(tid, status)| *tid == id && *status == TaskStatus::Waiting)
            .count();
        assert_eq!(admissions, 3, "waiting → in_flight exactly N+1 times");
        assert_eq!(waits, 3, "initial waiting + one re-admission per failure");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_waiting_is_immediate_and_exact() {
        let queue = TaskQueue::new(config(1, 3), succeed_after(Duration::from_secs(10))).unwrap();

        let _blocker = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        let parked = queue.submit(TaskKind::Approve, serde_json::Value::Null);
        assert_eq!(queue.list_waiting().len(), 1);

        assert!(queue.cancel(parked));
        assert!(queue.list_waiting().is_empty());

        let task = queue.get(parked).unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
        assert!(task.completed_at.is_some());

        assert!(!queue.cancel(parked), "second cancel reports false");

        // The cancelled task never executes: long after the blocker's
        // window it still has no result and no attempts.
        time::sleep(Duration::from_secs(30)).await;
        let task = queue.get(parked).unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
        assert!(task.result.is_none());
        assert_eq!(task.attempt, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_in_flight_discards_late_success() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let queue = TaskQueue::new(config(1, 3), succeed_after(Duration::from_millis(100))).unwrap();
        let _sub = queue.subscribe(recording_observer(Arc::clone(&log)));

        let doomed = queue.submit(TaskKind::Withdraw, serde_json::Value::Null);
        assert_eq!(queue.get(doomed).unwrap().status, TaskStatus::InFlight);

        assert!(queue.cancel(doomed));
        assert_eq!(queue.get(doomed).unwrap().status, TaskStatus::Cancelled);

        // Slot freed immediately: the next submission is admitted while the
        // first executor call is still sleeping.
        let follower = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        assert_eq!(queue.get(follower).unwrap().status, TaskStatus::InFlight);

        wait_for(&queue, follower, |t| t.status.is_terminal()).await;
        time::sleep(Duration::from_millis(200)).await;

        let task = queue.get(doomed).unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled, "late success ignored");
        assert!(task.result.is_none());

        let doomed_events: Vec<TaskStatus> = log
            .lock()
            .iter()
            .filter(|(id, _)| *id == doomed)
            .map(|(_, status)| *status)
            .collect();
        assert_eq!(
            doomed_events,
            vec![
                TaskStatus::Waiting,
                TaskStatus::InFlight,
                TaskStatus::Cancelled
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_window() {
        let queue = TaskQueue::new(config(1, 3), always_fail("still down")).unwrap();

        let id = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        let task = wait_for(&queue, id, |t| t.attempt == 1).await;
        assert_eq!(task.status, TaskStatus::InFlight, "slot held during backoff");

        assert!(queue.cancel(id));
        time::sleep(Duration::from_secs(5)).await;

        let task = queue.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
        assert_eq!(queue.stats().in_flight, 0);
        assert!(queue.list_waiting().is_empty(), "timer did not re-admit");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_outranks_never_run_tasks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let exec = ExecFn::arc(|task: Task, _ctx: CancellationToken| async move {
            if task.kind == TaskKind::Custom("flaky".into()) && task.attempt == 0 {
                Err(ExecError::new("first run fails"))
            } else {
                Ok(format!("0x{}", task.id))
            }
        });
        let queue = TaskQueue::new(config(1, 3), exec).unwrap();
        let _sub = queue.subscribe(recording_observer(Arc::clone(&log)));

        let flaky = queue.submit(TaskKind::Custom("flaky".into()), serde_json::Value::Null);
        let patient = queue.submit(TaskKind::Transfer, serde_json::Value::Null);

        wait_for(&queue, patient, |t| t.status.is_terminal()).await;

        let log = log.lock();
        let flaky_done = log
            .iter()
            .position(|(id, status)| *id == flaky && *status == TaskStatus::Succeeded)
            .expect("flaky task succeeded on retry");
        let patient_admitted = log
            .iter()
            .position(|(id, status)| *id == patient && *status == TaskStatus::InFlight)
            .expect("patient task ran");
        assert!(
            flaky_done < patient_admitted,
            "re-admitted retry is scheduled before the never-run task"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_sees_one_notification_per_transition() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let queue = TaskQueue::new(config(3, 3), succeed_after(Duration::from_millis(10))).unwrap();
        let _sub = queue.subscribe(recording_observer(Arc::clone(&log)));

        let id = queue.submit(TaskKind::Approve, serde_json::Value::Null);
        wait_for(&queue, id, |t| t.status.is_terminal()).await;

        let events: Vec<TaskStatus> = log
            .lock()
            .iter()
            .filter(|(tid, _)| *tid == id)
            .map(|(_, status)| *status)
            .collect();
        assert_eq!(
            events,
            vec![
                TaskStatus::Waiting,
                TaskStatus::InFlight,
                TaskStatus::Succeeded
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribed_observer_gets_nothing() {
        let hits = Arc::new(AtomicUsize::new(0));
        let queue = TaskQueue::new(config(1, 0), succeed_after(Duration::from_millis(10))).unwrap();

        let hits_clone = Arc::clone(&hits);
        let sub = queue.subscribe(move |_task: &Task| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();

        let id = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        wait_for(&queue, id, |t| t.status.is_terminal()).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_executor_panic_becomes_failure_reason() {
        let queue = TaskQueue::new(
            config(1, 0),
            ExecFn::arc(|task: Task, _ctx: CancellationToken| async move {
                if task.attempt == 0 {
                    panic!("executor exploded");
                }
                Ok(format!("0x{}", task.id))
            }),
        )
        .unwrap();

        let id = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        let task = wait_for(&queue, id, |t| t.status.is_terminal()).await;

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.attempt, 0, "max_retries = 0 fails on the first run");
        assert!(
            task.failure_reason
                .as_deref()
                .unwrap_or("")
                .contains("executor exploded")
        );
        assert_eq!(queue.stats().in_flight, 0, "slot released despite panic");
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_completed_removes_only_terminal_tasks() {
        let queue = TaskQueue::new(config(1, 0), succeed_after(Duration::from_millis(10))).unwrap();

        let done = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        wait_for(&queue, done, |t| t.status.is_terminal()).await;

        let blocker = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        let parked = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        let axed = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        assert!(queue.cancel(axed));

        queue.evict_completed();

        assert!(queue.get(done).is_none());
        assert!(queue.get(axed).is_none());
        assert_eq!(queue.get(blocker).unwrap().status, TaskStatus::InFlight);
        assert_eq!(queue.get(parked).unwrap().status, TaskStatus::Waiting);
        assert_eq!(queue.stats().total, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delays_follow_the_policy() {
        // One failure, then success: the retry must not be admitted before
        // the 1s base delay has elapsed, and must be admitted right after.
        let calls = Arc::new(AtomicU32::new(0));
        let exec = {
            let calls = Arc::clone(&calls);
            ExecFn::arc(move |task: Task, _ctx: CancellationToken| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ExecError::new("cold start"))
                    } else {
                        Ok(format!("0x{}", task.id))
                    }
                }
            })
        };
        let queue = TaskQueue::new(config(1, 3), exec).unwrap();

        let started = time::Instant::now();
        let id = queue.submit(TaskKind::Transfer, serde_json::Value::Null);
        let task = wait_for(&queue, id, |t| t.status.is_terminal()).await;

        assert_eq!(task.status, TaskStatus::Succeeded);
        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert!(started.elapsed() < Duration::from_millis(2000));
    }
}
