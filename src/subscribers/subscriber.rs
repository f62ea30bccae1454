//! # Task observer trait.
//!
//! Provides [`Subscribe`], the extension point for watching task lifecycle
//! transitions (UI refresh, toasts, metrics, audit trails).
//!
//! Observers are called **synchronously with the transition**, in
//! registration order, with a snapshot of the affected task — including the
//! initial `Waiting` snapshot at submission. There is no batching and no
//! delivery queue.
//!
//! ## Rules
//! - Keep observers fast: they run on whichever thread applied the
//!   transition, before control returns to the caller.
//! - Observers may call back into the queue (`stats`, `get`, even `submit`);
//!   delivery happens outside the store lock.
//! - A panicking observer is isolated: the panic is caught and logged, and
//!   remaining observers still receive the event.
//!
//! Closures get a blanket implementation, so
//! `queue.subscribe(|task: &Task| { ... })` works without a named type.

use crate::tasks::Task;

/// Observer of task status transitions.
pub trait Subscribe: Send + Sync + 'static {
    /// Called with a snapshot of the task after every status transition.
    fn on_task(&self, task: &Task);

    /// Returns the observer name used in panic reports.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose —
    /// override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> Subscribe for F
where
    F: Fn(&Task) + Send + Sync + 'static,
{
    fn on_task(&self, task: &Task) {
        self(task)
    }
}
