//! # Synchronous fan-out to registered observers.
//!
//! [`SubscriberSet`] delivers every task transition to all registered
//! observers, in registration order, on the thread that applied the
//! transition.
//!
//! ```text
//! emit(task)
//!     ├──► observer 1 .on_task()   (registration order)
//!     ├──► observer 2 .on_task()
//!     └──► observer N .on_task()
//!            └─► panic → caught, logged, remaining observers still run
//! ```
//!
//! [`Subscription`] is the unsubscribe handle: calling
//! [`Subscription::unsubscribe`] removes the observer and is idempotent.
//! Dropping the handle without calling it leaves the observer registered.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::subscribers::Subscribe;
use crate::tasks::Task;

struct Entry {
    id: u64,
    sub: Arc<dyn Subscribe>,
}

/// Registry of task observers with ordered, synchronous delivery.
#[derive(Default)]
pub struct SubscriberSet {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer; returns the handle that removes it again.
    pub fn subscribe(self: &Arc<Self>, sub: Arc<dyn Subscribe>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push(Entry { id, sub });
        Subscription {
            id,
            set: Arc::downgrade(self),
        }
    }

    /// Delivers a task snapshot to every registered observer.
    ///
    /// The registration list is snapshotted first, so observers may
    /// subscribe or unsubscribe from inside `on_task` without deadlocking;
    /// such changes take effect from the next emission.
    pub fn emit(&self, task: &Task) {
        let subs: Vec<Arc<dyn Subscribe>> = {
            let entries = self.entries.lock();
            entries.iter().map(|e| Arc::clone(&e.sub)).collect()
        };

        for sub in subs {
            if let Err(panic_err) = panic::catch_unwind(AssertUnwindSafe(|| sub.on_task(task))) {
                let info = panic_message(&*panic_err);
                tracing::warn!(subscriber = sub.name(), panic = %info, "observer panicked");
            }
        }
    }

    fn remove(&self, id: u64) {
        self.entries.lock().retain(|e| e.id != id);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Handle returned by `subscribe`; removes the observer when asked to.
///
/// Holds only a weak reference to the set, so an outstanding handle does
/// not keep a dropped queue alive.
pub struct Subscription {
    id: u64,
    set: Weak<SubscriberSet>,
}

impl Subscription {
    /// Removes the observer from the set.
    ///
    /// Idempotent: calling it again (or after the queue is gone) is a
    /// no-op. Subsequent transitions are not delivered to the observer.
    pub fn unsubscribe(&self) {
        if let Some(set) = self.set.upgrade() {
            set.remove(self.id);
        }
    }
}
