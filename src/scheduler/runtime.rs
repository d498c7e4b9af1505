//! Scheduler backed by the tokio timer wheel.

use super::{Scheduler, TimerCallback, TimerHandle};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

#[derive(Default)]
struct Tasks {
    next_id: Cell<u64>,
    running: RefCell<HashMap<u64, JoinHandle<()>>>,
}

impl Drop for Tasks {
    fn drop(&mut self) {
        for (_, task) in self.running.get_mut().drain() {
            task.abort();
        }
    }
}

/// Runs timer callbacks as local tokio tasks.
///
/// Callbacks are not `Send`, so timers are spawned with
/// [`tokio::task::spawn_local`].
///
/// # Panics
///
/// `after` panics when called outside of a [`tokio::task::LocalSet`].
#[derive(Clone, Default)]
pub struct TokioScheduler {
    tasks: Rc<Tasks>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.tasks.running.borrow().len()
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let id = self.tasks.next_id.get();
        self.tasks.next_id.set(id + 1);

        let tasks = Rc::downgrade(&self.tasks);
        let task = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            if let Some(tasks) = tasks.upgrade() {
                tasks.running.borrow_mut().remove(&id);
            }
            trace!(timer = id, "timer fired");
            callback();
        });
        self.tasks.running.borrow_mut().insert(id, task);
        TimerHandle::new(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let task = self.tasks.running.borrow_mut().remove(&handle.id());
        if let Some(task) = task {
            task.abort();
        }
    }
}
