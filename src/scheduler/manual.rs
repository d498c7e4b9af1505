//! Deterministic scheduler driven by hand.

use super::{Scheduler, TimerCallback, TimerHandle};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

/// Upper bound on timers fired by a single `run_all_timers` call.
const MAX_TIMERS_PER_RUN: usize = 10_000;

#[derive(Default)]
struct Timers {
    now: Duration,
    next_id: u64,
    /// Ordered by due time, then by scheduling order.
    queue: BTreeMap<(Duration, u64), TimerCallback>,
    due: HashMap<u64, Duration>,
}

/// Fake clock for tests and deterministic hosts.
///
/// Time only moves when [`advance`](Self::advance) or
/// [`run_all_timers`](Self::run_all_timers) is called. Timers with the same
/// due time fire in the order they were scheduled. Clones share the same
/// clock.
///
/// # Example
///
/// ```rust
/// use transition_group::scheduler::{ManualScheduler, Scheduler};
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// let clock = ManualScheduler::new();
/// let fired = Rc::new(Cell::new(false));
/// let flag = fired.clone();
/// clock.after(Duration::from_millis(10), Box::new(move || flag.set(true)));
///
/// clock.advance(Duration::from_millis(5));
/// assert!(!fired.get());
/// clock.advance(Duration::from_millis(5));
/// assert!(fired.get());
/// ```
#[derive(Clone, Default)]
pub struct ManualScheduler {
    timers: Rc<RefCell<Timers>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current fake time.
    pub fn now(&self) -> Duration {
        self.timers.borrow().now
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.timers.borrow().queue.len()
    }

    /// Move the clock forward, firing every timer that becomes due, including
    /// timers scheduled by callbacks during the advance.
    ///
    /// Returns the number of timers fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut fired = 0;
        while let Some(callback) = self.pop_due(Some(target)) {
            callback();
            fired += 1;
        }
        self.timers.borrow_mut().now = target;
        fired
    }

    /// Fire timers in due order until none remain, moving the clock to each
    /// timer's due time.
    ///
    /// Returns the number of timers fired. Stops early if callbacks keep
    /// rescheduling forever.
    pub fn run_all_timers(&self) -> usize {
        let mut fired = 0;
        while let Some(callback) = self.pop_due(None) {
            callback();
            fired += 1;
            if fired >= MAX_TIMERS_PER_RUN {
                warn!(fired, "run_all_timers aborted: timers keep rescheduling");
                break;
            }
        }
        fired
    }

    /// Fire only the timers that are due right now (zero-delay timers).
    pub fn run_pending(&self) -> usize {
        self.advance(Duration::ZERO)
    }

    fn pop_due(&self, limit: Option<Duration>) -> Option<TimerCallback> {
        let mut timers = self.timers.borrow_mut();
        let (&(due, id), _) = timers.queue.iter().next()?;
        if limit.is_some_and(|limit| due > limit) {
            return None;
        }
        let callback = timers.queue.remove(&(due, id))?;
        timers.due.remove(&id);
        if due > timers.now {
            timers.now = due;
        }
        Some(callback)
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let mut timers = self.timers.borrow_mut();
        let id = timers.next_id;
        timers.next_id += 1;
        let due = timers.now + delay;
        timers.queue.insert((due, id), callback);
        timers.due.insert(id, due);
        TimerHandle::new(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut timers = self.timers.borrow_mut();
        if let Some(due) = timers.due.remove(&handle.id()) {
            timers.queue.remove(&(due, handle.id()));
        }
    }
}
