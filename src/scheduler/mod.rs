//! Timer scheduling.
//!
//! Transition machines never read a clock themselves. Every delay goes
//! through an injected [`Scheduler`], so hosts can plug in their own event
//! loop and tests can drive time by hand with [`ManualScheduler`].
//!
//! A scheduler must run callbacks asynchronously, even for a zero delay:
//! `after` never invokes the callback before returning.

mod manual;
#[cfg(feature = "tokio")]
mod runtime;

pub use manual::ManualScheduler;
#[cfg(feature = "tokio")]
pub use runtime::TokioScheduler;

use std::time::Duration;

/// Callback run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce()>;

/// Opaque handle identifying a scheduled timer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Single-threaded timer source.
pub trait Scheduler {
    /// Run `callback` once `delay` has elapsed.
    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    /// Cancel a pending timer. Cancelling a timer that already fired is a
    /// no-op.
    fn cancel(&self, handle: TimerHandle);
}
