//! State change history tracking.
//!
//! Every transition machine keeps an immutable log of the state changes it
//! went through, which makes ordering bugs visible in tests and diagnostics.

use super::state::TransitionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single state change.
///
/// # Example
///
/// ```rust
/// use transition_group::core::{StateChange, TransitionState};
/// use chrono::Utc;
///
/// let change = StateChange {
///     from: TransitionState::Exited,
///     to: TransitionState::Entering,
///     timestamp: Utc::now(),
///     generation: 1,
/// };
/// assert!(change.to.is_transitioning());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    /// The state being left
    pub from: TransitionState,
    /// The state being entered
    pub to: TransitionState,
    /// When the change happened
    pub timestamp: DateTime<Utc>,
    /// Machine generation at the time of the change
    pub generation: u64,
}

/// Ordered history of state changes.
///
/// `record` is immutable and returns a new history with the change
/// appended. Owners that keep a history over a long lifetime append in
/// place with [`push_bounded`](Self::push_bounded), which keeps only the
/// most recent changes.
///
/// # Example
///
/// ```rust
/// use transition_group::core::{StateChange, TransitionHistory, TransitionState};
/// use chrono::Utc;
///
/// let history = TransitionHistory::new();
/// let history = history.record(StateChange {
///     from: TransitionState::Exited,
///     to: TransitionState::Entering,
///     timestamp: Utc::now(),
///     generation: 1,
/// });
/// let history = history.record(StateChange {
///     from: TransitionState::Entering,
///     to: TransitionState::Entered,
///     timestamp: Utc::now(),
///     generation: 2,
/// });
///
/// assert_eq!(
///     history.get_path(),
///     vec![
///         TransitionState::Exited,
///         TransitionState::Entering,
///         TransitionState::Entered,
///     ]
/// );
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionHistory {
    changes: VecDeque<StateChange>,
}

impl TransitionHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            changes: VecDeque::new(),
        }
    }

    /// Record a change, returning a new history.
    ///
    /// The existing history is left untouched.
    pub fn record(&self, change: StateChange) -> Self {
        let mut changes = self.changes.clone();
        changes.push_back(change);
        Self { changes }
    }

    /// Append a change in place, dropping the oldest ones so at most
    /// `limit` remain. A `limit` of zero records nothing.
    pub fn push_bounded(&mut self, change: StateChange, limit: usize) {
        if limit == 0 {
            self.changes.clear();
            return;
        }
        while self.changes.len() >= limit {
            self.changes.pop_front();
        }
        self.changes.push_back(change);
    }

    /// Get the path of states traversed.
    ///
    /// The first entry is the `from` state of the first change, followed by
    /// the `to` state of every change.
    pub fn get_path(&self) -> Vec<TransitionState> {
        let mut path = Vec::with_capacity(self.changes.len() + 1);
        if let Some(first) = self.changes.front() {
            path.push(first.from);
        }
        path.extend(self.changes.iter().map(|change| change.to));
        path
    }

    /// Wall-clock time between the first and last recorded change.
    ///
    /// Returns `None` if nothing has been recorded.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.changes.front()?, self.changes.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// Get all recorded changes in order.
    pub fn changes(&self) -> impl Iterator<Item = &StateChange> + '_ {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
