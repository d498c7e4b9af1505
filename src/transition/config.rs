//! Transition timing and behaviour configuration.

use crate::builder::{ConfigIssue, ConfigurationError};
use crate::core::Phase;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Phase durations.
///
/// `appear` falls back to `enter` when unset.
///
/// # Example
///
/// ```rust
/// use transition_group::core::Phase;
/// use transition_group::transition::Timeout;
/// use std::time::Duration;
///
/// let timeout = Timeout::phased(Duration::from_millis(300), Duration::from_millis(150));
/// assert_eq!(timeout.for_phase(Phase::Appear), Some(Duration::from_millis(300)));
/// assert_eq!(timeout.for_phase(Phase::Exit), Some(Duration::from_millis(150)));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeout {
    pub appear: Option<Duration>,
    pub enter: Option<Duration>,
    pub exit: Option<Duration>,
}

impl Timeout {
    /// Same duration for every phase.
    pub fn uniform(duration: Duration) -> Self {
        Self {
            appear: Some(duration),
            enter: Some(duration),
            exit: Some(duration),
        }
    }

    /// Separate enter and exit durations; appear uses the enter duration.
    pub fn phased(enter: Duration, exit: Duration) -> Self {
        Self {
            appear: None,
            enter: Some(enter),
            exit: Some(exit),
        }
    }

    pub fn with_appear(mut self, appear: Duration) -> Self {
        self.appear = Some(appear);
        self
    }

    /// Duration of `phase`, if one was configured.
    pub fn for_phase(&self, phase: Phase) -> Option<Duration> {
        match phase {
            Phase::Appear => self.appear.or(self.enter),
            Phase::Enter => self.enter,
            Phase::Exit => self.exit,
        }
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Self::uniform(duration)
    }
}

/// State changes a machine keeps in its history unless configured
/// otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

/// Behaviour of a single transition machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Requested presence at construction (`in`).
    pub present: bool,
    /// Animate the initial enter when constructed present.
    pub appear: bool,
    /// Animate later enters. `false` jumps straight to `Entered`.
    pub enter: bool,
    /// Animate exits. `false` jumps straight to the exit terminal state.
    pub exit: bool,
    pub timeout: Timeout,
    /// Start `Unmounted` instead of `Exited` when constructed absent.
    pub mount_on_enter: bool,
    /// End exits in `Unmounted` instead of `Exited`.
    pub unmount_on_exit: bool,
    /// Whether the initial enter counts as an appearance. Children added to
    /// an already rendered group enter instead.
    pub mounting: bool,
    /// Most recent state changes kept in the machine's history. `0` turns
    /// recording off.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            present: false,
            appear: false,
            enter: true,
            exit: true,
            timeout: Timeout::default(),
            mount_on_enter: false,
            unmount_on_exit: false,
            mounting: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl TransitionConfig {
    /// Phase the initial enter runs as, if the machine animates on mount.
    pub fn mount_phase(&self) -> Option<Phase> {
        if !(self.present && self.appear) {
            None
        } else if self.mounting {
            Some(Phase::Appear)
        } else {
            Some(Phase::Enter)
        }
    }

    /// Check every animated phase has a way to complete, accumulating ALL
    /// issues.
    ///
    /// A phase completes on its timeout or through an end listener; with
    /// neither it would stay in flight forever.
    pub fn validate(&self, has_end_listener: bool) -> Validation<(), NonEmptyVec<ConfigIssue>> {
        let mut animated = Vec::new();
        if self.mount_phase() == Some(Phase::Appear) {
            animated.push(Phase::Appear);
        }
        if self.enter || self.mount_phase() == Some(Phase::Enter) {
            animated.push(Phase::Enter);
        }
        if self.exit {
            animated.push(Phase::Exit);
        }

        let checks: Vec<Validation<(), NonEmptyVec<ConfigIssue>>> = animated
            .into_iter()
            .map(|phase| {
                if has_end_listener || self.timeout.for_phase(phase).is_some() {
                    Validation::success(())
                } else {
                    Validation::fail(ConfigIssue::MissingTimeout { phase })
                }
            })
            .collect();

        Validation::all_vec(checks).map(|_| ())
    }

    /// Fail-fast form of [`validate`](Self::validate).
    pub fn check(&self, has_end_listener: bool) -> Result<(), ConfigurationError> {
        match self.validate(has_end_listener) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(issues) => Err(ConfigurationError {
                issues: issues.iter().cloned().collect(),
            }),
        }
    }
}
