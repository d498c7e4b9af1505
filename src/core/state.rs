//! Transition states and phases.
//!
//! A transition machine is always in exactly one [`TransitionState`]. The
//! intermediate states (`Entering`, `Exiting`) only last for the asynchronous
//! gap between a phase start and its completion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a single transitioning element.
///
/// # Example
///
/// ```rust
/// use transition_group::core::TransitionState;
///
/// assert!(TransitionState::Entering.is_transitioning());
/// assert!(TransitionState::Exited.is_visible());
/// assert!(!TransitionState::Unmounted.is_visible());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TransitionState {
    /// Not mounted at all; the element is considered absent.
    Unmounted,
    /// Mounted in its hidden resting state.
    Exited,
    /// Enter phase started, waiting for completion.
    Entering,
    /// Shown, at rest.
    Entered,
    /// Exit phase started, waiting for completion.
    Exiting,
}

impl TransitionState {
    /// Get the state's name for display/logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unmounted => "unmounted",
            Self::Exited => "exited",
            Self::Entering => "entering",
            Self::Entered => "entered",
            Self::Exiting => "exiting",
        }
    }

    /// True while a phase is in flight.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Entering | Self::Exiting)
    }

    /// True once the element is shown or on its way in.
    pub fn is_entered_or_entering(&self) -> bool {
        matches!(self, Self::Entering | Self::Entered)
    }

    /// True for the resting states an exit sequence can end in.
    pub fn is_exit_terminal(&self) -> bool {
        matches!(self, Self::Exited | Self::Unmounted)
    }

    /// Everything except `Unmounted` is rendered by the host.
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Unmounted)
    }
}

impl fmt::Display for TransitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One animated leg of a transition.
///
/// `Appear` is the variant of `Enter` that runs on the element's initial
/// mount.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Phase {
    Appear,
    Enter,
    Exit,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Appear => "appear",
            Self::Enter => "enter",
            Self::Exit => "exit",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
