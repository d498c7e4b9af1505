//! Core transition types.
//!
//! This module contains the plain value types shared by the transition
//! machine and the group orchestrator:
//! - `TransitionState` and `Phase`
//! - Immutable state change history
//!
//! Nothing in this module schedules timers or calls back into user code.

mod history;
mod state;

pub use history::{StateChange, TransitionHistory};
pub use state::{Phase, TransitionState};
