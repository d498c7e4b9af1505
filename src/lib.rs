//! Transition Group: enter/exit transition state for UI elements
//!
//! A [`TransitionMachine`] tracks one element through
//! `Unmounted`/`Exited` → `Entering` → `Entered` → `Exiting` and back,
//! firing lifecycle callbacks at each step. Phase completion comes from a
//! timer on an injected [`Scheduler`], or from an end listener the host
//! signals when its own animation finishes.
//!
//! A [`TransitionGroup`] sits on top: it diffs keyed child lists, keeps
//! removed children around while they animate out, and prunes them once
//! their exit completes.
//!
//! # Core Concepts
//!
//! - **Machine**: one element's transition state, driven by `update_presence`
//! - **Scheduler**: timers are injected, so tests run on a fake clock
//! - **Group**: keyed diffing of children with deferred removal
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use std::time::Duration;
//! use transition_group::builder::TransitionBuilder;
//! use transition_group::core::TransitionState;
//! use transition_group::scheduler::ManualScheduler;
//!
//! let clock = ManualScheduler::new();
//! let machine = TransitionBuilder::new()
//!     .timeout(Duration::from_millis(300))
//!     .build(Rc::new(clock.clone()))
//!     .unwrap();
//! assert_eq!(machine.state(), TransitionState::Exited);
//!
//! machine.update_presence(true);
//! assert_eq!(machine.state(), TransitionState::Entering);
//!
//! clock.advance(Duration::from_millis(300));
//! assert_eq!(machine.state(), TransitionState::Entered);
//! ```

pub mod builder;
pub mod core;
pub mod error;
pub mod group;
pub mod scheduler;
pub mod transition;

// Re-export commonly used types
pub use builder::{ConfigurationError, TransitionBuilder};
pub use core::{Phase, TransitionState};
pub use error::TransitionError;
pub use group::{Child, GroupPolicy, Stage, TransitionGroup};
pub use scheduler::{ManualScheduler, Scheduler};
pub use transition::{Timeout, TransitionConfig, TransitionMachine};
