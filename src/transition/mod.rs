//! The single element transition state machine.
//!
//! # States
//!
//! ```text
//!             update_presence(true)                 timeout / done()
//!  Exited ───────────────────────────► Entering ─────────────────────► Entered
//!    ▲                                                                    │
//!    │ timeout / done()                                                   │
//!    └────────────────────────────── Exiting ◄────────────────────────────┘
//!                                                update_presence(false)
//! ```
//!
//! `Unmounted` replaces `Exited` as the resting state when the machine is
//! configured with `unmount_on_exit` (or starts lazily with
//! `mount_on_enter`). Reversals are allowed at any point: requesting the
//! opposite presence mid-phase abandons the phase and starts the other one.

mod callbacks;
mod config;
mod machine;

pub use callbacks::{Callback, Hook, TransitionCallbacks};
pub use config::{Timeout, TransitionConfig, DEFAULT_HISTORY_LIMIT};
pub use machine::{EndListener, PhaseCompletion, TransitionMachine};
