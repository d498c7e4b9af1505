//! Keyed collections of transitioning children.
//!
//! A [`TransitionGroup`] receives the current list of children on every
//! update and works out, per key, whether the child is appearing, entering,
//! staying, or exiting. Removed children stay in the emitted mapping until
//! the host reports that their exit finished, so they can animate out in
//! place.
//!
//! The group itself runs no animations. It hands each emitted mapping to a
//! [`Renderer`]; [`Stage`] is a renderer that mounts one
//! [`TransitionMachine`](crate::transition::TransitionMachine) per key.

mod error;
mod mapping;
mod orchestrator;
mod renderer;
mod stage;

pub use error::DuplicateKeyError;
pub use mapping::{
    classify, compute_enter_keys, merge_child_mappings, Child, ChildMapping, ChildOverrides,
    ChildRecord, Directive, Lifecycle,
};
pub use orchestrator::{ExitNotifier, GroupPolicy, TransitionGroup};
pub use renderer::{ChildProps, FirstChild, RenderedChild, Renderer};
pub use stage::{MountFactory, Stage};
