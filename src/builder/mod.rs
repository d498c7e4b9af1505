//! Builder API for transition machine construction.
//!
//! Configuration is validated up front: a machine whose animated phases
//! could never complete is rejected with a [`ConfigurationError`] listing
//! every problem at once.

pub mod error;
pub mod transition;

pub use error::{ConfigIssue, ConfigurationError};
pub use transition::TransitionBuilder;
