//! Crate-wide error type.

use crate::builder::ConfigurationError;
use crate::group::DuplicateKeyError;
use thiserror::Error;

/// Anything that can go wrong while configuring a machine or updating a
/// group.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransitionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),
}
