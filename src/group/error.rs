//! Group update errors.

use std::fmt::Debug;
use thiserror::Error;

/// The same key appeared twice in one child list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("duplicate child key {key} in one update; keys must be unique")]
pub struct DuplicateKeyError {
    /// Debug rendering of the offending key.
    pub key: String,
}

impl DuplicateKeyError {
    pub fn new<K: Debug>(key: &K) -> Self {
        Self {
            key: format!("{key:?}"),
        }
    }
}
