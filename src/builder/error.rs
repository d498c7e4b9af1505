//! Configuration errors for transition builders.

use crate::core::Phase;
use thiserror::Error;

/// A single problem found while validating a transition configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigIssue {
    #[error("{phase} is animated but has no timeout. Call .timeout(..) or .add_end_listener(..)")]
    MissingTimeout { phase: Phase },
}

/// Every problem found in a transition configuration.
///
/// Validation does not stop at the first issue; all of them are reported.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid transition configuration: {}", summarize(.issues))]
pub struct ConfigurationError {
    pub issues: Vec<ConfigIssue>,
}

fn summarize(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
