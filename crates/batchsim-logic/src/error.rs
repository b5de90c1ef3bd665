//! Runtime errors shared by every batch.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::config::ConfigError;

/// Anything that can stop a batch before it produces a report.
#[derive(Debug, Error)]
pub enum SimError {
    /// Up-front allocation of a bulk record collection failed.
    #[error("failed to allocate {count} {what}")]
    Allocation {
        what: &'static str,
        count: usize,
        #[source]
        source: TryReserveError,
    },
    /// The configuration was rejected before any work started.
    #[error("invalid configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ConfigError>),
    /// Reading the access trace failed.
    #[error("failed to read trace")]
    Trace(#[from] std::io::Error),
}

impl SimError {
    /// Fail with [`SimError::InvalidConfig`] when `errors` is non-empty.
    pub fn check(errors: Vec<ConfigError>) -> Result<(), SimError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SimError::InvalidConfig(errors))
        }
    }
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
