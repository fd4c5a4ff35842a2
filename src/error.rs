//! Error types for rangecheck.
//!
//! Three outcomes matter to a scenario driver:
//!
//! - [`Error::Configuration`]: the document or provider does not meet a
//!   precondition. The scenario is skipped, not failed.
//! - [`Error::Verification`]: the reference model disagrees with what the
//!   provider did.
//! - [`Error::ProviderFault`]: the provider raised an error where the model
//!   predicted success.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type for rangecheck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Diagnostic context for a failed check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// The provider operation that was checked, e.g. `MoveEndpointByUnit`.
    pub operation: String,
    /// The parameters the operation was called with.
    pub requested: String,
    /// What the reference model predicted.
    pub expected: String,
    /// What the provider actually did.
    pub observed: String,
}

impl Failure {
    pub fn new(
        operation: impl Into<String>,
        requested: impl Into<String>,
        expected: impl Into<String>,
        observed: impl Into<String>,
    ) -> Failure {
        return Failure {
            operation: operation.into(),
            requested: requested.into(),
            expected: expected.into(),
            observed: observed.into(),
        };
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(
            f,
            "{}({}): expected {}, observed {}",
            self.operation, self.requested, self.expected, self.observed
        );
    }
}

/// Error type for rangecheck operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A scenario precondition does not hold.
    #[error("Incorrect element configuration: {0}")]
    Configuration(String),

    /// The provider's behavior disagrees with the reference model.
    #[error("Verification failed: {0}")]
    Verification(Box<Failure>),

    /// The provider raised an error where success was predicted.
    #[error("Provider fault: {0}")]
    ProviderFault(Box<Failure>),

    /// A range with start after end, or past the end of the document.
    #[error("Invalid range [{start}, {end}) for document length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        return Error::Configuration(msg.into());
    }

    /// Create a verification failure.
    pub fn verification(failure: Failure) -> Self {
        tracing::warn!(%failure, "verification failure");
        return Error::Verification(Box::new(failure));
    }

    /// Create a provider fault.
    pub fn provider_fault(failure: Failure) -> Self {
        tracing::warn!(%failure, "provider fault");
        return Error::ProviderFault(Box::new(failure));
    }

    /// True for errors that skip a scenario rather than fail it.
    pub fn is_configuration(&self) -> bool {
        return matches!(self, Error::Configuration(_));
    }

    /// The diagnostic record, for verification failures and provider faults.
    pub fn failure(&self) -> Option<&Failure> {
        return match self {
            Error::Verification(failure) | Error::ProviderFault(failure) => Some(failure),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_display_carries_context() {
        let failure = Failure::new("Move", "Word, 3", "3", "2");
        assert_eq!(failure.to_string(), "Move(Word, 3): expected 3, observed 2");
    }

    #[test]
    fn only_configuration_skips() {
        assert!(Error::configuration("too short").is_configuration());
        let err = Error::verification(Failure::new("Move", "", "1", "0"));
        assert!(!err.is_configuration());
        assert_eq!(err.failure().map(|f| f.observed.as_str()), Some("0"));
    }
}
