//! Predicted outcomes and failure aggregation.
//!
//! Every oracle call is threaded with an [`ExpectedOutcome`]. An expected
//! provider error is a variant of that union, not a caught exception compared
//! by runtime type. [`classify`] turns an observed provider result into one of
//! three things:
//!
//! | Expected | Observed | Result |
//! |----------|----------|--------|
//! | `Exception(k)` | error of kind `k` | `Ok(None)`: success, dependent checks stop |
//! | `Exception(k)` | error of another kind | `Verification` |
//! | `Exception(k)` | success | `Verification` |
//! | anything else | error | `ProviderFault` |
//! | anything else | success | `Ok(Some(value))`: continue checking |

use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::error::Failure;
use crate::error::Result;
use crate::provider::ProviderErrorKind;
use crate::provider::ProviderResult;
use crate::range::Range;

/// How a found range relates to the document it was searched in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
pub struct MatchFlags {
    /// The found range starts at the document start.
    pub matches_first: bool,
    /// The found range ends at the document end.
    pub matches_last: bool,
    /// Nothing was found, or the found range is empty.
    pub empty: bool,
    /// At least one occurrence was skipped because it lies in hidden text.
    pub hidden_excluded: bool,
}

impl fmt::Display for MatchFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.matches_first {
            names.push("MatchesFirst");
        }
        if self.matches_last {
            names.push("MatchesLast");
        }
        if self.empty {
            names.push("Empty");
        }
        if self.hidden_excluded {
            names.push("HiddenExcluded");
        }
        if names.is_empty() {
            return f.write_str("None");
        }
        return f.write_str(&names.join("|"));
    }
}

/// What the reference model predicts an operation will do.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ExpectedOutcome {
    /// The provider must raise an error of this kind.
    Exception(ProviderErrorKind),
    /// The provider must return no range.
    Null,
    /// The provider must return a degenerate range.
    EmptyRange,
    /// The provider must return exactly this range.
    MatchingRange(Range),
    /// The provider must return a range starting at this character offset.
    RangeWithOffset(usize),
    /// The provider must return a range classified with these flags.
    MatchResult(MatchFlags),
}

impl ExpectedOutcome {
    /// The error kind this outcome expects, if any.
    pub fn expected_error(&self) -> Option<ProviderErrorKind> {
        return match self {
            ExpectedOutcome::Exception(kind) => Some(*kind),
            _ => None,
        };
    }
}

impl fmt::Display for ExpectedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            ExpectedOutcome::Exception(kind) => write!(f, "{kind:?} error"),
            ExpectedOutcome::Null => f.write_str("null"),
            ExpectedOutcome::EmptyRange => f.write_str("an empty range"),
            ExpectedOutcome::MatchingRange(range) => write!(f, "range {range}"),
            ExpectedOutcome::RangeWithOffset(offset) => write!(f, "a range starting at {offset}"),
            ExpectedOutcome::MatchResult(flags) => write!(f, "a match classified {flags}"),
        };
    }
}

/// Classify an observed provider result against an expected error kind.
///
/// Returns `Ok(None)` when the expected error was raised, which ends the
/// check successfully: callers must not run dependent checks on the
/// undefined state that follows.
pub fn classify<T: fmt::Debug>(
    operation: &str,
    requested: &str,
    expected: Option<ProviderErrorKind>,
    observed: ProviderResult<T>,
) -> Result<Option<T>> {
    return match (expected, observed) {
        (Some(kind), Err(err)) if err.kind == kind => {
            tracing::debug!(operation, ?kind, "expected provider error observed");
            Ok(None)
        }
        (Some(kind), Err(err)) => Err(Error::verification(Failure::new(
            operation,
            requested,
            format!("{kind:?} error"),
            format!("{:?} error: {}", err.kind, err.message),
        ))),
        (Some(kind), Ok(value)) => Err(Error::verification(Failure::new(
            operation,
            requested,
            format!("{kind:?} error"),
            format!("success: {value:?}"),
        ))),
        (None, Err(err)) => Err(Error::provider_fault(Failure::new(
            operation,
            requested,
            "success",
            format!("{:?} error: {}", err.kind, err.message),
        ))),
        (None, Ok(value)) => Ok(Some(value)),
    };
}

/// Unwrap a provider call that the model predicts will succeed.
pub fn expect_success<T: fmt::Debug>(operation: &str, requested: &str, observed: ProviderResult<T>) -> Result<T> {
    return match observed {
        Ok(value) => Ok(value),
        Err(err) => Err(Error::provider_fault(Failure::new(
            operation,
            requested,
            "success",
            format!("{:?} error: {}", err.kind, err.message),
        ))),
    };
}

/// Check an optional range returned by the provider against a prediction.
///
/// Returns the observed range (if any) so callers can run further checks.
pub fn verify_range_outcome(
    operation: &str,
    requested: &str,
    expected: &ExpectedOutcome,
    observed: ProviderResult<Option<Range>>,
) -> Result<Option<Range>> {
    let Some(found) = classify(operation, requested, expected.expected_error(), observed)? else {
        return Ok(None);
    };

    let ok = match (expected, &found) {
        (ExpectedOutcome::Null, None) => true,
        (ExpectedOutcome::EmptyRange, Some(range)) => range.is_degenerate(),
        (ExpectedOutcome::MatchingRange(want), Some(range)) => want == range,
        (ExpectedOutcome::RangeWithOffset(offset), Some(range)) => range.start() == *offset,
        // Match flags are judged by the search oracle, which knows the document.
        (ExpectedOutcome::MatchResult(flags), Some(_)) => !flags.empty,
        (ExpectedOutcome::MatchResult(flags), None) => flags.empty,
        _ => false,
    };

    if !ok {
        let observed = match found {
            Some(range) => format!("range {range}"),
            None => "null".to_string(),
        };
        return Err(Error::verification(Failure::new(operation, requested, expected.to_string(), observed)));
    }
    return Ok(found);
}

/// Aggregated results of many checks.
///
/// Configuration errors skip a scenario; verification failures and provider
/// faults are accumulated for the reporting layer with their full context.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Report {
    pub passed: usize,
    pub skipped: Vec<String>,
    pub failures: Vec<Failure>,
    pub faults: Vec<Failure>,
}

impl Report {
    pub fn new() -> Report {
        return Report::default();
    }

    /// Record the result of one check.
    ///
    /// Returns true when the check passed.
    pub fn record<T>(&mut self, result: Result<T>) -> bool {
        match result {
            Ok(_) => {
                self.passed += 1;
                return true;
            }
            Err(Error::Configuration(reason)) => {
                tracing::info!(%reason, "scenario skipped");
                self.skipped.push(reason);
            }
            Err(Error::Verification(failure)) => self.failures.push(*failure),
            Err(Error::ProviderFault(failure)) => self.faults.push(*failure),
            Err(other) => self.failures.push(Failure::new("internal", "", "no error", other.to_string())),
        }
        return false;
    }

    /// Merge another report into this one.
    pub fn absorb(&mut self, other: Report) {
        self.passed += other.passed;
        self.skipped.extend(other.skipped);
        self.failures.extend(other.failures);
        self.faults.extend(other.faults);
    }

    /// True when nothing failed. Skipped scenarios do not count as failures.
    pub fn is_clean(&self) -> bool {
        return self.failures.is_empty() && self.faults.is_empty();
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} passed, {} skipped, {} failed, {} provider faults",
            self.passed,
            self.skipped.len(),
            self.failures.len(),
            self.faults.len()
        )?;
        for failure in &self.failures {
            writeln!(f, "  FAIL  {failure}")?;
        }
        for fault in &self.faults {
            writeln!(f, "  FAULT {fault}")?;
        }
        for reason in &self.skipped {
            writeln!(f, "  SKIP  {reason}")?;
        }
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;

    fn err(kind: ProviderErrorKind) -> ProviderResult<i32> {
        return Err(ProviderError::new(kind, "boom"));
    }

    #[test]
    fn expected_error_stops_the_check() {
        let kind = ProviderErrorKind::InvalidArgument;
        let result = classify("FindText", "\"\"", Some(kind), err(kind)).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn wrong_error_kind_is_a_verification_failure() {
        let result = classify(
            "FindText",
            "",
            Some(ProviderErrorKind::InvalidArgument),
            err(ProviderErrorKind::ArgumentNull),
        );
        assert!(matches!(result, Err(Error::Verification(_))));
    }

    #[test]
    fn missing_error_is_a_verification_failure() {
        let result = classify("FindText", "", Some(ProviderErrorKind::InvalidArgument), Ok(3));
        assert!(matches!(result, Err(Error::Verification(_))));
    }

    #[test]
    fn unexpected_error_is_a_provider_fault() {
        let result = classify("Move", "", None, err(ProviderErrorKind::Other));
        assert!(matches!(result, Err(Error::ProviderFault(_))));
        assert_eq!(classify("Move", "", None, Ok(3)).unwrap(), Some(3));
    }

    #[test]
    fn range_outcomes() {
        let r = Range::new(2, 5).unwrap();
        assert!(verify_range_outcome("op", "", &ExpectedOutcome::Null, Ok(None)).is_ok());
        assert!(verify_range_outcome("op", "", &ExpectedOutcome::Null, Ok(Some(r))).is_err());
        assert!(verify_range_outcome("op", "", &ExpectedOutcome::MatchingRange(r), Ok(Some(r))).is_ok());
        assert!(verify_range_outcome("op", "", &ExpectedOutcome::EmptyRange, Ok(Some(r))).is_err());
        assert!(verify_range_outcome("op", "", &ExpectedOutcome::EmptyRange, Ok(Some(Range::degenerate(3)))).is_ok());
        assert!(verify_range_outcome("op", "", &ExpectedOutcome::RangeWithOffset(2), Ok(Some(r))).is_ok());
    }

    #[test]
    fn report_buckets_errors() {
        let mut report = Report::new();
        assert!(report.record(Ok(())));
        assert!(!report.record::<()>(Err(Error::configuration("too short"))));
        assert!(!report.record::<()>(Err(Error::verification(Failure::new("a", "", "1", "2")))));
        assert!(!report.record::<()>(Err(Error::provider_fault(Failure::new("b", "", "ok", "err")))));

        assert_eq!(report.passed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.faults.len(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn match_flags_display() {
        let flags = MatchFlags {
            matches_last: true,
            ..MatchFlags::default()
        };
        assert_eq!(flags.to_string(), "MatchesLast");
        assert_eq!(MatchFlags::default().to_string(), "None");
    }
}
