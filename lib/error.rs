//! Error types and the precondition assertion used throughout the crate.
//!
//! Input errors that a caller can reasonably recover from are returned as one
//! of the enums below. Broken preconditions on the storage lifecycle (e.g.
//! asking for a COO snapshot before the basis is fixed) are programming errors
//! and abort through [`tb_assert!`][crate::tb_assert].

use thiserror::Error;

/// Assert a precondition, panicking with a message naming the failing
/// operation, the violated condition, and a remedy.
///
/// ```should_panic
/// tightbind::tb_assert!(
///     1 + 1 == 3,
///     "arithmetic()",
///     "one plus one is not three.",
///     "Check your arithmetic."
/// );
/// ```
#[macro_export]
macro_rules! tb_assert {
    ( $cond:expr, $operation:expr, $condition:expr, $remedy:expr $(,)? ) => {
        if !$cond {
            let remedy: &str = $remedy;
            if remedy.is_empty() {
                panic!("{}: {}", $operation, $condition);
            } else {
                panic!("{}: {} {}", $operation, $condition, remedy);
            }
        }
    }
}

/// Returned by the [`PropertyExtractor`][crate::PropertyExtractor] when a
/// pattern or energy window is unusable.
///
/// These are always detected before any accumulation begins, so no partially
/// filled output is ever produced.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ExtractError {
    /// A spin-resolved quantity was requested on a pattern without a
    /// [`SPIN`][crate::SPIN] marker.
    #[error("{operation}: no spin index indicated in pattern {pattern}")]
    MissingSpinIndex { operation: &'static str, pattern: String },

    /// A [`SPIN`][crate::SPIN] marker was given for a quantity that does not
    /// resolve spin, or more than once for one that does.
    ///
    /// Such a marker is rejected rather than treated as one more free
    /// wildcard contributing an output axis.
    #[error("{operation}: unexpected spin index at position {position} of pattern {pattern}")]
    UnexpectedSpinIndex {
        operation: &'static str,
        position: usize,
        pattern: String,
    },

    /// `pattern` and `ranges` have different lengths.
    #[error("{operation}: pattern has {pattern} entries but ranges has {ranges}")]
    RangeMismatch { operation: &'static str, pattern: usize, ranges: usize },

    /// The energy window is empty or has zero resolution.
    #[error("{operation}: invalid energy window [{lower}, {upper}) with resolution {resolution}")]
    InvalidWindow {
        operation: &'static str,
        lower: f64,
        upper: f64,
        resolution: usize,
    },
}

/// Returned when wrapping solver output in an
/// [`EigenSystem`][crate::EigenSystem].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The amplitude set has no basis yet.
    #[error("amplitude set has not been constructed")]
    NotConstructed,

    /// The number of eigenvalues does not match the basis size.
    #[error("expected {expected} eigenvalues but got {got}")]
    EigenvalueCount { expected: usize, got: usize },

    /// The eigenvector matrix is not `basis_size × basis_size`.
    #[error("expected a {expected} x {expected} eigenvector matrix but got {rows} x {cols}")]
    EigenvectorShape { expected: usize, rows: usize, cols: usize },
}

/// Returned when loading [`ModelParams`][crate::ModelParams].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("temperature must be non-negative, got {0}")]
    NegativeTemperature(f64),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tb_assert_passes_when_true() {
        crate::tb_assert!(true, "op()", "never shown.", "");
    }

    #[test]
    #[should_panic(expected = "op(): condition failed. Do something else.")]
    fn tb_assert_message_has_all_parts() {
        crate::tb_assert!(
            false,
            "op()",
            "condition failed.",
            "Do something else.",
        );
    }

    #[test]
    fn extract_error_display() {
        let err = ExtractError::RangeMismatch {
            operation: "calculate_density()",
            pattern: 3,
            ranges: 2,
        };
        assert_eq!(
            err.to_string(),
            "calculate_density(): pattern has 3 entries but ranges has 2",
        );
    }
}
