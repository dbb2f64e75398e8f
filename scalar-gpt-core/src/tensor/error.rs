//! Shape errors raised at module call boundaries.

use std::fmt;

/// A shape, length or index did not match what a call site requires.
///
/// # Variants
///
/// - **Mismatch**: A length differs from the one the call site was built for (e.g. a
///   `Linear` with 16 inputs given a row of 8).
/// - **OutOfRange**: An index (token id, position) is outside its table.
/// - **Empty**: An input that must have at least one element has none.
///
/// Every variant names its call site in `context` so the failing layer is obvious in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionError {
    /// Expected one length, got another.
    Mismatch {
        /// Call site, e.g. `"linear input"`.
        context: &'static str,
        /// Required length.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// Index `index` is not below `bound`.
    OutOfRange {
        /// Call site, e.g. `"token embedding"`.
        context: &'static str,
        /// Offending index.
        index: usize,
        /// Exclusive upper bound.
        bound: usize,
    },

    /// Input has no elements.
    Empty {
        /// Call site.
        context: &'static str,
    },
}

impl fmt::Display for DimensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionError::Mismatch {
                context,
                expected,
                actual,
            } => write!(f, "dimension: {context}: expected {expected}, got {actual}"),
            DimensionError::OutOfRange {
                context,
                index,
                bound,
            } => write!(f, "dimension: {context}: index {index} out of range 0..{bound}"),
            DimensionError::Empty { context } => write!(f, "dimension: {context}: empty input"),
        }
    }
}

impl std::error::Error for DimensionError {}

/// Returns [`DimensionError::Mismatch`] unless `actual == expected`.
pub(crate) fn ensure_len(
    context: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), DimensionError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DimensionError::Mismatch {
            context,
            expected,
            actual,
        })
    }
}
