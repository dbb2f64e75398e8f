//! Vector-level helpers composed from scalar operators.

use crate::autograd::{Exp, NumericError, ScalarNode, ValueRef};

/// Sum of all nodes (constant 0 for an empty slice).
#[must_use]
pub fn sum(values: &[ValueRef]) -> ValueRef {
    values.iter().sum()
}

/// Largest forward value, wrapped as a constant. Softmax is shift-invariant, so the
/// shift needs no gradient path.
fn max_constant(values: &[ValueRef]) -> ValueRef {
    let max = values
        .iter()
        .map(ScalarNode::data)
        .fold(f64::NEG_INFINITY, f64::max);
    ValueRef::new(max)
}

/// Logits → probabilities in \[0,1] summing to 1. Subtracts the max for numerical stability.
///
/// The denominator is at least 1 (the max element contributes `e^0`), so the unchecked
/// division is safe.
#[must_use]
pub fn softmax(logits: &[ValueRef]) -> Vec<ValueRef> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = max_constant(logits);
    let exps: Vec<ValueRef> = logits.iter().map(|l| (l - &max).exp()).collect();
    let total = sum(&exps);
    exps.iter().map(|e| e / &total).collect()
}

/// `log(softmax(logits))` computed as `(x - max) - log(sum(exp(x - max)))`.
///
/// # Errors
///
/// - [`NumericError::LogDomain`] if the normalizer is not positive, which only happens
///   when the logits themselves are NaN.
pub fn log_softmax(logits: &[ValueRef]) -> Result<Vec<ValueRef>, NumericError> {
    if logits.is_empty() {
        return Ok(Vec::new());
    }
    let max = max_constant(logits);
    let shifted: Vec<ValueRef> = logits.iter().map(|l| l - &max).collect();
    let normalizer = shifted.iter().map(Exp::exp).sum::<ValueRef>().try_log()?;
    Ok(shifted.iter().map(|s| s - &normalizer).collect())
}
