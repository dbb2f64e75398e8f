//! Next-token cross-entropy.

use crate::autograd::{log_softmax, ValueRef};
use crate::tensor::{ensure_len, DimensionError, Logits};
use crate::Error;

/// Mean over positions of `-log softmax(logits[t])[targets[t]]`.
///
/// Uses [`log_softmax`] (max-shifted log-sum-exp), so no probability is ever rounded to
/// zero before its log is taken.
///
/// # Errors
///
/// - [`Error::Dimension`] when `targets` does not have one id per logits row, is empty,
///   or holds an id outside the vocabulary.
/// - [`Error::Autograd`] when the logits are NaN.
pub fn cross_entropy(logits: &Logits, targets: &[usize]) -> Result<ValueRef, Error> {
    ensure_len("loss targets", logits.rows(), targets.len())?;
    if targets.is_empty() {
        return Err(DimensionError::Empty {
            context: "loss targets",
        }
        .into());
    }
    let mut losses = Vec::with_capacity(targets.len());
    for (row, &target) in logits.iter_rows().zip(targets) {
        if target >= row.len() {
            return Err(DimensionError::OutOfRange {
                context: "loss target",
                index: target,
                bound: row.len(),
            }
            .into());
        }
        let log_probs = log_softmax(row)?;
        losses.push(-&log_probs[target]);
    }
    let n = losses.len() as f64;
    Ok(losses.into_iter().sum::<ValueRef>() / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::ScalarNode;
    use crate::tensor::Matrix;

    #[test]
    fn uniform_logits_give_log_vocab() {
        let logits = Matrix::from_values(2, 4, &[0.0; 8]).unwrap();
        let loss = cross_entropy(&logits, &[1, 3]).unwrap();
        assert!((loss.data() - 4.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn gradient_is_softmax_minus_one_hot_over_positions() {
        let values = [1.0, 2.0, 0.5, -1.0, 0.0, 3.0];
        let logits = Matrix::from_values(2, 3, &values).unwrap();
        let targets = [0, 2];
        let loss = cross_entropy(&logits, &targets).unwrap();
        loss.backward().unwrap();
        for (r, row) in values.chunks(3).enumerate() {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let z: f64 = row.iter().map(|v| (v - max).exp()).sum();
            for c in 0..3 {
                let p = (row[c] - max).exp() / z;
                let onehot = if c == targets[r] { 1.0 } else { 0.0 };
                let expected = (p - onehot) / 2.0;
                assert!((logits.get(r, c).grad() - expected).abs() < 1e-12, "({r},{c})");
            }
        }
    }

    #[test]
    fn large_logits_do_not_overflow() {
        let logits = Matrix::from_values(1, 2, &[1000.0, -1000.0]).unwrap();
        let loss = cross_entropy(&logits, &[1]).unwrap();
        assert!((loss.data() - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn target_shape_is_checked() {
        let logits = Matrix::from_values(2, 3, &[0.0; 6]).unwrap();
        assert!(matches!(
            cross_entropy(&logits, &[0]),
            Err(Error::Dimension(DimensionError::Mismatch { .. }))
        ));
        assert!(matches!(
            cross_entropy(&logits, &[0, 3]),
            Err(Error::Dimension(DimensionError::OutOfRange { index: 3, .. }))
        ));
    }
}
