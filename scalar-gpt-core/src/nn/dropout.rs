//! Inverted dropout.

use rand::Rng;

use crate::autograd::ValueRef;
use crate::tensor::Matrix;

use super::ForwardContext;

/// Zeroes each element with probability `rate` during training and scales survivors by
/// `1 / (1 - rate)`. Identity in evaluation or at rate 0.
///
/// Dropped elements are multiplied by 0 rather than removed, so the graph keeps the same
/// shape and those elements simply receive zero gradient.
#[derive(Clone, Copy, Debug)]
pub struct Dropout {
    rate: f64,
}

impl Dropout {
    /// `rate` must lie in `[0, 1)` (checked by config validation).
    #[must_use]
    pub fn new(rate: f64) -> Self {
        Dropout { rate }
    }

    /// Drop probability.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Applies dropout to every element of `x`.
    pub fn forward(&self, x: &Matrix, ctx: &mut ForwardContext) -> Matrix {
        if !ctx.is_training() || self.rate == 0.0 {
            return x.clone();
        }
        let keep_scale = 1.0 / (1.0 - self.rate);
        let rng = ctx.rng();
        x.map(|v: &ValueRef| {
            if rng.random::<f64>() < self.rate {
                v * 0.0
            } else {
                v * keep_scale
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::ScalarNode;

    #[test]
    fn eval_mode_is_identity() {
        let x = Matrix::from_values(1, 3, &[1.0, 2.0, 3.0]).unwrap();
        let y = Dropout::new(0.5).forward(&x, &mut ForwardContext::eval());
        assert_eq!(y.get(0, 2).id(), x.get(0, 2).id());
    }

    #[test]
    fn train_mode_zeroes_or_rescales() {
        let x = Matrix::from_values(1, 200, &[1.0; 200]).unwrap();
        let y = Dropout::new(0.25).forward(&x, &mut ForwardContext::train(7));
        let values = y.values();
        assert!(values.iter().all(|&v| v == 0.0 || (v - 1.0 / 0.75).abs() < 1e-12));
        let dropped = values.iter().filter(|&&v| v == 0.0).count();
        assert!(dropped > 20 && dropped < 90, "dropped {dropped}");
        assert!(y.get(0, 0).data().is_finite());
    }

    #[test]
    fn same_seed_same_mask() {
        let x = Matrix::from_values(1, 50, &[1.0; 50]).unwrap();
        let d = Dropout::new(0.5);
        let a = d.forward(&x, &mut ForwardContext::train(3)).values();
        let b = d.forward(&x, &mut ForwardContext::train(3)).values();
        assert_eq!(a, b);
    }
}
