//! Position-wise feed-forward sub-layer.

use crate::autograd::ValueRef;
use crate::tensor::{DimensionError, Matrix};

use super::{Dropout, ForwardContext, Initializer, Linear, Module};

/// Hidden width multiplier.
pub const EXPANSION: usize = 4;

/// `proj(gelu(fc(x)))` with dropout on the output.
pub struct FeedForward {
    fc: Linear,
    proj: Linear,
    dropout: Dropout,
}

impl FeedForward {
    #[must_use]
    pub fn new(n_embed: usize, bias: bool, dropout: f64, init: &mut Initializer) -> Self {
        FeedForward {
            fc: Linear::new(n_embed, EXPANSION * n_embed, bias, init),
            proj: Linear::new(EXPANSION * n_embed, n_embed, bias, init),
            dropout: Dropout::new(dropout),
        }
    }

    /// # Errors
    ///
    /// - [`DimensionError::Mismatch`] when `x` has the wrong width.
    pub fn forward(&self, x: &Matrix, ctx: &mut ForwardContext) -> Result<Matrix, DimensionError> {
        let hidden = self.fc.forward(x)?.map(ValueRef::gelu);
        let out = self.proj.forward(&hidden)?;
        Ok(self.dropout.forward(&out, ctx))
    }
}

impl Module for FeedForward {
    fn parameters(&self) -> Vec<ValueRef> {
        let mut params = self.fc.parameters();
        params.extend(self.proj.parameters());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{sum, ScalarNode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn expands_then_projects_back() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut init = Initializer::new(0.3, &mut rng).unwrap();
        let ff = FeedForward::new(3, true, 0.0, &mut init);
        assert_eq!(ff.num_parameters(), (3 * 12 + 12) + (12 * 3 + 3));
        let x = Matrix::from_values(2, 3, &[0.5, -0.5, 1.0, 0.0, 0.2, -1.0]).unwrap();
        let y = ff.forward(&x, &mut ForwardContext::eval()).unwrap();
        assert_eq!(y.shape(), (2, 3));
        sum(y.nodes()).backward().unwrap();
        assert!(ff.parameters().iter().any(|p| p.grad() != 0.0));
        assert!(x.grads().iter().all(|g| g.is_finite()));
    }
}
