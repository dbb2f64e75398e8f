//! Parameterized layers composed from autograd operators.
//!
//! Each layer owns its parameters as leaf [`ValueRef`]s and exposes them through
//! [`Module::parameters`] in a fixed order. Forward methods only compose operators,
//! so gradients reach the parameters through the ordinary backward pass.
//!
//! Forward calls take a [`ForwardContext`] instead of reading a global training flag,
//! so dropout behaviour is explicit at every call site.

mod attention;
mod block;
mod dropout;
mod embedding;
mod feed_forward;
mod init;
mod layer_norm;
mod linear;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::autograd::{self, ScalarNode, ValueRef};
use crate::tensor::{ensure_len, DimensionError};

pub use attention::{causal_attention, causal_attention_weights, CausalSelfAttention, MASK_VALUE};
pub use block::Block;
pub use dropout::Dropout;
pub use embedding::Embedding;
pub use feed_forward::{FeedForward, EXPANSION};
pub use init::Initializer;
pub use layer_norm::{LayerNorm, LAYER_NORM_EPS};
pub use linear::Linear;

/// Whether a forward pass is part of training (dropout active) or evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Dropout masks are drawn from the context RNG.
    Train,
    /// Deterministic; the RNG is never touched.
    Eval,
}

/// Per-call state threaded through every forward method.
#[derive(Clone, Debug)]
pub struct ForwardContext {
    mode: Mode,
    rng: StdRng,
}

impl ForwardContext {
    /// Training context whose dropout masks come from `seed`.
    #[must_use]
    pub fn train(seed: u64) -> Self {
        ForwardContext {
            mode: Mode::Train,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Evaluation context.
    #[must_use]
    pub fn eval() -> Self {
        ForwardContext {
            mode: Mode::Eval,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns `true` in [`Mode::Train`].
    #[must_use]
    pub fn is_training(&self) -> bool {
        self.mode == Mode::Train
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Anything that owns trainable parameters.
pub trait Module {
    /// All parameters in a stable order (checkpoints rely on it).
    fn parameters(&self) -> Vec<ValueRef>;

    /// Number of scalar parameters.
    fn num_parameters(&self) -> usize {
        self.parameters().len()
    }

    /// Sets every parameter gradient to 0.
    fn zero_grad(&self) {
        autograd::zero_grad(&self.parameters());
    }

    /// Parameter values in [`Module::parameters`] order.
    fn snapshot(&self) -> Vec<f64> {
        self.parameters().iter().map(ValueRef::data).collect()
    }

    /// Overwrites parameter values from a [`Module::snapshot`].
    ///
    /// # Errors
    ///
    /// - [`DimensionError::Mismatch`] when `values` does not have one entry per parameter;
    ///   nothing is written in that case.
    fn load_snapshot(&self, values: &[f64]) -> Result<(), DimensionError> {
        let params = self.parameters();
        ensure_len("parameter snapshot", params.len(), values.len())?;
        for (p, &v) in params.iter().zip(values) {
            p.set_data(v);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_report_their_mode() {
        assert!(ForwardContext::train(1).is_training());
        assert_eq!(ForwardContext::eval().mode(), Mode::Eval);
    }

    #[test]
    fn snapshot_round_trips_through_load() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut init = Initializer::new(0.1, &mut rng).unwrap();
        let layer = Linear::new(3, 2, true, &mut init);
        let saved = layer.snapshot();
        assert_eq!(saved.len(), layer.num_parameters());
        layer.load_snapshot(&vec![0.0; saved.len()]).unwrap();
        assert!(layer.snapshot().iter().all(|&v| v == 0.0));
        layer.load_snapshot(&saved).unwrap();
        assert_eq!(layer.snapshot(), saved);
        assert!(matches!(
            layer.load_snapshot(&[1.0]),
            Err(DimensionError::Mismatch { .. })
        ));
    }

    #[test]
    fn zero_grad_clears_every_parameter() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut init = Initializer::new(0.1, &mut rng).unwrap();
        let layer = Linear::new(2, 2, true, &mut init);
        for p in layer.parameters() {
            p.add_grad(1.0);
        }
        layer.zero_grad();
        assert!(layer.parameters().iter().all(|p| p.grad() == 0.0));
    }
}
