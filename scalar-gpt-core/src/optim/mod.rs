//! Parameter updates from gradients.
//!
//! Optimizers read `(data, grad)` of each parameter and write back only `data`; they never
//! touch graph structure. Per-parameter state is keyed by [`NodeId`](crate::autograd::NodeId),
//! so it follows parameter identity rather than position in a list.

mod adam;
mod sgd;

use crate::autograd::{ScalarNode, ValueRef};

pub use adam::Adam;
pub use sgd::Sgd;

/// A gradient-based update rule.
pub trait Optimizer {
    /// Applies one update to every parameter using its current gradient.
    fn step(&mut self, params: &[ValueRef]);

    /// Current learning rate.
    fn learning_rate(&self) -> f64;

    /// Replaces the learning rate (used by schedules).
    fn set_learning_rate(&mut self, lr: f64);
}

/// Learning rate decaying linearly from `base` at step 0 to 0 at `total_steps`.
#[derive(Clone, Copy, Debug)]
pub struct LinearDecay {
    base: f64,
    total_steps: usize,
}

impl LinearDecay {
    #[must_use]
    pub fn new(base: f64, total_steps: usize) -> Self {
        LinearDecay { base, total_steps }
    }

    /// Rate for zero-based `step`.
    #[must_use]
    pub fn rate(&self, step: usize) -> f64 {
        if self.total_steps == 0 {
            return self.base;
        }
        let remaining = 1.0 - step.min(self.total_steps) as f64 / self.total_steps as f64;
        self.base * remaining
    }
}

/// Global L2 norm of all parameter gradients.
#[must_use]
pub fn grad_norm(params: &[ValueRef]) -> f64 {
    params.iter().map(|p| p.grad() * p.grad()).sum::<f64>().sqrt()
}

/// Rescales gradients so their global norm is at most `max_norm`. A `max_norm` of 0
/// disables clipping.
///
/// Returns the norm before clipping.
pub fn clip_grad_norm(params: &[ValueRef], max_norm: f64) -> f64 {
    let norm = grad_norm(params);
    if max_norm > 0.0 && norm > max_norm {
        let scale = max_norm / norm;
        for p in params {
            p.set_grad(p.grad() * scale);
        }
    }
    norm
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params_with_grads(grads: &[f64]) -> Vec<ValueRef> {
        grads
            .iter()
            .map(|&g| {
                let p = ValueRef::new(0.0);
                p.add_grad(g);
                p
            })
            .collect()
    }

    #[test]
    fn grad_norm_is_euclidean() {
        let params = params_with_grads(&[3.0, 4.0]);
        assert!((grad_norm(&params) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn clipping_scales_down_only_when_needed() {
        let params = params_with_grads(&[3.0, 4.0]);
        let before = clip_grad_norm(&params, 1.0);
        assert!((before - 5.0).abs() < 1e-12);
        assert!((params[0].grad() - 0.6).abs() < 1e-12);
        assert!((params[1].grad() - 0.8).abs() < 1e-12);

        let small = params_with_grads(&[0.1, 0.1]);
        clip_grad_norm(&small, 1.0);
        assert_eq!(small[0].grad(), 0.1);

        let disabled = params_with_grads(&[30.0]);
        clip_grad_norm(&disabled, 0.0);
        assert_eq!(disabled[0].grad(), 30.0);
    }

    #[test]
    fn linear_decay_reaches_zero_at_the_end() {
        let schedule = LinearDecay::new(0.01, 100);
        assert_eq!(schedule.rate(0), 0.01);
        assert!((schedule.rate(50) - 0.005).abs() < 1e-15);
        assert_eq!(schedule.rate(100), 0.0);
        assert_eq!(schedule.rate(500), 0.0);
    }
}
