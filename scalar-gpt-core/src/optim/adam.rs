//! Adam with bias correction.

use std::collections::HashMap;

use crate::autograd::{NodeId, ScalarNode, ValueRef};

use super::Optimizer;

#[derive(Clone, Copy, Debug, Default)]
struct Moments {
    m: f64,
    v: f64,
}

/// Adam: first and second moment estimates per parameter, bias-corrected by step count.
///
/// ```text
/// m = b1*m + (1-b1)*g
/// v = b2*v + (1-b2)*g^2
/// p -= lr * (m / (1-b1^t)) / (sqrt(v / (1-b2^t)) + eps)
/// ```
#[derive(Clone, Debug)]
pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    t: i32,
    state: HashMap<NodeId, Moments>,
}

impl Adam {
    #[must_use]
    pub fn new(lr: f64, beta1: f64, beta2: f64, eps: f64) -> Self {
        Adam {
            lr,
            beta1,
            beta2,
            eps,
            t: 0,
            state: HashMap::new(),
        }
    }

    /// Number of steps taken so far.
    #[must_use]
    pub fn steps(&self) -> i32 {
        self.t
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &[ValueRef]) {
        self.t += 1;
        let bias1 = 1.0 - self.beta1.powi(self.t);
        let bias2 = 1.0 - self.beta2.powi(self.t);
        for p in params {
            let g = p.grad();
            let s = self.state.entry(p.id()).or_default();
            s.m = self.beta1 * s.m + (1.0 - self.beta1) * g;
            s.v = self.beta2 * s.v + (1.0 - self.beta2) * g * g;
            let m_hat = s.m / bias1;
            let v_hat = s.v / bias2;
            p.set_data(p.data() - self.lr * m_hat / (v_hat.sqrt() + self.eps));
        }
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }
}
