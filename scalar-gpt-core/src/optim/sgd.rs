//! Plain gradient descent.

use crate::autograd::{ScalarNode, ValueRef};

use super::Optimizer;

/// `p -= lr * grad`.
#[derive(Clone, Debug)]
pub struct Sgd {
    lr: f64,
}

impl Sgd {
    #[must_use]
    pub fn new(lr: f64) -> Self {
        Sgd { lr }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &[ValueRef]) {
        for p in params {
            p.set_data(p.data() - self.lr * p.grad());
        }
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }
}
