//! Nonlinearities built only from primitives, so their gradients come from the chain rule.

use std::f64::consts::PI;

use crate::autograd::{Exp, ScalarNode, ValueRef};

/// Cubic coefficient of the tanh approximation of GELU.
const GELU_COEFF: f64 = 0.044715;

impl ValueRef {
    /// Logistic sigmoid `1 / (1 + e^-x)`.
    ///
    /// For negative inputs the equivalent form `e^x / (1 + e^x)` is built instead, so
    /// neither branch ever exponentiates a large positive number.
    #[must_use]
    pub fn sigmoid(&self) -> ValueRef {
        if self.data() >= 0.0 {
            let e = (-self).exp();
            1.0 / (&e + 1.0)
        } else {
            let e = self.exp();
            &e / (&e + 1.0)
        }
    }

    /// Hyperbolic tangent via `2 * sigmoid(2x) - 1`.
    #[must_use]
    pub fn tanh(&self) -> ValueRef {
        (self * 2.0).sigmoid() * 2.0 - 1.0
    }

    /// GELU, tanh approximation: `0.5 * x * (1 + tanh(sqrt(2/pi) * (x + 0.044715 * x^3)))`.
    #[must_use]
    pub fn gelu(&self) -> ValueRef {
        let cube = self * self * self;
        let inner = (self + cube * GELU_COEFF) * (2.0 / PI).sqrt();
        self * 0.5 * (inner.tanh() + 1.0)
    }
}
