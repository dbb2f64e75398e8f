//! Parameter initialization.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::autograd::ValueRef;
use crate::config::ConfigError;

/// Draws weights from `N(0, std)` using a caller-owned RNG, so a fixed seed reproduces a model.
pub struct Initializer<'r> {
    normal: Normal<f64>,
    rng: &'r mut StdRng,
}

impl<'r> Initializer<'r> {
    /// Creates a Gaussian initializer with mean 0 and standard deviation `std`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::OutOfRange`] when `std` is negative or not finite.
    pub fn new(std: f64, rng: &'r mut StdRng) -> Result<Self, ConfigError> {
        let out_of_range = ConfigError::OutOfRange {
            field: "init_std",
            value: std,
            range: "[0, inf)",
        };
        // `Normal::new` accepts a negative std (it mirrors the distribution).
        if !(std.is_finite() && std >= 0.0) {
            return Err(out_of_range);
        }
        let normal = Normal::new(0.0, std).map_err(|_| out_of_range)?;
        Ok(Initializer { normal, rng })
    }

    /// `nout` rows of `nin` fresh Gaussian leaves.
    pub fn matrix(&mut self, nout: usize, nin: usize) -> Vec<Vec<ValueRef>> {
        (0..nout).map(|_| self.vector(nin)).collect()
    }

    /// `n` fresh Gaussian leaves.
    pub fn vector(&mut self, n: usize) -> Vec<ValueRef> {
        (0..n)
            .map(|_| ValueRef::new(self.normal.sample(&mut *self.rng)))
            .collect()
    }

    /// `n` fresh leaves all holding `value` (LayerNorm scale, biases).
    #[must_use]
    pub fn constant(n: usize, value: f64) -> Vec<ValueRef> {
        (0..n).map(|_| ValueRef::new(value)).collect()
    }
}
