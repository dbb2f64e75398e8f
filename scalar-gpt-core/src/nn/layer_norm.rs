//! Layer normalization over the whole feature vector.
//!
//! ```text
//! mean = sum(x) / n
//! var  = sum((x - mean)^2) / n
//! y    = (x - mean) / sqrt(var + eps) * scale + shift
//! ```
//!
//! `mean` and `var` are graph nodes shared by every output element, so the backward
//! pass picks up their contribution to each input without a hand-derived formula.

use crate::autograd::{sum, Pow, ValueRef};
use crate::tensor::{ensure_len, DimensionError, Matrix};

use super::{Initializer, Module};

/// Variance epsilon.
pub const LAYER_NORM_EPS: f64 = 1e-5;

/// Normalizes each row to zero mean and unit variance, then applies a learned scale and
/// an optional learned shift.
pub struct LayerNorm {
    dim: usize,
    /// Starts at 1.
    scale: Vec<ValueRef>,
    /// Starts at 0.
    shift: Option<Vec<ValueRef>>,
}

impl LayerNorm {
    /// Creates a layer norm over vectors of width `dim`.
    #[must_use]
    pub fn new(dim: usize, shift: bool) -> Self {
        LayerNorm {
            dim,
            scale: Initializer::constant(dim, 1.0),
            shift: shift.then(|| Initializer::constant(dim, 0.0)),
        }
    }

    /// Normalizes one vector.
    ///
    /// # Errors
    ///
    /// - [`DimensionError::Mismatch`] when `x.len() != dim`.
    /// - [`DimensionError::Empty`] when `dim == 0`.
    pub fn forward_row(&self, x: &[ValueRef]) -> Result<Vec<ValueRef>, DimensionError> {
        ensure_len("layer norm input", self.dim, x.len())?;
        if x.is_empty() {
            return Err(DimensionError::Empty {
                context: "layer norm input",
            });
        }
        let n = x.len() as f64;
        let mean = sum(x) / n;
        let centered: Vec<ValueRef> = x.iter().map(|xi| xi - &mean).collect();
        let var = centered.iter().map(|c| c * c).sum::<ValueRef>() / n;
        // var + eps >= eps, so the division below never sees zero.
        let std = (var + LAYER_NORM_EPS).pow(0.5);

        let out = centered
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let scaled = c / &std * &self.scale[i];
                match &self.shift {
                    Some(b) => scaled + &b[i],
                    None => scaled,
                }
            })
            .collect();
        Ok(out)
    }

    /// Normalizes every row of `x`.
    ///
    /// # Errors
    ///
    /// See [`LayerNorm::forward_row`].
    pub fn forward(&self, x: &Matrix) -> Result<Matrix, DimensionError> {
        let mut nodes = Vec::with_capacity(x.rows() * x.cols());
        for row in x.iter_rows() {
            nodes.extend(self.forward_row(row)?);
        }
        Matrix::from_nodes(x.rows(), self.dim, nodes)
    }
}

impl Module for LayerNorm {
    /// Scale, then shift.
    fn parameters(&self) -> Vec<ValueRef> {
        let mut params = self.scale.clone();
        if let Some(b) = &self.shift {
            params.extend(b.iter().cloned());
        }
        params
    }
}
