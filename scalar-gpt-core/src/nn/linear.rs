//! Fully connected layer.

use crate::autograd::ValueRef;
use crate::tensor::{ensure_len, DimensionError, Matrix};

use super::{Initializer, Module};

/// `y = W x + b`, one weight node per (output, input) pair and an optional bias per output.
pub struct Linear {
    in_features: usize,
    out_features: usize,
    /// `[out][in]`
    weight: Vec<Vec<ValueRef>>,
    bias: Option<Vec<ValueRef>>,
}

impl Linear {
    /// Gaussian weights from `init`; bias (if any) starts at 0.
    #[must_use]
    pub fn new(in_features: usize, out_features: usize, bias: bool, init: &mut Initializer) -> Self {
        Linear {
            in_features,
            out_features,
            weight: init.matrix(out_features, in_features),
            bias: bias.then(|| Initializer::constant(out_features, 0.0)),
        }
    }

    /// Builds a layer from explicit values (`weight` is `[out][in]`).
    ///
    /// # Errors
    ///
    /// - [`DimensionError::Empty`] when `weight` has no rows.
    /// - [`DimensionError::Mismatch`] when rows are ragged or `bias` has the wrong length.
    pub fn from_values(weight: &[Vec<f64>], bias: Option<&[f64]>) -> Result<Self, DimensionError> {
        let in_features = weight
            .first()
            .map(Vec::len)
            .ok_or(DimensionError::Empty {
                context: "linear weight",
            })?;
        for row in weight {
            ensure_len("linear weight row", in_features, row.len())?;
        }
        if let Some(b) = bias {
            ensure_len("linear bias", weight.len(), b.len())?;
        }
        Ok(Linear {
            in_features,
            out_features: weight.len(),
            weight: weight
                .iter()
                .map(|row| row.iter().copied().map(ValueRef::new).collect())
                .collect(),
            bias: bias.map(|b| b.iter().copied().map(ValueRef::new).collect()),
        })
    }

    /// Input width.
    #[must_use]
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Output width.
    #[must_use]
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// Applies the layer to one vector.
    ///
    /// # Errors
    ///
    /// - [`DimensionError::Mismatch`] when `x.len() != in_features`.
    pub fn forward_row(&self, x: &[ValueRef]) -> Result<Vec<ValueRef>, DimensionError> {
        ensure_len("linear input", self.in_features, x.len())?;
        let out = self
            .weight
            .iter()
            .enumerate()
            .map(|(i, w_row)| {
                let dot: ValueRef = w_row.iter().zip(x).map(|(w, xi)| w * xi).sum();
                match &self.bias {
                    Some(b) => dot + &b[i],
                    None => dot,
                }
            })
            .collect();
        Ok(out)
    }

    /// Applies the layer to every row of `x`.
    ///
    /// # Errors
    ///
    /// - [`DimensionError::Mismatch`] when `x.cols() != in_features`.
    pub fn forward(&self, x: &Matrix) -> Result<Matrix, DimensionError> {
        ensure_len("linear input", self.in_features, x.cols())?;
        let mut nodes = Vec::with_capacity(x.rows() * self.out_features);
        for row in x.iter_rows() {
            nodes.extend(self.forward_row(row)?);
        }
        Matrix::from_nodes(x.rows(), self.out_features, nodes)
    }
}

impl Module for Linear {
    /// Weights row-major, then biases.
    fn parameters(&self) -> Vec<ValueRef> {
        let mut params: Vec<ValueRef> = self.weight.iter().flatten().cloned().collect();
        if let Some(b) = &self.bias {
            params.extend(b.iter().cloned());
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{sum, ScalarNode};

    fn leaves(values: &[f64]) -> Vec<ValueRef> {
        values.iter().copied().map(ValueRef::new).collect()
    }

    #[test]
    fn linear_output_values() {
        let layer = Linear::from_values(&[vec![0.5, 0.5], vec![1.0, 0.0]], Some(&[0.0, 1.0][..])).unwrap();
        let out = layer.forward_row(&leaves(&[1.0, 2.0])).unwrap();
        assert_eq!(out.len(), 2);
        assert!((out[0].data() - 1.5).abs() < 1e-12);
        assert!((out[1].data() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn linear_gradients_reach_weights_bias_and_input() {
        let layer = Linear::from_values(&[vec![2.0, -1.0]], Some(&[0.5][..])).unwrap();
        let x = leaves(&[3.0, 4.0]);
        let y = layer.forward_row(&x).unwrap();
        y[0].backward().unwrap();
        let grads: Vec<f64> = layer.parameters().iter().map(ValueRef::grad).collect();
        assert_eq!(grads, vec![3.0, 4.0, 1.0]);
        assert_eq!(x[0].grad(), 2.0);
        assert_eq!(x[1].grad(), -1.0);
    }

    #[test]
    fn parameters_are_weights_then_biases() {
        let layer = Linear::from_values(&[vec![1.0, 2.0], vec![3.0, 4.0]], Some(&[5.0, 6.0][..])).unwrap();
        let values: Vec<f64> = layer.parameters().iter().map(ValueRef::data).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let ids_a: Vec<_> = layer.parameters().iter().map(ValueRef::id).collect();
        let ids_b: Vec<_> = layer.parameters().iter().map(ValueRef::id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn wrong_input_width_is_a_dimension_error() {
        let layer = Linear::from_values(&[vec![1.0, 2.0, 3.0]], None).unwrap();
        assert_eq!(
            layer.forward_row(&leaves(&[1.0])).unwrap_err(),
            DimensionError::Mismatch {
                context: "linear input",
                expected: 3,
                actual: 1
            }
        );
        let m = Matrix::from_values(2, 2, &[0.0; 4]).unwrap();
        assert!(layer.forward(&m).is_err());
    }

    #[test]
    fn forward_over_matrix_applies_each_row() {
        let layer = Linear::from_values(&[vec![1.0, 1.0]], None).unwrap();
        let m = Matrix::from_values(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let out = layer.forward(&m).unwrap();
        assert_eq!(out.shape(), (3, 1));
        assert_eq!(out.values(), vec![3.0, 7.0, 11.0]);
        sum(out.nodes()).backward().unwrap();
        // the single weight pair is shared by all three rows
        assert_eq!(layer.parameters()[0].grad(), 1.0 + 3.0 + 5.0);
    }
}
