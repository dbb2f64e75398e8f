//! Multi-head causal self-attention.
//!
//! Every step (projections, scores, mask, softmax, weighted sum) is built from graph
//! nodes, so the backward pass reaches the projection weights through all of them.

use crate::autograd::{softmax, ValueRef};
use crate::tensor::{ensure_len, DimensionError, Matrix};

use super::{Dropout, ForwardContext, Initializer, Linear, Module};

/// Score written in place of every future position (`j > i`).
///
/// After max-subtraction its exponential underflows to exactly 0, so masked positions
/// get probability 0 and pass no gradient to their value rows.
pub const MASK_VALUE: f64 = -1e9;

/// Row-wise softmax of masked, scaled scores `q[i]·k[j] / sqrt(head_dim)`.
///
/// Returns a `T × T` matrix whose row `i` is the attention distribution of position `i`.
///
/// # Errors
///
/// - [`DimensionError::Mismatch`] when `q` and `k` differ in shape.
/// - [`DimensionError::Empty`] when the sequence is empty.
pub fn causal_attention_weights(q: &Matrix, k: &Matrix) -> Result<Matrix, DimensionError> {
    ensure_len("attention key rows", q.rows(), k.rows())?;
    ensure_len("attention key width", q.cols(), k.cols())?;
    if q.rows() == 0 || q.cols() == 0 {
        return Err(DimensionError::Empty {
            context: "attention input",
        });
    }
    let scale = 1.0 / (q.cols() as f64).sqrt();
    let rows = q
        .iter_rows()
        .enumerate()
        .map(|(i, qi)| {
            let scores: Vec<ValueRef> = k
                .iter_rows()
                .enumerate()
                .map(|(j, kj)| {
                    if j > i {
                        ValueRef::new(MASK_VALUE)
                    } else {
                        qi.iter().zip(kj).map(|(a, b)| a * b).sum::<ValueRef>() * scale
                    }
                })
                .collect();
            softmax(&scores)
        })
        .collect();
    Matrix::from_rows(rows)
}

/// `weights · v`: row `i` is `sum_j weights[i][j] * v[j]`.
fn weighted_sum(weights: &Matrix, v: &Matrix) -> Result<Matrix, DimensionError> {
    ensure_len("attention value rows", weights.cols(), v.rows())?;
    let mut nodes = Vec::with_capacity(weights.rows() * v.cols());
    for w_row in weights.iter_rows() {
        for c in 0..v.cols() {
            let acc: ValueRef = w_row
                .iter()
                .zip(v.iter_rows())
                .map(|(w, v_row)| w * &v_row[c])
                .sum();
            nodes.push(acc);
        }
    }
    Matrix::from_nodes(weights.rows(), v.cols(), nodes)
}

/// Single-head causal attention over already projected `q`, `k`, `v` (`T × head_dim`).
///
/// # Errors
///
/// See [`causal_attention_weights`]; also [`DimensionError::Mismatch`] when `v` has a
/// different row count.
pub fn causal_attention(q: &Matrix, k: &Matrix, v: &Matrix) -> Result<Matrix, DimensionError> {
    let weights = causal_attention_weights(q, k)?;
    weighted_sum(&weights, v)
}

/// Query/key/value projections, `n_head` independent heads, and an output projection.
pub struct CausalSelfAttention {
    n_head: usize,
    head_dim: usize,
    query: Linear,
    key: Linear,
    value: Linear,
    output: Linear,
    attn_dropout: Dropout,
    resid_dropout: Dropout,
}

impl CausalSelfAttention {
    /// # Errors
    ///
    /// - [`DimensionError::Empty`] when `n_head` is 0.
    /// - [`DimensionError::Mismatch`] when `n_embed` is not a multiple of `n_head`.
    pub fn new(
        n_embed: usize,
        n_head: usize,
        bias: bool,
        dropout: f64,
        init: &mut Initializer,
    ) -> Result<Self, DimensionError> {
        if n_head == 0 {
            return Err(DimensionError::Empty {
                context: "attention heads",
            });
        }
        let head_dim = n_embed / n_head;
        ensure_len("attention head split", head_dim * n_head, n_embed)?;
        Ok(CausalSelfAttention {
            n_head,
            head_dim,
            query: Linear::new(n_embed, n_embed, bias, init),
            key: Linear::new(n_embed, n_embed, bias, init),
            value: Linear::new(n_embed, n_embed, bias, init),
            output: Linear::new(n_embed, n_embed, bias, init),
            attn_dropout: Dropout::new(dropout),
            resid_dropout: Dropout::new(dropout),
        })
    }

    /// Number of heads.
    #[must_use]
    pub fn n_head(&self) -> usize {
        self.n_head
    }

    /// Width of each head.
    #[must_use]
    pub fn head_dim(&self) -> usize {
        self.head_dim
    }

    /// Attends over the rows of `x` (`T × n_embed`), each position seeing only itself and
    /// earlier positions.
    ///
    /// # Errors
    ///
    /// - [`DimensionError`] when `x` is empty or has the wrong width.
    pub fn forward(&self, x: &Matrix, ctx: &mut ForwardContext) -> Result<Matrix, DimensionError> {
        let q = self.query.forward(x)?;
        let k = self.key.forward(x)?;
        let v = self.value.forward(x)?;

        let mut heads = Vec::with_capacity(self.n_head);
        for h in 0..self.n_head {
            let start = h * self.head_dim;
            let qh = q.column_slice(start, self.head_dim)?;
            let kh = k.column_slice(start, self.head_dim)?;
            let vh = v.column_slice(start, self.head_dim)?;
            let weights = causal_attention_weights(&qh, &kh)?;
            let weights = self.attn_dropout.forward(&weights, ctx);
            heads.push(weighted_sum(&weights, &vh)?);
        }
        let merged = Matrix::hconcat(&heads)?;
        let out = self.output.forward(&merged)?;
        Ok(self.resid_dropout.forward(&out, ctx))
    }
}

impl Module for CausalSelfAttention {
    /// Query, key, value, output.
    fn parameters(&self) -> Vec<ValueRef> {
        let mut params = self.query.parameters();
        params.extend(self.key.parameters());
        params.extend(self.value.parameters());
        params.extend(self.output.parameters());
        params
    }
}
