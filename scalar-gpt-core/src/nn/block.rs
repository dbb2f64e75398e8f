//! Pre-norm transformer block.

use crate::autograd::ValueRef;
use crate::tensor::{DimensionError, Matrix};

use super::{CausalSelfAttention, FeedForward, ForwardContext, Initializer, LayerNorm, Module};

/// `x + attn(ln1(x))`, then `x + ff(ln2(x))`.
///
/// The residual additions give every block's input a direct gradient path around the
/// sub-layer.
pub struct Block {
    ln1: LayerNorm,
    attn: CausalSelfAttention,
    ln2: LayerNorm,
    ff: FeedForward,
}

impl Block {
    /// # Errors
    ///
    /// See [`CausalSelfAttention::new`].
    pub fn new(
        n_embed: usize,
        n_head: usize,
        bias: bool,
        dropout: f64,
        init: &mut Initializer,
    ) -> Result<Self, DimensionError> {
        Ok(Block {
            ln1: LayerNorm::new(n_embed, bias),
            attn: CausalSelfAttention::new(n_embed, n_head, bias, dropout, init)?,
            ln2: LayerNorm::new(n_embed, bias),
            ff: FeedForward::new(n_embed, bias, dropout, init),
        })
    }

    /// # Errors
    ///
    /// - [`DimensionError`] when `x` is empty or has the wrong width.
    pub fn forward(&self, x: &Matrix, ctx: &mut ForwardContext) -> Result<Matrix, DimensionError> {
        let x = x.add(&self.attn.forward(&self.ln1.forward(x)?, ctx)?)?;
        x.add(&self.ff.forward(&self.ln2.forward(&x)?, ctx)?)
    }
}

impl Module for Block {
    /// ln1, attention, ln2, feed-forward.
    fn parameters(&self) -> Vec<ValueRef> {
        let mut params = self.ln1.parameters();
        params.extend(self.attn.parameters());
        params.extend(self.ln2.parameters());
        params.extend(self.ff.parameters());
        params
    }
}
