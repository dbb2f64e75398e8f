//! Token and position embeddings, a stack of blocks, and the vocabulary head.

use rand::rngs::StdRng;

use crate::autograd::ValueRef;
use crate::nn::{Block, Embedding, ForwardContext, Initializer, LayerNorm, Linear, Module};
use crate::tensor::{DimensionError, Logits};
use crate::Error;

use super::GptConfig;

/// A decoder-only transformer over scalar autograd nodes.
pub struct Gpt {
    config: GptConfig,
    wte: Embedding,
    wpe: Embedding,
    blocks: Vec<Block>,
    ln_f: LayerNorm,
    lm_head: Linear,
}

impl Gpt {
    /// Builds a freshly initialized model. The same `config` and RNG state always produce
    /// the same parameters.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when `config` fails [`GptConfig::validate`].
    pub fn new(config: GptConfig, rng: &mut StdRng) -> Result<Self, Error> {
        config.validate()?;
        let mut init = Initializer::new(config.init_std, rng)?;
        let wte = Embedding::new("token embedding", config.vocab_size, config.n_embed, &mut init);
        let wpe = Embedding::new("position embedding", config.block_size, config.n_embed, &mut init);
        let blocks = (0..config.n_layer)
            .map(|_| {
                Block::new(
                    config.n_embed,
                    config.n_head,
                    config.bias,
                    config.dropout,
                    &mut init,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let ln_f = LayerNorm::new(config.n_embed, config.bias);
        let lm_head = Linear::new(config.n_embed, config.vocab_size, false, &mut init);
        Ok(Gpt {
            config,
            wte,
            wpe,
            blocks,
            ln_f,
            lm_head,
        })
    }

    /// Hyperparameters this model was built with.
    #[must_use]
    pub fn config(&self) -> &GptConfig {
        &self.config
    }

    /// Longest accepted input.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    /// Number of logits per position.
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.config.vocab_size
    }

    /// Logits for every position of `tokens` (`tokens.len() × vocab_size`).
    ///
    /// Row `t` depends only on `tokens[..=t]`.
    ///
    /// # Errors
    ///
    /// - [`DimensionError::Empty`] when `tokens` is empty.
    /// - [`DimensionError::OutOfRange`] with context `"position embedding"` when
    ///   `tokens.len() > block_size`, or `"token embedding"` for an id `>= vocab_size`.
    pub fn forward(&self, tokens: &[usize], ctx: &mut ForwardContext) -> Result<Logits, DimensionError> {
        if tokens.is_empty() {
            return Err(DimensionError::Empty { context: "token ids" });
        }
        let positions: Vec<usize> = (0..tokens.len()).collect();
        let pos = self.wpe.lookup(&positions)?;
        let tok = self.wte.lookup(tokens)?;
        let mut x = tok.add(&pos)?;
        for block in &self.blocks {
            x = block.forward(&x, ctx)?;
        }
        let x = self.ln_f.forward(&x)?;
        self.lm_head.forward(&x)
    }
}

impl Module for Gpt {
    /// wte, wpe, each block, ln_f, lm_head.
    fn parameters(&self) -> Vec<ValueRef> {
        let mut params = self.wte.parameters();
        params.extend(self.wpe.parameters());
        for block in &self.blocks {
            params.extend(block.parameters());
        }
        params.extend(self.ln_f.parameters());
        params.extend(self.lm_head.parameters());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{sum, ScalarNode};
    use rand::SeedableRng;

    fn config() -> GptConfig {
        GptConfig {
            vocab_size: 5,
            block_size: 4,
            n_embed: 4,
            n_head: 2,
            n_layer: 2,
            dropout: 0.0,
            bias: true,
            init_std: 0.1,
        }
    }

    fn model(config: GptConfig, seed: u64) -> Gpt {
        Gpt::new(config, &mut StdRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn logits_have_one_row_per_token() {
        let gpt = model(config(), 1);
        let logits = gpt.forward(&[0, 3, 1], &mut ForwardContext::eval()).unwrap();
        assert_eq!(logits.shape(), (3, 5));
        assert!(logits.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn parameter_count_matches_layout() {
        let gpt = model(config(), 1);
        let (v, b, d) = (5, 4, 4);
        let block = 2 * d + 4 * (d * d + d) + 2 * d + (d * 4 * d + 4 * d + 4 * d * d + d);
        assert_eq!(gpt.num_parameters(), v * d + b * d + 2 * block + 2 * d + d * v);
        let no_bias = model(GptConfig { bias: false, ..config() }, 1);
        assert!(no_bias.num_parameters() < gpt.num_parameters());
    }

    #[test]
    fn parameter_order_is_stable() {
        let gpt = model(config(), 2);
        let a: Vec<_> = gpt.parameters().iter().map(ValueRef::id).collect();
        let b: Vec<_> = gpt.parameters().iter().map(ValueRef::id).collect();
        assert_eq!(a, b);
        // token table first
        let first = gpt.wte.row(0).unwrap()[0].id();
        assert_eq!(a[0], first);
    }

    #[test]
    fn same_seed_same_model() {
        assert_eq!(model(config(), 7).snapshot(), model(config(), 7).snapshot());
        assert_ne!(model(config(), 7).snapshot(), model(config(), 8).snapshot());
    }

    #[test]
    fn earlier_logits_ignore_later_tokens() {
        let gpt = model(config(), 3);
        let a = gpt.forward(&[1, 2, 3], &mut ForwardContext::eval()).unwrap();
        let b = gpt.forward(&[1, 2, 4], &mut ForwardContext::eval()).unwrap();
        for c in 0..5 {
            assert!((a.get(1, c).data() - b.get(1, c).data()).abs() < 1e-12);
        }
        assert!((0..5).any(|c| a.get(2, c).data() != b.get(2, c).data()));
    }

    #[test]
    fn invalid_inputs_are_dimension_errors() {
        let gpt = model(config(), 1);
        let mut ctx = ForwardContext::eval();
        assert_eq!(
            gpt.forward(&[], &mut ctx).unwrap_err(),
            DimensionError::Empty { context: "token ids" }
        );
        assert_eq!(
            gpt.forward(&[0, 1, 2, 3, 4], &mut ctx).unwrap_err(),
            DimensionError::OutOfRange {
                context: "position embedding",
                index: 4,
                bound: 4
            }
        );
        assert_eq!(
            gpt.forward(&[0, 9], &mut ctx).unwrap_err(),
            DimensionError::OutOfRange {
                context: "token embedding",
                index: 9,
                bound: 5
            }
        );
    }

    #[test]
    fn backward_reaches_only_rows_that_were_read() {
        let gpt = model(config(), 4);
        let logits = gpt.forward(&[2, 2], &mut ForwardContext::eval()).unwrap();
        sum(logits.nodes()).backward().unwrap();
        let unread = gpt.wte.row(4).unwrap();
        assert!(unread.iter().all(|p| p.grad() == 0.0));
        let unused_position = gpt.wpe.row(3).unwrap();
        assert!(unused_position.iter().all(|p| p.grad() == 0.0));
        assert!(gpt.lm_head.parameters().iter().any(|p| p.grad() != 0.0));
    }

    #[test]
    fn rejects_invalid_config() {
        let result = Gpt::new(GptConfig { n_head: 3, ..config() }, &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
