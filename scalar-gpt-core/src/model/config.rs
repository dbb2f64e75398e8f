//! Model hyperparameters.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Shape and initialization of a [`Gpt`](super::Gpt).
///
/// Stored verbatim in checkpoints so a saved model can be rebuilt with the same layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GptConfig {
    /// Number of token ids (including BOS).
    pub vocab_size: usize,
    /// Maximum sequence length; size of the position table.
    pub block_size: usize,
    /// Embedding width.
    pub n_embed: usize,
    /// Attention heads per block.
    pub n_head: usize,
    /// Number of transformer blocks.
    pub n_layer: usize,
    /// Dropout rate in `[0, 1)`, applied only in training mode.
    pub dropout: f64,
    /// Whether linear layers carry biases and layer norms carry shifts.
    pub bias: bool,
    /// Standard deviation of the Gaussian weight initialization.
    pub init_std: f64,
}

impl GptConfig {
    /// Checks that the dimensions can build a model.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Shape`] for a zero size or heads that do not split `n_embed`.
    /// - [`ConfigError::OutOfRange`] for `dropout` or `init_std`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("vocab_size", self.vocab_size),
            ("block_size", self.block_size),
            ("n_embed", self.n_embed),
            ("n_head", self.n_head),
            ("n_layer", self.n_layer),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::Shape(format!("{name} must be greater than 0")));
            }
        }
        if !self.n_embed.is_multiple_of(self.n_head) {
            return Err(ConfigError::Shape(format!(
                "n_embed ({}) must be divisible by n_head ({})",
                self.n_embed, self.n_head
            )));
        }
        ConfigError::check_range("dropout", self.dropout, "[0, 1)", |p| (0.0..1.0).contains(&p))?;
        ConfigError::check_range("init_std", self.init_std, "(0, inf)", |s| {
            s.is_finite() && s > 0.0
        })?;
        Ok(())
    }

    /// Width of each attention head.
    #[must_use]
    pub fn head_dim(&self) -> usize {
        self.n_embed / self.n_head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> GptConfig {
        GptConfig {
            vocab_size: 5,
            block_size: 4,
            n_embed: 4,
            n_head: 2,
            n_layer: 1,
            dropout: 0.0,
            bias: true,
            init_std: 0.1,
        }
    }

    #[test]
    fn tiny_config_is_valid() {
        assert!(tiny().validate().is_ok());
        assert_eq!(tiny().head_dim(), 2);
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            GptConfig { vocab_size: 0, ..tiny() },
            GptConfig { n_head: 3, ..tiny() },
            GptConfig { dropout: 1.0, ..tiny() },
            GptConfig { dropout: -0.1, ..tiny() },
            GptConfig { init_std: 0.0, ..tiny() },
            GptConfig { n_layer: 0, ..tiny() },
        ];
        for cfg in cases {
            assert!(cfg.validate().is_err(), "{cfg:?} should be rejected");
        }
    }

    #[test]
    fn range_errors_name_the_field() {
        let err = GptConfig { dropout: 1.0, ..tiny() }.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::OutOfRange {
                field: "dropout",
                value: 1.0,
                range: "[0, 1)"
            }
        );
        let err = GptConfig { n_head: 3, ..tiny() }.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Shape(_)));
        assert_eq!(err.subject(), "model shape");
    }

    #[test]
    fn serializes_as_plain_fields() {
        let json = serde_json::to_string(&tiny()).unwrap();
        assert!(json.contains("\"n_embed\":4"));
        let back: GptConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tiny());
    }
}
