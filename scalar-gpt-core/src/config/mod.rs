//! Pipeline configuration: model shape, optimizer, training and sampling settings, paths.
//!
//! Load with [`from_env`], then check with [`Config::validate`]. Defaults and variable
//! names live in the `constants` submodule.

mod builder;
mod constants;
mod error;

use std::path::PathBuf;

use constants::{
    DEFAULT_BETA1, DEFAULT_BETA2, DEFAULT_BIAS, DEFAULT_BLOCK_SIZE, DEFAULT_CHECKPOINT_PATH,
    DEFAULT_DROPOUT, DEFAULT_EPSILON, DEFAULT_GRAD_CLIP, DEFAULT_INIT_STD, DEFAULT_INPUT_PATH,
    DEFAULT_LEARNING_RATE, DEFAULT_LOSS_LOG_EVERY, DEFAULT_NUM_STEPS, DEFAULT_N_EMBED,
    DEFAULT_N_HEAD, DEFAULT_N_LAYER, DEFAULT_SAMPLE_SIZE, DEFAULT_SEED, DEFAULT_TEMPERATURE,
};

use crate::model::GptConfig;

pub use builder::{env_key, env_parsed, env_string, from_env};
pub use error::ConfigError;

/// Everything the train-then-sample pipeline needs.
#[derive(Clone, Debug)]
pub struct Config {
    /// Seed for initialization, shuffling, dropout and sampling.
    pub seed: u64,
    /// Corpus, one document per line.
    pub input_path: PathBuf,
    /// Where the trained model is written.
    pub checkpoint_path: PathBuf,

    /// Embedding width (multiple of `n_head`).
    pub n_embed: usize,
    /// Attention heads per block.
    pub n_head: usize,
    /// Transformer blocks.
    pub n_layer: usize,
    /// Context length.
    pub block_size: usize,
    /// Dropout rate during training, in `[0, 1)`.
    pub dropout: f64,
    /// Biases in linear layers, shifts in layer norms.
    pub bias: bool,
    /// Weight init standard deviation.
    pub init_std: f64,

    /// Adam base learning rate (decays linearly to 0).
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    /// Max global gradient norm; 0 disables clipping.
    pub grad_clip: f64,

    pub num_steps: usize,
    /// Log the loss every this many steps.
    pub loss_log_every: usize,

    /// Sampling temperature in `(0, 1]`.
    pub temperature: f64,
    /// Samples printed after training.
    pub sample_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            n_embed: DEFAULT_N_EMBED,
            n_head: DEFAULT_N_HEAD,
            n_layer: DEFAULT_N_LAYER,
            block_size: DEFAULT_BLOCK_SIZE,
            dropout: DEFAULT_DROPOUT,
            bias: DEFAULT_BIAS,
            init_std: DEFAULT_INIT_STD,
            learning_rate: DEFAULT_LEARNING_RATE,
            beta1: DEFAULT_BETA1,
            beta2: DEFAULT_BETA2,
            epsilon: DEFAULT_EPSILON,
            grad_clip: DEFAULT_GRAD_CLIP,
            num_steps: DEFAULT_NUM_STEPS,
            loss_log_every: DEFAULT_LOSS_LOG_EVERY,
            temperature: DEFAULT_TEMPERATURE,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl Config {
    /// Model layout for a vocabulary of `vocab_size` ids.
    #[must_use]
    pub fn model_config(&self, vocab_size: usize) -> GptConfig {
        GptConfig {
            vocab_size,
            block_size: self.block_size,
            n_embed: self.n_embed,
            n_head: self.n_head,
            n_layer: self.n_layer,
            dropout: self.dropout,
            bias: self.bias,
            init_std: self.init_std,
        }
    }

    /// Checks model shape (as [`GptConfig::validate`] with a placeholder vocabulary) and
    /// the optimizer and sampling ranges.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Shape`] or [`ConfigError::OutOfRange`] for the first rule that fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model_config(1).validate()?;
        ConfigError::check_range("learning_rate", self.learning_rate, "(0, inf)", |lr| {
            lr.is_finite() && lr > 0.0
        })?;
        ConfigError::check_range("beta1", self.beta1, "[0, 1)", |b| (0.0..1.0).contains(&b))?;
        ConfigError::check_range("beta2", self.beta2, "[0, 1)", |b| (0.0..1.0).contains(&b))?;
        ConfigError::check_range("grad_clip", self.grad_clip, "[0, inf)", |c| c >= 0.0)?;
        ConfigError::check_range("temperature", self.temperature, "(0, 1]", |t| {
            t > 0.0 && t <= 1.0
        })?;
        Ok(())
    }

    /// Width of each attention head.
    #[must_use]
    pub fn head_dim(&self) -> usize {
        self.n_embed / self.n_head
    }
}
