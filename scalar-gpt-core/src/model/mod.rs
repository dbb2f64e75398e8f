//! GPT model assembly and its training objective.
//!
//! [`Gpt`] maps a sequence of token ids to per-position vocabulary logits; every logit is
//! a graph node, so [`cross_entropy`] over them gives a loss whose backward pass reaches
//! all parameters.

mod config;
mod gpt;
mod loss;

pub use config::GptConfig;
pub use gpt::Gpt;
pub use loss::cross_entropy;
