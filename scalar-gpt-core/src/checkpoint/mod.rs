//! Model checkpoints: the config plus every parameter value in `parameters()` order.
//!
//! Only forward values are stored. Gradients, parent links and op tags belong to a single
//! training step and are rebuilt by the next forward pass.

mod error;

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::{Gpt, GptConfig};
use crate::nn::Module;
use crate::Error;

pub use error::CheckpointError;

/// A serializable snapshot of a [`Gpt`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Layout needed to rebuild the model.
    pub config: GptConfig,
    /// Parameter values in [`Module::parameters`] order.
    pub parameters: Vec<f64>,
}

impl Checkpoint {
    /// Copies the current parameter values of `model`.
    #[must_use]
    pub fn capture(model: &Gpt) -> Self {
        Checkpoint {
            config: model.config().clone(),
            parameters: model.snapshot(),
        }
    }

    /// Writes the checkpoint as JSON.
    ///
    /// # Errors
    ///
    /// - [`CheckpointError::Io`] or [`CheckpointError::Json`] on failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CheckpointError> {
        let path = path.as_ref();
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), parameters = self.parameters.len(), "checkpoint saved");
        Ok(())
    }

    /// Reads a checkpoint written by [`Checkpoint::save`].
    ///
    /// # Errors
    ///
    /// - [`CheckpointError::Io`] or [`CheckpointError::Json`] on failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Builds a model from the stored config and overwrites its parameters with the
    /// stored values.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when the stored config is invalid.
    /// - [`Error::Checkpoint`] with [`CheckpointError::ParameterCount`] when the value
    ///   count does not match the rebuilt model.
    pub fn restore(&self) -> Result<Gpt, Error> {
        // Initial values are overwritten below, so the seed is irrelevant.
        let model = Gpt::new(self.config.clone(), &mut StdRng::seed_from_u64(0))?;
        let expected = model.num_parameters();
        if expected != self.parameters.len() {
            return Err(CheckpointError::ParameterCount {
                expected,
                actual: self.parameters.len(),
            }
            .into());
        }
        model.load_snapshot(&self.parameters)?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::ForwardContext;

    fn model(seed: u64) -> Gpt {
        let config = GptConfig {
            vocab_size: 4,
            block_size: 4,
            n_embed: 4,
            n_head: 2,
            n_layer: 1,
            dropout: 0.1,
            bias: false,
            init_std: 0.2,
        };
        Gpt::new(config, &mut StdRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn restore_reproduces_logits() {
        let original = model(21);
        let restored = Checkpoint::capture(&original).restore().unwrap();
        let a = original.forward(&[0, 2, 1], &mut ForwardContext::eval()).unwrap();
        let b = restored.forward(&[0, 2, 1], &mut ForwardContext::eval()).unwrap();
        assert_eq!(a.values(), b.values());
    }

    #[test]
    fn save_then_load_from_disk() {
        let path = std::env::temp_dir().join("scalar_gpt_checkpoint_test.json");
        let ckpt = Checkpoint::capture(&model(3));
        ckpt.save(&path).unwrap();
        let loaded = Checkpoint::load(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.unwrap(), ckpt);
    }

    #[test]
    fn parameter_count_mismatch_is_reported() {
        let mut ckpt = Checkpoint::capture(&model(3));
        let expected = ckpt.parameters.len();
        ckpt.parameters.pop();
        assert!(matches!(
            ckpt.restore(),
            Err(Error::Checkpoint(CheckpointError::ParameterCount { expected: e, actual: a }))
                if e == expected && a == expected - 1
        ));
    }

    #[test]
    fn missing_file_and_bad_json() {
        assert!(matches!(
            Checkpoint::load("/nonexistent/scalar_gpt_never.json"),
            Err(CheckpointError::Io(_))
        ));
        let path = std::env::temp_dir().join("scalar_gpt_checkpoint_bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let result = Checkpoint::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(CheckpointError::Json(_))));
    }
}
