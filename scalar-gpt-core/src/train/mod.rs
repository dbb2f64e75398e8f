//! Training loop: one optimizer step per document.
//!
//! [`train_step`] is the unit: zero gradients, forward, cross-entropy, backward, clip,
//! update. [`Trainer`] repeats it over a document list with a decaying learning rate
//! and logs progress through `tracing`.

use tracing::{debug, error, info};

use crate::autograd::ScalarNode;
use crate::config::Config;
use crate::model::{cross_entropy, Gpt};
use crate::nn::{ForwardContext, Module};
use crate::optim::{clip_grad_norm, Adam, LinearDecay, Optimizer};
use crate::tensor::DimensionError;
use crate::Error;

/// Outcome of one [`train_step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepStats {
    /// Loss before the update.
    pub loss: f64,
    /// Gradient norm before clipping.
    pub grad_norm: f64,
    /// Learning rate used for the update.
    pub learning_rate: f64,
    /// Number of predicted positions.
    pub positions: usize,
}

/// One forward/backward/update on `tokens`.
///
/// Predicts `tokens[1..=n]` from `tokens[..n]` with `n = min(tokens.len() - 1, block_size)`.
///
/// # Errors
///
/// - [`Error::Dimension`] when `tokens` has fewer than two ids or holds an id outside the
///   vocabulary.
/// - [`Error::Autograd`] when the loss or a gradient is not finite. Parameters are left
///   untouched in that case.
pub fn train_step<O: Optimizer>(
    model: &Gpt,
    optimizer: &mut O,
    tokens: &[usize],
    ctx: &mut ForwardContext,
    grad_clip: f64,
) -> Result<StepStats, Error> {
    if tokens.len() < 2 {
        return Err(DimensionError::Mismatch {
            context: "training sequence (minimum length)",
            expected: 2,
            actual: tokens.len(),
        }
        .into());
    }
    let n = (tokens.len() - 1).min(model.block_size());
    let params = model.parameters();
    model.zero_grad();

    let logits = model.forward(&tokens[..n], ctx)?;
    let loss = cross_entropy(&logits, &tokens[1..=n])?;
    loss.backward()?;

    let grad_norm = clip_grad_norm(&params, grad_clip);
    optimizer.step(&params);
    Ok(StepStats {
        loss: loss.data(),
        grad_norm,
        learning_rate: optimizer.learning_rate(),
        positions: n,
    })
}

/// Runs [`train_step`] for a fixed number of steps, cycling through documents.
pub struct Trainer<O> {
    optimizer: O,
    schedule: LinearDecay,
    num_steps: usize,
    loss_log_every: usize,
    grad_clip: f64,
    ctx: ForwardContext,
}

impl<O: Optimizer> Trainer<O> {
    /// `seed` drives dropout masks.
    #[must_use]
    pub fn new(
        optimizer: O,
        num_steps: usize,
        loss_log_every: usize,
        grad_clip: f64,
        seed: u64,
    ) -> Self {
        let schedule = LinearDecay::new(optimizer.learning_rate(), num_steps);
        Trainer {
            optimizer,
            schedule,
            num_steps,
            loss_log_every: loss_log_every.max(1),
            grad_clip,
            ctx: ForwardContext::train(seed),
        }
    }

    /// The optimizer (and its state) after training.
    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Trains `model` on `documents` (already BOS-wrapped id sequences), step `i` using
    /// `documents[i % documents.len()]`.
    ///
    /// # Errors
    ///
    /// - [`Error::Dimension`] when `documents` is empty.
    /// - Any error from [`train_step`]; the run stops at the failing step.
    pub fn run(&mut self, model: &Gpt, documents: &[Vec<usize>]) -> Result<Vec<StepStats>, Error> {
        if documents.is_empty() {
            return Err(DimensionError::Empty {
                context: "training documents",
            }
            .into());
        }
        info!(
            num_steps = self.num_steps,
            num_docs = documents.len(),
            num_params = model.num_parameters(),
            "training started"
        );
        let mut history = Vec::with_capacity(self.num_steps);
        for step in 0..self.num_steps {
            self.optimizer.set_learning_rate(self.schedule.rate(step));
            let doc = &documents[step % documents.len()];
            let stats = train_step(model, &mut self.optimizer, doc, &mut self.ctx, self.grad_clip)
                .inspect_err(|e| error!(step = step + 1, error = %e, "training step failed"))?;
            debug!(step = step + 1, grad_norm = stats.grad_norm, positions = stats.positions);
            if step == 0 || (step + 1) % self.loss_log_every == 0 {
                info!(
                    step = step + 1,
                    num_steps = self.num_steps,
                    loss = stats.loss,
                    lr = stats.learning_rate,
                    "step"
                );
            }
            history.push(stats);
        }
        Ok(history)
    }
}

impl Trainer<Adam> {
    /// Adam trainer with the learning rate, moments, clipping and step count from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let adam = Adam::new(config.learning_rate, config.beta1, config.beta2, config.epsilon);
        Trainer::new(
            adam,
            config.num_steps,
            config.loss_log_every,
            config.grad_clip,
            config.seed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GptConfig;
    use crate::optim::Sgd;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tiny_config() -> GptConfig {
        GptConfig {
            vocab_size: 4,
            block_size: 8,
            n_embed: 4,
            n_head: 1,
            n_layer: 2,
            dropout: 0.0,
            bias: true,
            init_std: 0.3,
        }
    }

    fn loss_on(model: &Gpt, tokens: &[usize]) -> f64 {
        let n = tokens.len() - 1;
        let logits = model.forward(&tokens[..n], &mut ForwardContext::eval()).unwrap();
        cross_entropy(&logits, &tokens[1..]).unwrap().data()
    }

    fn one_step_lowers_loss<O: Optimizer>(mut optimizer: O) {
        let model = Gpt::new(tiny_config(), &mut StdRng::seed_from_u64(42)).unwrap();
        let tokens = [1, 2, 3];
        let ids_before: Vec<_> = model.parameters().iter().map(|p| p.id()).collect();

        let before = loss_on(&model, &tokens);
        let stats = train_step(&model, &mut optimizer, &tokens, &mut ForwardContext::eval(), 0.0).unwrap();
        let after = loss_on(&model, &tokens);

        assert!((stats.loss - before).abs() < 1e-12);
        assert!(after < before, "loss went from {before} to {after}");
        let ids_after: Vec<_> = model.parameters().iter().map(|p| p.id()).collect();
        assert_eq!(ids_before, ids_after);
    }

    #[test]
    fn one_adam_step_lowers_loss_and_keeps_parameters() {
        one_step_lowers_loss(Adam::new(1e-3, 0.9, 0.999, 1e-8));
    }

    #[test]
    fn one_sgd_step_lowers_loss() {
        one_step_lowers_loss(Sgd::new(0.01));
    }

    #[test]
    fn long_documents_are_truncated_to_block_size() {
        let model = Gpt::new(GptConfig { block_size: 3, ..tiny_config() }, &mut StdRng::seed_from_u64(1)).unwrap();
        let mut sgd = Sgd::new(0.0);
        let stats = train_step(&model, &mut sgd, &[0, 1, 2, 3, 1, 0], &mut ForwardContext::eval(), 1.0).unwrap();
        assert_eq!(stats.positions, 3);
    }

    #[test]
    fn single_token_is_rejected() {
        let model = Gpt::new(tiny_config(), &mut StdRng::seed_from_u64(1)).unwrap();
        let result = train_step(&model, &mut Sgd::new(0.1), &[1], &mut ForwardContext::eval(), 1.0);
        assert!(matches!(result, Err(Error::Dimension(_))));
    }

    #[test]
    fn clipping_reports_the_unclipped_norm() {
        let model = Gpt::new(tiny_config(), &mut StdRng::seed_from_u64(5)).unwrap();
        let stats = train_step(&model, &mut Sgd::new(0.0), &[0, 1, 2, 0], &mut ForwardContext::eval(), 1e-6).unwrap();
        assert!(stats.grad_norm > 1e-6);
        let clipped = crate::optim::grad_norm(&model.parameters());
        assert!((clipped - 1e-6).abs() < 1e-12);
    }

    #[test]
    fn trainer_cycles_documents_with_decaying_rate() {
        let model = Gpt::new(tiny_config(), &mut StdRng::seed_from_u64(3)).unwrap();
        let docs = vec![vec![0, 1, 2, 0], vec![0, 3, 0]];
        let mut trainer = Trainer::new(Adam::new(0.01, 0.85, 0.99, 1e-8), 6, 2, 1.0, 9);
        let history = trainer.run(&model, &docs).unwrap();
        assert_eq!(history.len(), 6);
        assert_eq!(history[0].positions, 3);
        assert_eq!(history[1].positions, 2);
        assert_eq!(history[0].learning_rate, 0.01);
        assert!(history[5].learning_rate < history[1].learning_rate);
        assert!(history.iter().all(|s| s.loss.is_finite()));
        assert_eq!(trainer.optimizer().steps(), 6);
    }

    #[test]
    fn trainer_rejects_empty_corpus() {
        let model = Gpt::new(tiny_config(), &mut StdRng::seed_from_u64(3)).unwrap();
        let mut trainer = Trainer::new(Sgd::new(0.1), 3, 1, 0.0, 0);
        assert!(matches!(trainer.run(&model, &[]), Err(Error::Dimension(_))));
    }
}
