//! Autoregressive sampling from a trained model.

use rand::rngs::StdRng;
use rand_distr::weighted::WeightedIndex;
use rand_distr::Distribution;
use tracing::warn;

use crate::autograd::ScalarNode;
use crate::config::ConfigError;
use crate::model::Gpt;
use crate::nn::ForwardContext;
use crate::Error;

/// Temperature-scaled softmax over plain logit values.
///
/// Lower temperatures sharpen the distribution. `temperature` must be positive.
#[must_use]
pub fn probabilities(logits: &[f64], temperature: f64) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| ((l - max) / temperature).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Rejects temperatures that make [`probabilities`] undefined.
fn check_temperature(temperature: f64) -> Result<(), ConfigError> {
    ConfigError::check_range("temperature", temperature, "(0, inf)", |t| {
        t.is_finite() && t > 0.0
    })
}

/// Samples the id following `context`, conditioning on at most the last `block_size` ids.
///
/// Falls back to `fallback` if the distribution is degenerate (e.g. NaN logits).
///
/// # Errors
///
/// - [`Error::Config`] when `temperature` is not positive.
/// - [`Error::Dimension`] when `context` is empty or holds an id outside the vocabulary.
pub fn next_token(
    model: &Gpt,
    context: &[usize],
    temperature: f64,
    fallback: usize,
    rng: &mut StdRng,
) -> Result<usize, Error> {
    check_temperature(temperature)?;
    let start = context.len().saturating_sub(model.block_size());
    let window = &context[start..];
    let logits = model.forward(window, &mut ForwardContext::eval())?;
    let last: Vec<f64> = logits.row(logits.rows() - 1).iter().map(ScalarNode::data).collect();
    let probs = probabilities(&last, temperature);
    match WeightedIndex::new(&probs) {
        Ok(dist) => Ok(dist.sample(rng)),
        Err(e) => {
            warn!(error = %e, "degenerate next-token distribution");
            Ok(fallback)
        }
    }
}

/// Generates up to `max_len` ids starting from BOS, stopping early when BOS is sampled.
///
/// The returned ids exclude BOS.
///
/// # Errors
///
/// - [`Error::Config`] when `temperature` is not positive.
/// - Any error from [`next_token`].
pub fn generate(
    model: &Gpt,
    bos: usize,
    max_len: usize,
    temperature: f64,
    rng: &mut StdRng,
) -> Result<Vec<usize>, Error> {
    check_temperature(temperature)?;
    let mut context = vec![bos];
    for _ in 0..max_len {
        let id = next_token(model, &context, temperature, bos, rng)?;
        if id == bos {
            break;
        }
        context.push(id);
    }
    Ok(context.split_off(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GptConfig;
    use rand::SeedableRng;

    fn model() -> Gpt {
        let config = GptConfig {
            vocab_size: 6,
            block_size: 3,
            n_embed: 4,
            n_head: 2,
            n_layer: 1,
            dropout: 0.0,
            bias: true,
            init_std: 0.5,
        };
        Gpt::new(config, &mut StdRng::seed_from_u64(10)).unwrap()
    }

    #[test]
    fn probabilities_sum_to_one_and_sharpen() {
        let logits = [1.0, 2.0, 3.0];
        let warm = probabilities(&logits, 1.0);
        let cold = probabilities(&logits, 0.5);
        assert!((warm.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((cold.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(cold[2] > warm[2]);
        assert!(cold[0] < warm[0]);
    }

    #[test]
    fn same_seed_same_sample() {
        let gpt = model();
        let a = generate(&gpt, 0, 10, 1.0, &mut StdRng::seed_from_u64(4)).unwrap();
        let b = generate(&gpt, 0, 10, 1.0, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(a, b);
        assert!(a.len() <= 10);
        assert!(a.iter().all(|&id| id != 0 && id < 6));
    }

    #[test]
    fn context_longer_than_block_is_windowed() {
        let gpt = model();
        let id = next_token(&gpt, &[0, 1, 2, 3, 4, 5, 1], 1.0, 0, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(id < 6);
    }

    #[test]
    fn non_positive_temperature_is_rejected() {
        let gpt = model();
        assert!(matches!(
            generate(&gpt, 0, 5, 0.0, &mut StdRng::seed_from_u64(1)),
            Err(Error::Config(_))
        ));
        for t in [0.0, -0.5, f64::NAN] {
            assert!(
                matches!(
                    next_token(&gpt, &[0, 1], t, 0, &mut StdRng::seed_from_u64(1)),
                    Err(Error::Config(ConfigError::OutOfRange { field: "temperature", .. }))
                ),
                "temperature {t} should be rejected"
            );
        }
        assert!(matches!(
            generate(&gpt, 0, 0, 0.0, &mut StdRng::seed_from_u64(1)),
            Err(Error::Config(_))
        ));
    }
}
