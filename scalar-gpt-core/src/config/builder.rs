//! Build [`Config`] from environment variables.
//!
//! Every field can be overridden by `SCALAR_GPT_<FIELD>`; unset variables keep the
//! default. A variable that is set but unparsable is an error, never silently ignored.

use std::fmt::Display;
use std::str::FromStr;

use super::constants::{
    ENV_BETA1, ENV_BETA2, ENV_BIAS, ENV_BLOCK_SIZE, ENV_CHECKPOINT_PATH, ENV_DROPOUT, ENV_EPSILON,
    ENV_GRAD_CLIP, ENV_INIT_STD, ENV_INPUT_PATH, ENV_LEARNING_RATE, ENV_LOSS_LOG_EVERY,
    ENV_NUM_STEPS, ENV_N_EMBED, ENV_N_HEAD, ENV_N_LAYER, ENV_PREFIX, ENV_SAMPLE_SIZE, ENV_SEED,
    ENV_TEMPERATURE,
};
use super::{Config, ConfigError};

/// Full variable name for a key suffix (`SEED` → `SCALAR_GPT_SEED`).
#[must_use]
pub fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}{suffix}")
}

/// Reads a variable as a string; `Ok(None)` when unset.
///
/// # Errors
///
/// - [`ConfigError::EnvVar`] when the variable is set but not valid Unicode.
pub fn env_string(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(s) => Ok(Some(s)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::EnvVar {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Reads and parses a variable; `Ok(None)` when unset.
///
/// # Errors
///
/// - [`ConfigError::EnvVar`] as for [`env_string`].
/// - [`ConfigError::Parse`] when the value does not parse as `T` (e.g. `SEED=abc`).
pub fn env_parsed<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = env_string(key)? else {
        return Ok(None);
    };
    match raw.trim().parse::<T>() {
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(ConfigError::Parse {
            key: key.to_string(),
            value: raw,
            message: e.to_string(),
        }),
    }
}

/// Replaces `slot` with the parsed value of `SCALAR_GPT_<suffix>` if it is set.
fn override_from_env<T>(slot: &mut T, suffix: &str) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    if let Some(value) = env_parsed(&env_key(suffix))? {
        *slot = value;
    }
    Ok(())
}

/// Builds [`Config`] from [`Config::default`] plus any `SCALAR_GPT_*` overrides.
///
/// Does not validate; call [`Config::validate`] on the result.
///
/// # Errors
///
/// - [`ConfigError::Parse`] or [`ConfigError::EnvVar`] for the first bad variable.
pub fn from_env() -> Result<Config, ConfigError> {
    let mut cfg = Config::default();
    override_from_env(&mut cfg.seed, ENV_SEED)?;
    override_from_env(&mut cfg.input_path, ENV_INPUT_PATH)?;
    override_from_env(&mut cfg.checkpoint_path, ENV_CHECKPOINT_PATH)?;
    override_from_env(&mut cfg.n_embed, ENV_N_EMBED)?;
    override_from_env(&mut cfg.n_head, ENV_N_HEAD)?;
    override_from_env(&mut cfg.n_layer, ENV_N_LAYER)?;
    override_from_env(&mut cfg.block_size, ENV_BLOCK_SIZE)?;
    override_from_env(&mut cfg.dropout, ENV_DROPOUT)?;
    override_from_env(&mut cfg.bias, ENV_BIAS)?;
    override_from_env(&mut cfg.init_std, ENV_INIT_STD)?;
    override_from_env(&mut cfg.learning_rate, ENV_LEARNING_RATE)?;
    override_from_env(&mut cfg.beta1, ENV_BETA1)?;
    override_from_env(&mut cfg.beta2, ENV_BETA2)?;
    override_from_env(&mut cfg.epsilon, ENV_EPSILON)?;
    override_from_env(&mut cfg.grad_clip, ENV_GRAD_CLIP)?;
    override_from_env(&mut cfg.num_steps, ENV_NUM_STEPS)?;
    override_from_env(&mut cfg.loss_log_every, ENV_LOSS_LOG_EVERY)?;
    override_from_env(&mut cfg.temperature, ENV_TEMPERATURE)?;
    override_from_env(&mut cfg.sample_size, ENV_SAMPLE_SIZE)?;
    Ok(cfg)
}
