//! Configuration errors.

use std::fmt;

/// A configuration value that cannot build, train or sample a model.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A model size is zero or the sizes do not fit together (heads must split `n_embed`).
    Shape(String),

    /// A real-valued setting outside its allowed interval, e.g. `dropout = 1.0`.
    OutOfRange {
        /// Setting name as it appears in [`Config`](super::Config).
        field: &'static str,
        /// Rejected value.
        value: f64,
        /// Allowed interval in interval notation.
        range: &'static str,
    },

    /// A `SCALAR_GPT_*` variable is set but not valid Unicode.
    EnvVar { key: String, message: String },

    /// A `SCALAR_GPT_*` variable does not parse as its field's type.
    Parse {
        key: String,
        value: String,
        message: String,
    },
}

impl ConfigError {
    /// Checks `accept(value)` and reports `field` as out of `range` otherwise.
    pub(crate) fn check_range(
        field: &'static str,
        value: f64,
        range: &'static str,
        accept: impl FnOnce(f64) -> bool,
    ) -> Result<(), ConfigError> {
        if accept(value) {
            Ok(())
        } else {
            Err(ConfigError::OutOfRange {
                field,
                value,
                range,
            })
        }
    }

    /// Setting or variable the error is about.
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            ConfigError::Shape(_) => "model shape",
            ConfigError::OutOfRange { field, .. } => field,
            ConfigError::EnvVar { key, .. } | ConfigError::Parse { key, .. } => key,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Shape(m) => write!(f, "config shape: {m}"),
            ConfigError::OutOfRange {
                field,
                value,
                range,
            } => write!(f, "config: {field} = {value} is outside {range}"),
            ConfigError::EnvVar { key, message } => write!(f, "env var {key}: {message}"),
            ConfigError::Parse {
                key,
                value,
                message,
            } => write!(f, "env var {key}={value:?}: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}
