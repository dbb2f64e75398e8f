//! Crate-level error.
//!
//! Each module has its own error enum; [`Error`] wraps them so the training pipeline can
//! use `?` across module boundaries and still match on the failing layer.

use std::fmt;

use crate::autograd::{AutogradError, GraphError, NumericError};
use crate::checkpoint::CheckpointError;
use crate::config::ConfigError;
use crate::data::DataError;
use crate::tensor::DimensionError;
use crate::tokenizer::TokenizerError;

/// Any error produced by this crate.
#[derive(Debug)]
pub enum Error {
    /// Invalid or unreadable configuration.
    Config(ConfigError),
    /// Corpus loading failed.
    Data(DataError),
    /// Text could not be encoded or ids decoded.
    Tokenizer(TokenizerError),
    /// Numeric precondition violation or malformed graph during forward/backward.
    Autograd(AutogradError),
    /// Shape mismatch at a module boundary.
    Dimension(DimensionError),
    /// Checkpoint read/write or shape mismatch.
    Checkpoint(CheckpointError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => e.fmt(f),
            Error::Data(e) => e.fmt(f),
            Error::Tokenizer(e) => e.fmt(f),
            Error::Autograd(e) => e.fmt(f),
            Error::Dimension(e) => e.fmt(f),
            Error::Checkpoint(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Data(e) => Some(e),
            Error::Tokenizer(e) => Some(e),
            Error::Autograd(e) => Some(e),
            Error::Dimension(e) => Some(e),
            Error::Checkpoint(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DataError> for Error {
    fn from(e: DataError) -> Self {
        Error::Data(e)
    }
}

impl From<TokenizerError> for Error {
    fn from(e: TokenizerError) -> Self {
        Error::Tokenizer(e)
    }
}

impl From<AutogradError> for Error {
    fn from(e: AutogradError) -> Self {
        Error::Autograd(e)
    }
}

impl From<NumericError> for Error {
    fn from(e: NumericError) -> Self {
        Error::Autograd(AutogradError::Numeric(e))
    }
}

impl From<GraphError> for Error {
    fn from(e: GraphError) -> Self {
        Error::Autograd(AutogradError::Graph(e))
    }
}

impl From<DimensionError> for Error {
    fn from(e: DimensionError) -> Self {
        Error::Dimension(e)
    }
}

impl From<CheckpointError> for Error {
    fn from(e: CheckpointError) -> Self {
        Error::Checkpoint(e)
    }
}
