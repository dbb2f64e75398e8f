//! Checkpoint errors.

use std::fmt;

/// Errors produced when saving, loading or restoring a checkpoint.
///
/// # Variants
///
/// - **Io**: The checkpoint file could not be read or written.
/// - **Json**: The file is not a valid checkpoint document.
/// - **ParameterCount**: The stored values do not match the parameter count of a model
///   built from the stored config (file edited by hand, or written by an incompatible
///   layout).
#[derive(Debug)]
pub enum CheckpointError {
    /// I/O error on the checkpoint path.
    Io(std::io::Error),

    /// (De)serialization failed.
    Json(serde_json::Error),

    /// Wrong number of parameter values.
    ParameterCount {
        /// Parameters in the model built from the stored config.
        expected: usize,
        /// Values stored in the checkpoint.
        actual: usize,
    },
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Io(e) => write!(f, "checkpoint io: {e}"),
            CheckpointError::Json(e) => write!(f, "checkpoint format: {e}"),
            CheckpointError::ParameterCount { expected, actual } => write!(
                f,
                "checkpoint: model has {expected} parameters, checkpoint stores {actual}"
            ),
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckpointError::Io(e) => Some(e),
            CheckpointError::Json(e) => Some(e),
            CheckpointError::ParameterCount { .. } => None,
        }
    }
}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        CheckpointError::Io(e)
    }
}

impl From<serde_json::Error> for CheckpointError {
    fn from(e: serde_json::Error) -> Self {
        CheckpointError::Json(e)
    }
}
