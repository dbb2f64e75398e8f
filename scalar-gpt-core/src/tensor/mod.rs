//! Tensor-shaped views over scalar nodes.
//!
//! [`Matrix`] is a row-major grid of [`ValueRef`](crate::autograd::ValueRef)s. It has no
//! autodiff semantics of its own: every element is an ordinary graph node, so whatever
//! is computed from a matrix is differentiated by the scalar engine.

mod error;
mod matrix;

pub use error::DimensionError;
pub(crate) use error::ensure_len;
pub use matrix::Matrix;

/// A sequence of `T` vectors of width `D` (one row per position).
pub type Sequence = Matrix;

/// Per-position scores over the vocabulary (`T × vocab_size`).
pub type Logits = Matrix;
