//! Autograd: a scalar computation graph with reverse-mode differentiation.
//!
//! The graph is built implicitly while operators run: every operator allocates a new
//! [`ValueRef`] that remembers its operands and an [`Op`] tag. [`ScalarNode::backward`]
//! orders the graph reachable from a root (usually the loss) topologically and applies
//! each node's local derivative in reverse order, so every node receives the sum of the
//! contributions of all its consumers before it propagates further.
//!
//! Nonlinearities other than the primitive set (`+ * / pow relu exp log`) are built
//! as compositions and need no backward code of their own.

mod engine;
mod error;
mod functions;
pub mod impls;

pub use engine::{topological_order, zero_grad, DEFAULT_MAX_GRAPH_NODES};
pub use error::{AutogradError, GraphError, NumericError};
pub use functions::{log_softmax, softmax, sum};
pub use impls::scalar::{NodeId, Op, ValueRef};

/// Trait for raising a node to a constant power (e.g. `(&a).pow(2.0)`).
pub trait Pow<Rhs> {
    /// Result of the power operation.
    type Output;

    /// Returns `self^exp` with gradient tracking.
    #[must_use]
    fn pow(self, exp: Rhs) -> Self::Output;
}

/// Trait for the exponential of a node (e.g. `(&a).exp()`).
pub trait Exp {
    /// Result of the exponential.
    type Output;

    /// Returns `exp(self)` with gradient tracking.
    #[must_use]
    fn exp(self) -> Self::Output;
}

/// Trait for the natural log of a node (e.g. `(&a).log()`).
///
/// The operand must be positive. Use [`ValueRef::try_log`] where that is not guaranteed.
pub trait Log {
    /// Result of the log.
    type Output;

    /// Returns `ln(self)` with gradient tracking.
    #[must_use]
    fn log(self) -> Self::Output;
}

/// A differentiable scalar node in the computation graph.
///
/// Use [`ScalarNode::data`] for the forward value and [`ScalarNode::grad`] after
/// [`ScalarNode::backward`].
pub trait ScalarNode: Clone {
    /// Returns the forward pass value.
    fn data(&self) -> f64;

    /// Returns the gradient of the last backward root with respect to this node.
    fn grad(&self) -> f64;

    /// Runs backpropagation from this node to every ancestor.
    ///
    /// Seeds this node with gradient 1. Leaf gradients, including a leaf root's, accumulate
    /// across calls until [`ScalarNode::zero_grad`]; interior gradients are recomputed
    /// each pass.
    ///
    /// # Errors
    ///
    /// - [`AutogradError::Graph`] if the graph is cyclic or exceeds [`DEFAULT_MAX_GRAPH_NODES`].
    /// - [`AutogradError::Numeric`] if this node or any gradient contribution is not finite.
    fn backward(&self) -> Result<(), AutogradError>;

    /// Zeros the gradient at this node (e.g. after an optimizer step).
    fn zero_grad(&self);
}
