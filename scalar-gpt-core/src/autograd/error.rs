//! Errors produced while building or differentiating a computation graph.
//!
//! Numeric precondition violations ([`NumericError`]) and graph-structure violations
//! ([`GraphError`]) are both fatal to the current training step. [`AutogradError`] is what
//! [`backward`](super::ScalarNode::backward) returns, since a single pass can hit either.

use std::fmt;

/// Numeric precondition violations in the operator library or the backward pass.
///
/// # Variants
///
/// - **DivisionByZero**: `try_div` was called with a zero divisor.
///   *Recovery*: The current step is lost; check the data or add an epsilon to the divisor.
///
/// - **LogDomain**: `try_log` was called on a non-positive operand.
///   *Recovery*: The current step is lost; clamp or shift the operand before the log.
///
/// - **NonFiniteValue**: The root handed to `backward` carries NaN or ±∞.
///   *Recovery*: Find the forward operator that overflowed (usually an unchecked `/` or `log`).
///
/// - **NonFiniteGradient**: A local-derivative step produced NaN or ±∞.
///   *Recovery*: Lower the learning rate or inspect the named operator's operands.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericError {
    /// Division with a zero divisor.
    DivisionByZero {
        /// Forward value of the numerator.
        numerator: f64,
    },

    /// Natural log of a value `<= 0`.
    LogDomain {
        /// Forward value of the operand.
        operand: f64,
    },

    /// The backward root is not a finite number.
    NonFiniteValue {
        /// Operator that produced the root.
        op: &'static str,
        /// The offending forward value.
        value: f64,
    },

    /// A gradient contribution is not a finite number.
    NonFiniteGradient {
        /// Operator whose backward step produced the contribution.
        op: &'static str,
        /// The offending contribution.
        value: f64,
    },
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::DivisionByZero { numerator } => {
                write!(f, "numeric: division of {numerator} by zero")
            }
            NumericError::LogDomain { operand } => {
                write!(f, "numeric: log of non-positive value {operand}")
            }
            NumericError::NonFiniteValue { op, value } => {
                write!(f, "numeric: {op} produced non-finite value {value}")
            }
            NumericError::NonFiniteGradient { op, value } => {
                write!(f, "numeric: backward through {op} produced non-finite gradient {value}")
            }
        }
    }
}

impl std::error::Error for NumericError {}

/// Structural problems found while ordering the graph for backward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node was reached again while its own ancestors were still being visited.
    Cycle,

    /// The graph reachable from the root exceeds the node bound.
    TooLarge {
        /// The bound that was exceeded.
        limit: usize,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::Cycle => write!(f, "graph: cycle detected during topological sort"),
            GraphError::TooLarge { limit } => {
                write!(f, "graph: more than {limit} nodes reachable from the root")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Any failure of a backward pass.
#[derive(Debug, Clone, PartialEq)]
pub enum AutogradError {
    /// See [`NumericError`].
    Numeric(NumericError),
    /// See [`GraphError`].
    Graph(GraphError),
}

impl fmt::Display for AutogradError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutogradError::Numeric(e) => e.fmt(f),
            AutogradError::Graph(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for AutogradError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AutogradError::Numeric(e) => Some(e),
            AutogradError::Graph(e) => Some(e),
        }
    }
}

impl From<NumericError> for AutogradError {
    fn from(e: NumericError) -> Self {
        AutogradError::Numeric(e)
    }
}

impl From<GraphError> for AutogradError {
    fn from(e: GraphError) -> Self {
        AutogradError::Graph(e)
    }
}
