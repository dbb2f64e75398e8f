//! Scalar autograd: graph nodes holding one float each, plus the primitive operators.

use std::cell::RefCell;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

use tracing::error;

use crate::autograd::engine;
use crate::autograd::{AutogradError, Exp, Log, NumericError, Pow, ScalarNode};

/// Identity of a node: two nodes with equal data are still distinct.
///
/// Stable for as long as the node is alive, which makes it usable as a key for
/// per-parameter state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// The primitive that produced a node. Drives the local derivative in backward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Op {
    /// Parameter, input or constant; nothing to propagate.
    Leaf,
    /// `a + b`
    Add,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// `a^k` for a constant `k`.
    Pow(f64),
    /// `max(0, a)`
    Relu,
    /// `e^a`
    Exp,
    /// `ln(a)`
    Log,
}

impl Op {
    /// Short operator name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Op::Leaf => "leaf",
            Op::Add => "add",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Pow(_) => "pow",
            Op::Relu => "relu",
            Op::Exp => "exp",
            Op::Log => "log",
        }
    }
}

/// Internal scalar node: forward value, gradient, and graph edges for backprop.
struct Value {
    /// Forward pass value.
    data: f64,
    /// Gradient of the current backward root with respect to this node.
    grad: f64,
    /// Primitive that produced this node.
    op: Op,
    /// Operands of `op`, in operand order.
    parents: Vec<ValueRef>,
}

impl Drop for Value {
    /// Frees ancestors with an explicit stack. The default drop recurses once per graph
    /// level, which overflows on long chains such as a `sum` over many nodes.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.parents);
        while let Some(parent) = pending.pop() {
            // Only the last handle to a node takes over its parents.
            if let Ok(cell) = Rc::try_unwrap(parent.0) {
                let mut value = cell.into_inner();
                pending.append(&mut value.parents);
            }
        }
    }
}

/// Handle to a scalar node in the autograd computation graph.
///
/// Wraps the node state in `Rc<RefCell<_>>` so that one node can feed many consumers
/// and gradients can be accumulated during backward. The handle is deliberately
/// `!Send`: a graph and its gradient accumulators belong to one thread.
#[derive(Clone)]
pub struct ValueRef(Rc<RefCell<Value>>);

impl ValueRef {
    /// Creates a leaf node (no parents) with the given value and zero gradient.
    #[must_use]
    pub fn new(data: f64) -> Self {
        Self::from_op(data, Op::Leaf, Vec::new())
    }

    fn from_op(data: f64, op: Op, parents: Vec<ValueRef>) -> Self {
        ValueRef(Rc::new(RefCell::new(Value {
            data,
            grad: 0.0,
            op,
            parents,
        })))
    }

    /// Identity of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.0) as usize)
    }

    /// Primitive that produced this node.
    #[must_use]
    pub fn op(&self) -> Op {
        self.0.borrow().op
    }

    /// Returns `true` for parameters, inputs and constants.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.0.borrow().parents.is_empty()
    }

    /// Direct inputs of this node.
    #[must_use]
    pub fn parents(&self) -> Vec<ValueRef> {
        self.0.borrow().parents.clone()
    }

    /// Overwrites the forward value. Meant for optimizers and checkpoint loading on leaves;
    /// nodes already computed from this one are not recomputed.
    pub fn set_data(&self, data: f64) {
        self.0.borrow_mut().data = data;
    }

    pub(crate) fn set_grad(&self, g: f64) {
        self.0.borrow_mut().grad = g;
    }

    pub(crate) fn add_grad(&self, g: f64) {
        self.0.borrow_mut().grad += g;
    }

    /// ReLU: `max(0, self)`. Local grad is 1 if the output is positive, else 0 (also at 0).
    #[must_use]
    pub fn relu(&self) -> ValueRef {
        ValueRef::from_op(self.data().max(0.0), Op::Relu, vec![self.clone()])
    }

    /// Division that refuses a zero divisor instead of producing ±∞ or NaN.
    ///
    /// # Errors
    ///
    /// - [`NumericError::DivisionByZero`] when `rhs` is zero.
    pub fn try_div(&self, rhs: &ValueRef) -> Result<ValueRef, NumericError> {
        let divisor = rhs.data();
        if divisor == 0.0 {
            let numerator = self.data();
            error!(op = "div", numerator, divisor, "division by zero");
            return Err(NumericError::DivisionByZero { numerator });
        }
        Ok(self / rhs)
    }

    /// Natural log that refuses non-positive (or NaN) operands.
    ///
    /// # Errors
    ///
    /// - [`NumericError::LogDomain`] when `self <= 0` or is NaN.
    pub fn try_log(&self) -> Result<ValueRef, NumericError> {
        let operand = self.data();
        if operand.is_nan() || operand <= 0.0 {
            error!(op = "log", operand, "log of non-positive value");
            return Err(NumericError::LogDomain { operand });
        }
        Ok(self.log())
    }

    /// Runs backpropagation with a custom bound on the number of reachable nodes.
    ///
    /// # Errors
    ///
    /// See [`ScalarNode::backward`].
    pub fn backward_with_limit(&self, limit: usize) -> Result<(), AutogradError> {
        engine::backward(self, limit)
    }

    /// Applies this node's local derivatives: `parent.grad += local * self.grad`.
    ///
    /// Reads only the parents' forward values, this node's forward value and this node's
    /// gradient, so it can run at any time after all consumers have run.
    pub(crate) fn backward_step(&self) -> Result<(), NumericError> {
        let node = self.0.borrow();
        let upstream = node.grad;
        // No upstream dependence: skipping also avoids 0 * inf at saturated operands.
        if node.parents.is_empty() || upstream == 0.0 {
            return Ok(());
        }
        let operand = |i: usize| node.parents[i].data();
        let locals: [f64; 2] = match node.op {
            Op::Leaf => return Ok(()),
            Op::Add => [1.0, 1.0],
            Op::Mul => [operand(1), operand(0)],
            Op::Div => {
                let (a, b) = (operand(0), operand(1));
                [1.0 / b, -a / (b * b)]
            }
            Op::Pow(k) => [k * operand(0).powf(k - 1.0), 0.0],
            Op::Relu => [if node.data > 0.0 { 1.0 } else { 0.0 }, 0.0],
            Op::Exp => [node.data, 0.0],
            Op::Log => [1.0 / operand(0), 0.0],
        };
        for (parent, local) in node.parents.iter().zip(locals) {
            let contribution = local * upstream;
            if !contribution.is_finite() {
                let op = node.op.name();
                error!(op, local, upstream, "non-finite gradient contribution");
                return Err(NumericError::NonFiniteGradient {
                    op,
                    value: contribution,
                });
            }
            parent.add_grad(contribution);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn push_parent_for_test(&self, parent: &ValueRef) {
        self.0.borrow_mut().parents.push(parent.clone());
    }
}

impl fmt::Debug for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0.borrow();
        f.debug_struct("ValueRef")
            .field("data", &node.data)
            .field("grad", &node.grad)
            .field("op", &node.op)
            .field("parents", &node.parents.len())
            .finish()
    }
}

impl From<f64> for ValueRef {
    fn from(data: f64) -> Self {
        ValueRef::new(data)
    }
}

// -----------------------------------------------------------------------------
// std::ops — algebra: x + y, x - y, x * y, x / y, -x
// -----------------------------------------------------------------------------

impl Add for &ValueRef {
    type Output = ValueRef;

    fn add(self, rhs: Self) -> ValueRef {
        ValueRef::from_op(
            self.data() + rhs.data(),
            Op::Add,
            vec![self.clone(), rhs.clone()],
        )
    }
}

impl Mul for &ValueRef {
    type Output = ValueRef;

    fn mul(self, rhs: Self) -> ValueRef {
        ValueRef::from_op(
            self.data() * rhs.data(),
            Op::Mul,
            vec![self.clone(), rhs.clone()],
        )
    }
}

/// Unchecked: a zero divisor yields ±∞ or NaN. See [`ValueRef::try_div`].
impl Div for &ValueRef {
    type Output = ValueRef;

    fn div(self, rhs: Self) -> ValueRef {
        ValueRef::from_op(
            self.data() / rhs.data(),
            Op::Div,
            vec![self.clone(), rhs.clone()],
        )
    }
}

impl Sub for &ValueRef {
    type Output = ValueRef;

    fn sub(self, rhs: Self) -> ValueRef {
        self + &(-rhs)
    }
}

impl Neg for &ValueRef {
    type Output = ValueRef;

    fn neg(self) -> ValueRef {
        self * -1.0
    }
}

impl Neg for ValueRef {
    type Output = ValueRef;

    fn neg(self) -> ValueRef {
        -&self
    }
}

/// Owned and literal operand combinations, all routed through the `&ValueRef` impls.
/// Literals become constant leaves whose gradient is computed but never read.
macro_rules! forward_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<ValueRef> for ValueRef {
            type Output = ValueRef;

            fn $method(self, rhs: ValueRef) -> ValueRef {
                <&ValueRef as $imp<&ValueRef>>::$method(&self, &rhs)
            }
        }

        impl $imp<&ValueRef> for ValueRef {
            type Output = ValueRef;

            fn $method(self, rhs: &ValueRef) -> ValueRef {
                <&ValueRef as $imp<&ValueRef>>::$method(&self, rhs)
            }
        }

        impl $imp<ValueRef> for &ValueRef {
            type Output = ValueRef;

            fn $method(self, rhs: ValueRef) -> ValueRef {
                <&ValueRef as $imp<&ValueRef>>::$method(self, &rhs)
            }
        }

        impl $imp<f64> for &ValueRef {
            type Output = ValueRef;

            fn $method(self, rhs: f64) -> ValueRef {
                <&ValueRef as $imp<&ValueRef>>::$method(self, &ValueRef::new(rhs))
            }
        }

        impl $imp<f64> for ValueRef {
            type Output = ValueRef;

            fn $method(self, rhs: f64) -> ValueRef {
                <&ValueRef as $imp<&ValueRef>>::$method(&self, &ValueRef::new(rhs))
            }
        }

        impl $imp<&ValueRef> for f64 {
            type Output = ValueRef;

            fn $method(self, rhs: &ValueRef) -> ValueRef {
                <&ValueRef as $imp<&ValueRef>>::$method(&ValueRef::new(self), rhs)
            }
        }

        impl $imp<ValueRef> for f64 {
            type Output = ValueRef;

            fn $method(self, rhs: ValueRef) -> ValueRef {
                <&ValueRef as $imp<&ValueRef>>::$method(&ValueRef::new(self), &rhs)
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);
forward_binop!(Div, div);

impl Sum<ValueRef> for ValueRef {
    fn sum<I: Iterator<Item = ValueRef>>(mut iter: I) -> ValueRef {
        match iter.next() {
            Some(first) => iter.fold(first, |acc, v| &acc + &v),
            None => ValueRef::new(0.0),
        }
    }
}

impl<'a> Sum<&'a ValueRef> for ValueRef {
    fn sum<I: Iterator<Item = &'a ValueRef>>(mut iter: I) -> ValueRef {
        match iter.next() {
            Some(first) => iter.fold(first.clone(), |acc, v| &acc + v),
            None => ValueRef::new(0.0),
        }
    }
}

// -----------------------------------------------------------------------------
// Pow, Exp, Log — (&a).pow(exp), (&a).exp(), (&a).log()
// -----------------------------------------------------------------------------

impl Pow<f64> for &ValueRef {
    type Output = ValueRef;

    fn pow(self, exp: f64) -> ValueRef {
        ValueRef::from_op(self.data().powf(exp), Op::Pow(exp), vec![self.clone()])
    }
}

impl Pow<f64> for ValueRef {
    type Output = ValueRef;

    fn pow(self, exp: f64) -> ValueRef {
        (&self).pow(exp)
    }
}

impl Exp for &ValueRef {
    type Output = ValueRef;

    fn exp(self) -> ValueRef {
        ValueRef::from_op(self.data().exp(), Op::Exp, vec![self.clone()])
    }
}

impl Exp for ValueRef {
    type Output = ValueRef;

    fn exp(self) -> ValueRef {
        (&self).exp()
    }
}

impl Log for &ValueRef {
    type Output = ValueRef;

    fn log(self) -> ValueRef {
        ValueRef::from_op(self.data().ln(), Op::Log, vec![self.clone()])
    }
}

impl Log for ValueRef {
    type Output = ValueRef;

    fn log(self) -> ValueRef {
        (&self).log()
    }
}

impl ScalarNode for ValueRef {
    fn data(&self) -> f64 {
        self.0.borrow().data
    }

    fn grad(&self) -> f64 {
        self.0.borrow().grad
    }

    fn backward(&self) -> Result<(), AutogradError> {
        engine::backward(self, engine::DEFAULT_MAX_GRAPH_NODES)
    }

    fn zero_grad(&self) {
        self.set_grad(0.0);
    }
}
