//! Backward pass: topological ordering of the graph and reverse application of local derivatives.

use std::collections::HashMap;

use tracing::{debug, error};

use crate::autograd::{AutogradError, GraphError, NodeId, NumericError, ScalarNode, ValueRef};

/// Upper bound on nodes reachable from a backward root.
///
/// A full training step on the default configuration stays well below this; hitting it
/// means a runaway graph (e.g. nodes reused across steps without being rebuilt).
pub const DEFAULT_MAX_GRAPH_NODES: usize = 50_000_000;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the DFS stack: its ancestors are still being visited.
    Open,
    /// Appended to the order.
    Done,
}

/// Returns every node reachable from `root`, each exactly once, parents before children.
///
/// Iterative post-order DFS keyed on node identity, so diamonds (a node feeding several
/// consumers) are appended once and deep graphs do not exhaust the call stack.
///
/// # Errors
///
/// - [`GraphError::Cycle`] if a node is reachable from itself.
/// - [`GraphError::TooLarge`] if more than `limit` nodes are reachable.
pub fn topological_order(root: &ValueRef, limit: usize) -> Result<Vec<ValueRef>, GraphError> {
    let mut marks: HashMap<NodeId, Mark> = HashMap::new();
    let mut order = Vec::new();
    // (node, its parents, index of the next parent to visit)
    let mut stack: Vec<(ValueRef, Vec<ValueRef>, usize)> = Vec::new();

    marks.insert(root.id(), Mark::Open);
    stack.push((root.clone(), root.parents(), 0));

    while let Some((_, parents, next)) = stack.last_mut() {
        if let Some(parent) = parents.get(*next).cloned() {
            *next += 1;
            match marks.get(&parent.id()) {
                Some(Mark::Done) => {}
                Some(Mark::Open) => return Err(GraphError::Cycle),
                None => {
                    marks.insert(parent.id(), Mark::Open);
                    if marks.len() > limit {
                        return Err(GraphError::TooLarge { limit });
                    }
                    let grandparents = parent.parents();
                    stack.push((parent, grandparents, 0));
                }
            }
        } else if let Some((node, _, _)) = stack.pop() {
            marks.insert(node.id(), Mark::Done);
            order.push(node);
        }
    }
    Ok(order)
}

/// Adds 1 to the gradient of `root` and propagates to every ancestor in reverse topological order.
///
/// Interior nodes of this graph are reset before propagation, so repeating a pass over a
/// static graph gives the same interior gradients. Leaves (parameters, inputs, constants)
/// accumulate until [`zero_grad`].
pub(crate) fn backward(root: &ValueRef, limit: usize) -> Result<(), AutogradError> {
    let value = root.data();
    if !value.is_finite() {
        let op = root.op().name();
        error!(op, value, "backward root is not finite");
        return Err(NumericError::NonFiniteValue { op, value }.into());
    }

    let order = topological_order(root, limit)?;
    for node in order.iter().filter(|n| !n.is_leaf()) {
        node.set_grad(0.0);
    }
    // Interior roots were just reset; a leaf root accumulates like any other leaf.
    root.add_grad(1.0);

    for node in order.iter().rev() {
        node.backward_step()?;
    }
    debug!(nodes = order.len(), "backward pass complete");
    Ok(())
}

/// Sets the gradient of every node in `params` to 0. Required before each new backward pass.
pub fn zero_grad(params: &[ValueRef]) {
    for p in params {
        p.zero_grad();
    }
}
