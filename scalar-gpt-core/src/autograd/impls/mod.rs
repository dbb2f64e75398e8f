//! Node implementation and the operator library.
//!
//! [`scalar`] holds the node type and the primitives with their local derivatives;
//! [`composite`] adds nonlinearities expressed purely through those primitives.

mod composite;
pub mod scalar;
