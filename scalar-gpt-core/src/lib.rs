//! # scalar-gpt-core
//!
//! A reverse-mode automatic differentiation engine over scalar nodes, and a small
//! GPT-style transformer composed entirely from it.
//!
//! - [`autograd`]: the node type, operators, and the backward pass.
//! - [`tensor`] and [`nn`]: matrix views and layers whose forward passes only compose
//!   autograd operators.
//! - [`model`]: the transformer and its cross-entropy objective.
//! - [`optim`], [`train`], [`sample`], [`checkpoint`]: what it takes to train, sample and
//!   persist a model.
//! - [`config`], [`data`], [`tokenizer`]: environment configuration and corpus handling.

pub mod autograd;
pub mod checkpoint;
pub mod config;
pub mod data;
mod error;
pub mod model;
pub mod nn;
pub mod optim;
pub mod sample;
pub mod tensor;
pub mod tokenizer;
pub mod train;

pub use error::Error;
