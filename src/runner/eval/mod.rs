//! Evaluation module for executing expression ASTs.
//!
//! This module contains the tree-walking evaluator, the per-node resolution
//! cache and the reusable compiled-expression entry point.

pub mod cache;
pub mod compiled;
pub mod expression;
pub mod types;

pub use compiled::CompiledExpression;
pub use types::{EvalState, ValueResult};
