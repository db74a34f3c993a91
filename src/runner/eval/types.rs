//! Core types for the evaluation engine.

use crate::runner::ds::error::EvalError;
use crate::runner::ds::value::Value;
use crate::runner::plugin::types::EvalContext;

use super::cache::ResolutionCache;

/// Result of evaluating an expression.
pub type ValueResult = Result<Value, EvalError>;

/// State threaded through one evaluation.
///
/// The active object is what unqualified property and method names resolve
/// against. It starts as the root object, moves along compound paths and is
/// reset to the root while method arguments are evaluated.
pub struct EvalState<'a> {
    pub ctx: &'a EvalContext,
    pub cache: Option<&'a ResolutionCache>,
    active: Vec<Value>,
}

impl<'a> EvalState<'a> {
    pub fn new(ctx: &'a EvalContext, cache: Option<&'a ResolutionCache>) -> Self {
        EvalState {
            ctx,
            cache,
            active: vec![ctx.root_object().clone()],
        }
    }

    pub fn active_object(&self) -> &Value {
        self.active.last().unwrap_or_else(|| self.ctx.root_object())
    }

    /// Evaluate `f` with `value` as the active object.
    pub fn with_active<T>(&mut self, value: Value, f: impl FnOnce(&mut Self) -> T) -> T {
        self.active.push(value);
        let out = f(self);
        self.active.pop();
        out
    }
}
