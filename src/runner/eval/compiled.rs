//! Reusable parsed expressions.

use std::fmt;

use crate::parser::ast::ExprNode;
use crate::runner::ds::error::EvalError;
use crate::runner::ds::value::{FromValue, Value, ValueType};
use crate::runner::plugin::types::EvalContext;

use super::cache::ResolutionCache;
use super::expression::{assign, evaluate_expression};
use super::types::{EvalState, ValueResult};

/// A parsed expression, evaluated any number of times against different
/// contexts.
///
/// The AST is immutable and the resolution cache is internally locked, so a
/// compiled expression can be shared across threads (for example in an
/// `Arc`) while each thread evaluates against its own context.
pub struct CompiledExpression {
    source: String,
    ast: ExprNode,
    cache: Option<ResolutionCache>,
}

impl CompiledExpression {
    pub fn new(source: impl Into<String>, ast: ExprNode, caching: bool) -> Self {
        CompiledExpression {
            source: source.into(),
            ast,
            cache: if caching { Some(ResolutionCache::new()) } else { None },
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &ExprNode {
        &self.ast
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    /// Number of remembered resolutions.
    pub fn cached_resolutions(&self) -> usize {
        self.cache.as_ref().map_or(0, ResolutionCache::len)
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    fn state<'a>(&'a self, ctx: &'a EvalContext) -> EvalState<'a> {
        let cache = if ctx.config().resolution_cache {
            self.cache.as_ref()
        } else {
            None
        };
        EvalState::new(ctx, cache)
    }

    /// Evaluate against `ctx`.
    #[tracing::instrument(level = "debug", skip(self, ctx), fields(expression = %self.source))]
    pub fn get_value(&self, ctx: &EvalContext) -> ValueResult {
        let mut state = self.state(ctx);
        evaluate_expression(&self.ast, &mut state)
    }

    /// Evaluate and coerce the result to `expected`.
    pub fn get_typed_value(&self, ctx: &EvalContext, expected: &ValueType) -> ValueResult {
        let value = self.get_value(ctx)?;
        ctx.type_converter().convert(value, expected)
    }

    /// Evaluate and extract the result as a Rust value.
    pub fn get_value_as<T: FromValue>(&self, ctx: &EvalContext) -> Result<T, EvalError> {
        let expected = T::value_type();
        let value = self.get_typed_value(ctx, &expected)?;
        T::from_value(value).ok_or_else(|| {
            EvalError::TypeMismatch(format!("result cannot be extracted as {}", expected))
        })
    }

    /// Treat the expression as an assignment target and write `value` to it.
    pub fn set_value(&self, ctx: &EvalContext, value: impl Into<Value>) -> Result<(), EvalError> {
        let mut state = self.state(ctx);
        assign(&self.ast, value.into(), &mut state)
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("source", &self.source)
            .field("caching", &self.is_caching())
            .finish()
    }
}
