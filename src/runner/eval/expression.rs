//! Expression evaluation.
//!
//! Tree-recursive, single pass. Every property and method node is resolved
//! through the context's resolver chains; once a chain commits to a resolver,
//! its failures are final.

use tracing::trace;

use crate::parser::ast::{BinaryOperator, ExprKind, ExprNode, UnaryOperator};
use crate::runner::ds::error::EvalError;
use crate::runner::ds::operations::test_and_comparison::{
    arithmetic, compare, loosely_equal, negate, truth_value, ArithmeticOp,
};
use crate::runner::ds::operations::type_conversion::convert_arguments;
use crate::runner::ds::value::{Value, ValueType};

use super::cache::{AccessKind, CacheKey};
use super::types::{EvalState, ValueResult};

const VAR_ROOT: &str = "root";
const VAR_THIS: &str = "this";

/// Evaluate an expression and return its value.
pub fn evaluate_expression(node: &ExprNode, state: &mut EvalState) -> ValueResult {
    match &node.kind {
        ExprKind::Literal(lit) => Ok(lit.to_value()),

        ExprKind::VariableReference(name) => evaluate_variable(name, state),

        ExprKind::PropertyOrFieldReference(name) => {
            let target = state.active_object().clone();
            read_property(node, name, &target, state)
        }

        ExprKind::MethodCall { name, args } => {
            let target = state.active_object().clone();
            call_method(node, name, args, &target, state)
        }

        ExprKind::CompoundPath(segments) => evaluate_compound_path(segments, state),

        ExprKind::BinaryOp { op, left, right } => evaluate_binary_expression(*op, left, right, state),

        ExprKind::UnaryOp { op, operand } => evaluate_unary_expression(*op, operand, state),

        ExprKind::Ternary {
            condition,
            if_true,
            if_false,
        } => {
            let test = evaluate_expression(condition, state)?;
            if truth_value("?:", &test)? {
                evaluate_expression(if_true, state)
            } else {
                evaluate_expression(if_false, state)
            }
        }

        ExprKind::InlineList(items) => Ok(Value::List(
            items
                .iter()
                .map(|item| evaluate_expression(item, state))
                .collect::<Result<Vec<_>, _>>()?,
        )),

        ExprKind::Assign { target, value } => {
            let value = evaluate_expression(value, state)?;
            assign(target, value.clone(), state)?;
            Ok(value)
        }
    }
}

fn evaluate_variable(name: &str, state: &EvalState) -> ValueResult {
    match name {
        VAR_ROOT => Ok(state.ctx.root_object().clone()),
        VAR_THIS => Ok(state.active_object().clone()),
        _ => state
            .ctx
            .lookup_variable(name)
            .cloned()
            .ok_or_else(|| EvalError::UnboundVariable(name.to_string())),
    }
}

/// Each segment after the first is evaluated with the previous result as
/// the active object.
fn evaluate_compound_path(segments: &[ExprNode], state: &mut EvalState) -> ValueResult {
    let mut current = state.active_object().clone();
    for segment in segments {
        current = state.with_active(current, |s| evaluate_expression(segment, s))?;
    }
    Ok(current)
}

fn cache_key(node: &ExprNode, access: AccessKind, target: &Value, arg_types: Option<&[ValueType]>) -> CacheKey {
    CacheKey {
        node: node.id,
        access,
        target: target.value_type(),
        arg_types: arg_types.map(|t| t.to_vec()),
    }
}

fn read_property(node: &ExprNode, name: &str, target: &Value, state: &mut EvalState) -> ValueResult {
    let ctx = state.ctx;
    let chain = ctx.property_resolvers();
    let key = state
        .cache
        .map(|_| cache_key(node, AccessKind::Read, target, None));
    let hint = match (state.cache, &key) {
        (Some(cache), Some(key)) => cache.lookup(key, chain.generation()),
        _ => None,
    };
    if hint.is_some() {
        trace!(node = node.id.0, property = name, "resolution cache hit");
    }

    let (index, resolver) = chain
        .find_reader(ctx, target, name, hint)?
        .ok_or_else(|| EvalError::UnresolvedProperty {
            name: name.to_string(),
            target: target.value_type(),
        })?;
    if let (Some(cache), Some(key)) = (state.cache, key) {
        cache.record(key, chain.generation(), index);
    }
    resolver
        .read(ctx, target, name)
        .map_err(|e| EvalError::from_access(resolver.name(), e))
}

fn write_property(
    node: &ExprNode,
    name: &str,
    target: &Value,
    value: Value,
    state: &mut EvalState,
) -> Result<(), EvalError> {
    let ctx = state.ctx;
    let chain = ctx.property_resolvers();
    let key = state
        .cache
        .map(|_| cache_key(node, AccessKind::Write, target, None));
    let hint = match (state.cache, &key) {
        (Some(cache), Some(key)) => cache.lookup(key, chain.generation()),
        _ => None,
    };

    let (index, resolver) = chain
        .find_writer(ctx, target, name, hint)?
        .ok_or_else(|| EvalError::UnwritableProperty {
            name: name.to_string(),
            target: target.value_type(),
        })?;
    if let (Some(cache), Some(key)) = (state.cache, key) {
        cache.record(key, chain.generation(), index);
    }
    resolver
        .write(ctx, target, name, value)
        .map_err(|e| EvalError::from_access(resolver.name(), e))
}

fn call_method(
    node: &ExprNode,
    name: &str,
    args: &[ExprNode],
    target: &Value,
    state: &mut EvalState,
) -> ValueResult {
    let root = state.ctx.root_object().clone();
    let values = state.with_active(root, |s| {
        args.iter()
            .map(|arg| evaluate_expression(arg, s))
            .collect::<Result<Vec<_>, _>>()
    })?;
    let arg_types: Vec<ValueType> = values.iter().map(Value::value_type).collect();

    let ctx = state.ctx;
    let chain = ctx.method_resolvers();
    let key = state
        .cache
        .map(|_| cache_key(node, AccessKind::Call, target, Some(&arg_types)));
    let hint = match (state.cache, &key) {
        (Some(cache), Some(key)) => cache.lookup(key, chain.generation()),
        _ => None,
    };
    if hint.is_some() {
        trace!(node = node.id.0, method = name, "resolution cache hit");
    }

    let resolved = match chain.resolve(ctx, target, name, &arg_types, hint)? {
        Some(resolved) => resolved,
        None => {
            return Err(EvalError::UnresolvedMethod {
                name: name.to_string(),
                target: target.value_type(),
                arg_types,
            })
        }
    };
    if let (Some(cache), Some(key)) = (state.cache, key) {
        cache.record(key, chain.generation(), resolved.index);
    }

    let args = match resolved.executor.signature() {
        Some(signature) => convert_arguments(ctx.type_converter(), name, signature, values)?,
        None => values,
    };
    resolved
        .executor
        .execute(ctx, target, args)
        .map_err(|e| EvalError::from_access(&resolved.resolver, e))
}

/// Write `value` through the property chain. Only property references, on
/// their own or at the end of a compound path, can be assigned.
pub fn assign(target: &ExprNode, value: Value, state: &mut EvalState) -> Result<(), EvalError> {
    match &target.kind {
        ExprKind::PropertyOrFieldReference(name) => {
            let object = state.active_object().clone();
            write_property(target, name, &object, value, state)
        }
        ExprKind::CompoundPath(segments) => {
            let (last, init) = match segments.split_last() {
                Some(split) => split,
                None => return Err(EvalError::NotAssignable("empty path".to_string())),
            };
            let name = match &last.kind {
                ExprKind::PropertyOrFieldReference(name) => name,
                _ => return Err(not_assignable(last)),
            };
            let object = evaluate_compound_path(init, state)?;
            write_property(last, name, &object, value, state)
        }
        _ => Err(not_assignable(target)),
    }
}

fn not_assignable(node: &ExprNode) -> EvalError {
    let what = match &node.kind {
        ExprKind::Literal(_) => "a literal".to_string(),
        ExprKind::VariableReference(name) => format!("variable '#{}'", name),
        ExprKind::MethodCall { name, .. } => format!("the result of {}()", name),
        _ => format!(
            "the expression at {}..{}",
            node.meta.start_index, node.meta.end_index
        ),
    };
    EvalError::NotAssignable(what)
}

fn evaluate_binary_expression(
    op: BinaryOperator,
    left: &ExprNode,
    right: &ExprNode,
    state: &mut EvalState,
) -> ValueResult {
    let symbol = op.to_string();
    match op {
        BinaryOperator::And => {
            let l = evaluate_expression(left, state)?;
            if !truth_value(&symbol, &l)? {
                return Ok(Value::Boolean(false));
            }
            let r = evaluate_expression(right, state)?;
            Ok(Value::Boolean(truth_value(&symbol, &r)?))
        }
        BinaryOperator::Or => {
            let l = evaluate_expression(left, state)?;
            if truth_value(&symbol, &l)? {
                return Ok(Value::Boolean(true));
            }
            let r = evaluate_expression(right, state)?;
            Ok(Value::Boolean(truth_value(&symbol, &r)?))
        }
        _ => {
            let l = evaluate_expression(left, state)?;
            let r = evaluate_expression(right, state)?;
            evaluate_strict_binary(op, &symbol, &l, &r)
        }
    }
}

fn evaluate_strict_binary(op: BinaryOperator, symbol: &str, l: &Value, r: &Value) -> ValueResult {
    let ordered = |test: fn(std::cmp::Ordering) -> bool| -> ValueResult {
        Ok(Value::Boolean(compare(symbol, l, r)?.map_or(false, test)))
    };
    match op {
        BinaryOperator::Equal => Ok(Value::Boolean(loosely_equal(l, r))),
        BinaryOperator::NotEqual => Ok(Value::Boolean(!loosely_equal(l, r))),
        BinaryOperator::LessThan => ordered(|o| o.is_lt()),
        BinaryOperator::LessThanEqual => ordered(|o| o.is_le()),
        BinaryOperator::GreaterThan => ordered(|o| o.is_gt()),
        BinaryOperator::GreaterThanEqual => ordered(|o| o.is_ge()),
        BinaryOperator::Add => arithmetic(ArithmeticOp::Add, l, r),
        BinaryOperator::Subtract => arithmetic(ArithmeticOp::Subtract, l, r),
        BinaryOperator::Multiply => arithmetic(ArithmeticOp::Multiply, l, r),
        BinaryOperator::Divide => arithmetic(ArithmeticOp::Divide, l, r),
        BinaryOperator::Remainder => arithmetic(ArithmeticOp::Remainder, l, r),
        BinaryOperator::And | BinaryOperator::Or => Err(EvalError::operand_mismatch(
            symbol,
            &l.value_type(),
            &r.value_type(),
        )),
    }
}

fn evaluate_unary_expression(op: UnaryOperator, operand: &ExprNode, state: &mut EvalState) -> ValueResult {
    let value = evaluate_expression(operand, state)?;
    match op {
        UnaryOperator::Not => Ok(Value::Boolean(!truth_value("not", &value)?)),
        UnaryOperator::Minus => negate(&value),
        UnaryOperator::Plus if value.is_numeric() => Ok(value),
        UnaryOperator::Plus => Err(EvalError::unary_operand_mismatch("+", &value.value_type())),
    }
}
