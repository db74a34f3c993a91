//! Error kinds raised while evaluating an expression.
//!
//! Every error is terminal for the `get_value` call that raised it. Resolvers
//! report their own failures as [`AccessError`]; the evaluator wraps them in
//! [`EvalError`] together with the identity of the resolver that raised them.

use std::error::Error as StdError;

use crate::runner::ds::value::ValueType;

pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Failure raised by a resolver or an executor it produced.
#[derive(thiserror::Error, Debug)]
pub enum AccessError {
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        cause: Option<BoxedCause>,
    },

    /// A member with the requested name exists but no overload accepts the
    /// supplied number of arguments.
    #[error("'{name}' expects {expected} argument(s) but {supplied} were supplied")]
    ArityMismatch {
        name: String,
        expected: String,
        supplied: usize,
    },
}

impl AccessError {
    pub fn failed(message: impl Into<String>) -> Self {
        AccessError::Failed {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: impl Into<BoxedCause>) -> Self {
        AccessError::Failed {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum EvalError {
    #[error("variable '#{0}' is not bound in the evaluation context")]
    UnboundVariable(String),

    #[error("property '{name}' cannot be found on {target}")]
    UnresolvedProperty { name: String, target: ValueType },

    #[error("property '{name}' cannot be written on {target}")]
    UnwritableProperty { name: String, target: ValueType },

    #[error("method {name}({}) cannot be found on {target}", join_types(.arg_types))]
    UnresolvedMethod {
        name: String,
        target: ValueType,
        arg_types: Vec<ValueType>,
    },

    #[error("resolver '{resolver}' failed: {source}")]
    ResolverAccess {
        resolver: String,
        #[source]
        source: AccessError,
    },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("method '{name}' expects {expected} argument(s) but {supplied} were supplied")]
    ArityMismatch {
        name: String,
        expected: String,
        supplied: usize,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{0} is not assignable")]
    NotAssignable(String),
}

impl EvalError {
    pub fn cannot_convert(from: &ValueType, to: &ValueType) -> Self {
        EvalError::TypeMismatch(format!("cannot convert {} to {}", from, to))
    }

    pub fn lossy_conversion(value: impl std::fmt::Display, to: &ValueType) -> Self {
        EvalError::TypeMismatch(format!("{} cannot be represented as {}", value, to))
    }

    pub fn operand_mismatch(operator: impl std::fmt::Display, left: &ValueType, right: &ValueType) -> Self {
        EvalError::TypeMismatch(format!(
            "operator '{}' is not defined for {} and {}",
            operator, left, right
        ))
    }

    pub fn unary_operand_mismatch(operator: impl std::fmt::Display, operand: &ValueType) -> Self {
        EvalError::TypeMismatch(format!("operator '{}' is not defined for {}", operator, operand))
    }

    /// Attach the failing resolver's identity to an error it raised.
    ///
    /// Arity failures keep their own kind so callers can tell them apart from
    /// access failures.
    pub fn from_access(resolver: &str, err: AccessError) -> Self {
        match err {
            AccessError::ArityMismatch {
                name,
                expected,
                supplied,
            } => EvalError::ArityMismatch {
                name,
                expected,
                supplied,
            },
            other => EvalError::ResolverAccess {
                resolver: resolver.to_string(),
                source: other,
            },
        }
    }
}

fn join_types(types: &[ValueType]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
