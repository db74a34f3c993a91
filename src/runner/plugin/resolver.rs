//! Resolver traits for pluggable property and method resolution.
//!
//! Resolvers are registered on an [`EvalContext`] and queried in chain order
//! whenever an expression reads or writes a property or calls a method. The
//! first resolver that declares itself applicable wins; later resolvers are
//! never consulted for that access.

use crate::runner::ds::error::AccessError;
use crate::runner::ds::value::{Value, ValueType};
use crate::runner::plugin::types::EvalContext;

/// Resolves property reads and writes against a target value.
pub trait PropertyResolver {
    /// Can this resolver read `name` from `target`?
    ///
    /// Must be free of side effects: it may be called repeatedly, and a
    /// cached resolution re-checks only the cached resolver.
    fn can_read(&self, ctx: &EvalContext, target: &Value, name: &str) -> Result<bool, AccessError>;

    /// Read the property. Called only after `can_read` returned `true`.
    fn read(&self, ctx: &EvalContext, target: &Value, name: &str) -> Result<Value, AccessError>;

    fn can_write(&self, _ctx: &EvalContext, _target: &Value, _name: &str) -> Result<bool, AccessError> {
        Ok(false)
    }

    fn write(&self, _ctx: &EvalContext, _target: &Value, name: &str, _value: Value) -> Result<(), AccessError> {
        Err(AccessError::failed(format!("property '{}' is read-only", name)))
    }

    /// Human-readable name for this resolver (for error reports and tracing).
    fn name(&self) -> &str;
}

/// Resolves method calls against a target value.
pub trait MethodResolver {
    /// Find an executor for `name` on `target` accepting arguments of
    /// `arg_types`.
    ///
    /// Returning `Ok(None)` lets the chain continue with the next resolver.
    fn resolve(
        &self,
        ctx: &EvalContext,
        target: &Value,
        name: &str,
        arg_types: &[ValueType],
    ) -> Result<Option<Box<dyn MethodExecutor>>, AccessError>;

    fn name(&self) -> &str;
}

/// A resolved, invocable method binding.
pub trait MethodExecutor {
    /// Declared parameter types. When present the evaluator coerces (and, for
    /// variable-arity signatures, packs) the arguments before `execute`.
    /// When absent the arguments are passed exactly as evaluated.
    fn signature(&self) -> Option<&MethodSignature>;

    fn execute(&self, ctx: &EvalContext, target: &Value, args: Vec<Value>) -> Result<Value, AccessError>;
}

/// Declared parameter list of a method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    params: Vec<ValueType>,
    varargs: bool,
}

impl MethodSignature {
    /// Fixed-arity signature.
    pub fn new(params: Vec<ValueType>) -> Self {
        MethodSignature {
            params,
            varargs: false,
        }
    }

    /// Signature whose trailing parameter collects every remaining argument
    /// into a `List<element>`.
    pub fn varargs(fixed: Vec<ValueType>, element: ValueType) -> Self {
        let mut params = fixed;
        params.push(ValueType::list_of(element));
        MethodSignature {
            params,
            varargs: true,
        }
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    pub fn is_varargs(&self) -> bool {
        self.varargs
    }

    /// Number of parameters that must always be supplied.
    pub fn required(&self) -> usize {
        if self.varargs {
            self.params.len() - 1
        } else {
            self.params.len()
        }
    }

    pub fn accepts_arity(&self, supplied: usize) -> bool {
        if self.varargs {
            supplied >= self.required()
        } else {
            supplied == self.params.len()
        }
    }

    pub fn describe_arity(&self) -> String {
        if self.varargs {
            format!("at least {}", self.required())
        } else {
            self.params.len().to_string()
        }
    }
}

/// Executor backed by a closure.
///
/// Convenient for host resolvers that route a name to Rust code:
///
/// ```
/// use exprkit::runner::ds::value::{Value, ValueType};
/// use exprkit::runner::plugin::resolver::{FnExecutor, MethodExecutor, MethodSignature};
///
/// let exec = FnExecutor::new(
///     Some(MethodSignature::varargs(vec![], ValueType::String)),
///     |_ctx, _target, args| Ok(Value::Int(args[0].as_list().map_or(0, |l| l.len() as i32))),
/// );
/// assert!(exec.signature().unwrap().is_varargs());
/// ```
pub struct FnExecutor<F> {
    signature: Option<MethodSignature>,
    func: F,
}

impl<F> FnExecutor<F>
where
    F: Fn(&EvalContext, &Value, Vec<Value>) -> Result<Value, AccessError>,
{
    pub fn new(signature: Option<MethodSignature>, func: F) -> Self {
        FnExecutor { signature, func }
    }
}

impl<F> MethodExecutor for FnExecutor<F>
where
    F: Fn(&EvalContext, &Value, Vec<Value>) -> Result<Value, AccessError>,
{
    fn signature(&self) -> Option<&MethodSignature> {
        self.signature.as_ref()
    }

    fn execute(&self, ctx: &EvalContext, target: &Value, args: Vec<Value>) -> Result<Value, AccessError> {
        (self.func)(ctx, target, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_signature_arity() {
        let sig = MethodSignature::new(vec![ValueType::String, ValueType::Int]);
        assert!(sig.accepts_arity(2));
        assert!(!sig.accepts_arity(1));
        assert!(!sig.accepts_arity(3));
        assert_eq!(sig.describe_arity(), "2");
    }

    #[test]
    fn test_varargs_signature_arity() {
        let sig = MethodSignature::varargs(vec![ValueType::Int], ValueType::String);
        assert_eq!(sig.params(), &[ValueType::Int, ValueType::list_of(ValueType::String)]);
        assert_eq!(sig.required(), 1);
        assert!(!sig.accepts_arity(0));
        assert!(sig.accepts_arity(1));
        assert!(sig.accepts_arity(5));
        assert_eq!(sig.describe_arity(), "at least 1");
    }
}
