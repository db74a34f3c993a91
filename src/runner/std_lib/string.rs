//! String built-in.
//!
//! Provides the methods callable on string values.

use crate::runner::ds::error::AccessError;
use crate::runner::ds::value::{Value, ValueType, TYPE_STR_STRING};
use crate::runner::plugin::registry::TypeRegistry;
use crate::runner::plugin::resolver::MethodSignature;
use crate::runner::plugin::types::{EvalContext, TypeDescriptor};

/// Register the String built-in with the registry.
pub fn register(registry: &mut TypeRegistry) {
    let no_args = || MethodSignature::new(vec![]);
    let one_string = || MethodSignature::new(vec![ValueType::String]);

    let string = TypeDescriptor::new(TYPE_STR_STRING)
        .add_method("length", no_args(), string_length)
        .add_method("isEmpty", no_args(), string_is_empty)
        .add_method("toUpperCase", no_args(), string_to_upper_case)
        .add_method("toLowerCase", no_args(), string_to_lower_case)
        .add_method("startsWith", one_string(), string_starts_with)
        .add_method("contains", one_string(), string_contains);

    registry.register_type(string);
}

fn this_str(this: &Value) -> Result<&str, AccessError> {
    this.as_str()
        .ok_or_else(|| AccessError::failed(format!("{} is not a String", this.type_name())))
}

/// Argument already coerced to String, or null.
fn arg_str(args: &[Value]) -> Option<&str> {
    args.first().and_then(Value::as_str)
}

fn string_length(_ctx: &EvalContext, this: &Value, _args: Vec<Value>) -> Result<Value, AccessError> {
    Ok(Value::Int(this_str(this)?.chars().count() as i32))
}

fn string_is_empty(_ctx: &EvalContext, this: &Value, _args: Vec<Value>) -> Result<Value, AccessError> {
    Ok(Value::Boolean(this_str(this)?.is_empty()))
}

fn string_to_upper_case(_ctx: &EvalContext, this: &Value, _args: Vec<Value>) -> Result<Value, AccessError> {
    Ok(Value::String(this_str(this)?.to_uppercase()))
}

fn string_to_lower_case(_ctx: &EvalContext, this: &Value, _args: Vec<Value>) -> Result<Value, AccessError> {
    Ok(Value::String(this_str(this)?.to_lowercase()))
}

fn string_starts_with(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> Result<Value, AccessError> {
    let s = this_str(this)?;
    Ok(Value::Boolean(arg_str(&args).map_or(false, |prefix| s.starts_with(prefix))))
}

fn string_contains(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> Result<Value, AccessError> {
    let s = this_str(this)?;
    Ok(Value::Boolean(arg_str(&args).map_or(false, |needle| s.contains(needle))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, this: &str, args: Vec<Value>) -> Value {
        let mut registry = TypeRegistry::new();
        register(&mut registry);
        let methods = registry.find_methods(TYPE_STR_STRING, name);
        (methods[0].func)(&EvalContext::new(), &Value::from(this), args).unwrap()
    }

    #[test]
    fn test_length_counts_chars() {
        assert_eq!(call("length", "héllo", vec![]), Value::Int(5));
        assert_eq!(call("isEmpty", "", vec![]), Value::Boolean(true));
    }

    #[test]
    fn test_case_and_search() {
        assert_eq!(call("toUpperCase", "Andy", vec![]), Value::from("ANDY"));
        assert_eq!(call("toLowerCase", "Andy", vec![]), Value::from("andy"));
        assert_eq!(call("startsWith", "ROLE_ADMIN", vec![Value::from("ROLE_")]), Value::Boolean(true));
        assert_eq!(call("contains", "10.10.0.1", vec![Value::from(".0.")]), Value::Boolean(true));
        assert_eq!(call("contains", "abc", vec![Value::Null]), Value::Boolean(false));
    }
}
