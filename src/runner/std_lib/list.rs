//! List built-in.

use crate::runner::ds::error::AccessError;
use crate::runner::ds::value::{Value, ValueType, TYPE_STR_LIST};
use crate::runner::plugin::registry::TypeRegistry;
use crate::runner::plugin::resolver::MethodSignature;
use crate::runner::plugin::types::{EvalContext, TypeDescriptor};

/// Register the List built-in with the registry.
pub fn register(registry: &mut TypeRegistry) {
    let list = TypeDescriptor::new(TYPE_STR_LIST)
        .add_method("size", MethodSignature::new(vec![]), list_size)
        .add_method("isEmpty", MethodSignature::new(vec![]), list_is_empty)
        .add_method("contains", MethodSignature::new(vec![ValueType::Any]), list_contains)
        .add_method("get", MethodSignature::new(vec![ValueType::Int]), list_get);

    registry.register_type(list);
}

fn items(this: &Value) -> Result<&[Value], AccessError> {
    this.as_list()
        .ok_or_else(|| AccessError::failed(format!("{} is not a List", this.type_name())))
}

fn list_size(_ctx: &EvalContext, this: &Value, _args: Vec<Value>) -> Result<Value, AccessError> {
    Ok(Value::Int(items(this)?.len() as i32))
}

fn list_is_empty(_ctx: &EvalContext, this: &Value, _args: Vec<Value>) -> Result<Value, AccessError> {
    Ok(Value::Boolean(items(this)?.is_empty()))
}

/// Membership uses the same equality as the `==` operator, so `{1, 2}.contains(2L)` holds.
fn list_contains(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> Result<Value, AccessError> {
    let needle = args.first().unwrap_or(&Value::Null);
    Ok(Value::Boolean(
        items(this)?
            .iter()
            .any(|item| crate::runner::ds::operations::test_and_comparison::loosely_equal(item, needle)),
    ))
}

fn list_get(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> Result<Value, AccessError> {
    let list = items(this)?;
    let index = match args.first() {
        Some(Value::Int(i)) => *i,
        _ => return Err(AccessError::failed("list index must be an Int")),
    };
    if index < 0 || index as usize >= list.len() {
        return Err(AccessError::failed(format!(
            "index {} out of bounds for list of size {}",
            index,
            list.len()
        )));
    }
    Ok(list[index as usize].clone())
}
