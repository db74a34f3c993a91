//! Value coercion.
//!
//! The standard converter orders the numeric kinds `Int < Long < Float <
//! Double`. Conversions up that order always succeed; conversions down it are
//! governed by the configured [`NarrowingPolicy`].

use std::fmt;
use std::rc::Rc;

use crate::runner::ds::error::EvalError;
use crate::runner::ds::value::{Value, ValueType};
use crate::runner::plugin::config::NarrowingPolicy;
use crate::runner::plugin::registry::TypeRegistry;
use crate::runner::plugin::resolver::MethodSignature;

/// The coercion service consulted by the evaluator.
pub trait TypeConverter {
    /// Whether a value of type `from` may be converted to `to`.
    ///
    /// A `true` answer does not guarantee success for every value; narrowing
    /// and string parsing are checked against the actual value by `convert`.
    fn can_convert(&self, from: &ValueType, to: &ValueType) -> bool;

    fn convert(&self, value: Value, to: &ValueType) -> Result<Value, EvalError>;
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Numeric {
    Integral(i64),
    Real(f64),
}

impl Numeric {
    pub(crate) fn of(value: &Value) -> Option<Numeric> {
        match value {
            Value::Int(i) => Some(Numeric::Integral(*i as i64)),
            Value::Long(l) => Some(Numeric::Integral(*l)),
            Value::Float(x) => Some(Numeric::Real(*x as f64)),
            Value::Double(x) => Some(Numeric::Real(*x)),
            _ => None,
        }
    }

    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Numeric::Integral(i) => i as f64,
            Numeric::Real(x) => x,
        }
    }
}

/// `as`-cast a numeric value to another numeric kind.
pub(crate) fn cast_numeric(value: &Value, to: &ValueType) -> Option<Value> {
    Some(match (Numeric::of(value)?, to) {
        (Numeric::Integral(i), ValueType::Int) => Value::Int(i as i32),
        (Numeric::Integral(i), ValueType::Long) => Value::Long(i),
        (Numeric::Integral(i), ValueType::Float) => Value::Float(i as f32),
        (Numeric::Integral(i), ValueType::Double) => Value::Double(i as f64),
        (Numeric::Real(x), ValueType::Int) => Value::Int(x as i32),
        (Numeric::Real(x), ValueType::Long) => Value::Long(x as i64),
        (Numeric::Real(x), ValueType::Float) => Value::Float(x as f32),
        (Numeric::Real(x), ValueType::Double) => Value::Double(x),
        _ => return None,
    })
}

fn is_nan(value: &Value) -> bool {
    matches!(Numeric::of(value), Some(Numeric::Real(x)) if x.is_nan())
}

#[derive(Clone, Default)]
pub struct StandardTypeConverter {
    narrowing: NarrowingPolicy,
    registry: Option<Rc<TypeRegistry>>,
}

impl StandardTypeConverter {
    pub fn new(narrowing: NarrowingPolicy) -> Self {
        StandardTypeConverter {
            narrowing,
            registry: None,
        }
    }

    /// Also accept an object where one of its registered ancestor types is
    /// expected.
    pub fn with_registry(mut self, registry: Rc<TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn narrowing(&self) -> NarrowingPolicy {
        self.narrowing
    }

    fn is_object_subtype(&self, sub: &str, sup: &str) -> bool {
        sub == sup || self.registry.as_ref().map_or(false, |r| r.is_subtype(sub, sup))
    }

    fn convert_numeric(&self, value: Value, from: &ValueType, to: &ValueType) -> Result<Value, EvalError> {
        let converted = match cast_numeric(&value, to) {
            Some(v) => v,
            None => return Err(EvalError::cannot_convert(from, to)),
        };
        if from.numeric_rank() <= to.numeric_rank() {
            return Ok(converted);
        }
        match self.narrowing {
            NarrowingPolicy::Truncating => Ok(converted),
            NarrowingPolicy::Never => Err(EvalError::cannot_convert(from, to)),
            NarrowingPolicy::Lossless => {
                let round_trip = cast_numeric(&converted, from);
                if round_trip.as_ref() == Some(&value) || (is_nan(&value) && is_nan(&converted)) {
                    Ok(converted)
                } else {
                    Err(EvalError::lossy_conversion(&value, to))
                }
            }
        }
    }

    fn parse_string(&self, s: &str, to: &ValueType) -> Result<Value, EvalError> {
        let trimmed = s.trim();
        let parsed = match to {
            ValueType::Int => trimmed.parse::<i32>().ok().map(Value::Int),
            ValueType::Long => trimmed.parse::<i64>().ok().map(Value::Long),
            ValueType::Float => trimmed.parse::<f32>().ok().map(Value::Float),
            ValueType::Double => trimmed.parse::<f64>().ok().map(Value::Double),
            ValueType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            },
            _ => None,
        };
        parsed.ok_or_else(|| {
            EvalError::TypeMismatch(format!("'{}' cannot be converted to {}", s, to))
        })
    }
}

impl TypeConverter for StandardTypeConverter {
    fn can_convert(&self, from: &ValueType, to: &ValueType) -> bool {
        if *to == ValueType::Any || from == to {
            return true;
        }
        match (from, to) {
            (ValueType::Null, _) => !to.is_primitive(),
            (f, t) if f.is_numeric() && t.is_numeric() => {
                f.numeric_rank() <= t.numeric_rank() || self.narrowing != NarrowingPolicy::Never
            }
            (f, ValueType::String) => f.is_primitive(),
            (ValueType::String, t) => t.is_primitive(),
            (ValueType::List(a), ValueType::List(b)) => self.can_convert(a, b),
            (ValueType::Object(sub), ValueType::Object(sup)) => self.is_object_subtype(sub, sup),
            _ => false,
        }
    }

    fn convert(&self, value: Value, to: &ValueType) -> Result<Value, EvalError> {
        if *to == ValueType::Any {
            return Ok(value);
        }
        let from = value.value_type();
        if from == *to {
            return Ok(value);
        }
        match (value, to) {
            (Value::Null, t) if !t.is_primitive() => Ok(Value::Null),
            (v, t) if v.is_numeric() && t.is_numeric() => self.convert_numeric(v, &from, t),
            (v @ Value::Boolean(_), ValueType::String) => Ok(Value::String(v.to_string())),
            (v, ValueType::String) if v.is_numeric() => Ok(Value::String(v.to_string())),
            (Value::String(s), t) if t.is_primitive() => self.parse_string(&s, t),
            (Value::List(items), ValueType::List(element)) => items
                .into_iter()
                .map(|item| self.convert(item, element))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            (Value::Object(o), ValueType::Object(name)) => {
                let declared = o.try_borrow().map_or(false, |obj| obj.instance_of(name));
                let registered = match &from {
                    ValueType::Object(sub) => self.is_object_subtype(sub, name),
                    _ => false,
                };
                if declared || registered {
                    Ok(Value::Object(o))
                } else {
                    Err(EvalError::cannot_convert(&from, to))
                }
            }
            _ => Err(EvalError::cannot_convert(&from, to)),
        }
    }
}

impl fmt::Debug for StandardTypeConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardTypeConverter")
            .field("narrowing", &self.narrowing)
            .field("registry", &self.registry.as_ref().map(|r| r.type_names()))
            .finish()
    }
}

/// Whether a single argument of type `arg` in the variable-arity position is
/// the collected sequence itself rather than one element of it.
///
/// It is when it is `null` or a list the converter can turn into
/// `sequence`. Overload selection and argument packing both decide with this,
/// so a call that selects a varargs overload is packed the way it was matched.
pub fn is_collected_sequence(converter: &dyn TypeConverter, arg: &ValueType, sequence: &ValueType) -> bool {
    match arg {
        ValueType::Null => true,
        ValueType::List(_) => converter.can_convert(arg, sequence),
        _ => false,
    }
}

/// Coerce call arguments to a method signature.
///
/// For a variable-arity signature the trailing arguments are coerced to the
/// element type and packed into one list, unless a single trailing argument
/// is the collected sequence itself (see [`is_collected_sequence`]).
pub fn convert_arguments(
    converter: &dyn TypeConverter,
    method: &str,
    signature: &MethodSignature,
    mut args: Vec<Value>,
) -> Result<Vec<Value>, EvalError> {
    let params = signature.params();
    if !signature.accepts_arity(args.len()) {
        return Err(EvalError::ArityMismatch {
            name: method.to_string(),
            expected: signature.describe_arity(),
            supplied: args.len(),
        });
    }

    if !signature.is_varargs() {
        return args
            .into_iter()
            .zip(params)
            .map(|(arg, param)| converter.convert(arg, param))
            .collect();
    }

    let fixed = params.len() - 1;
    let sequence_type = &params[fixed];
    let element = sequence_type.element_type().unwrap_or(&ValueType::Any);
    let tail = args.split_off(fixed);

    let mut converted = args
        .into_iter()
        .zip(params)
        .map(|(arg, param)| converter.convert(arg, param))
        .collect::<Result<Vec<_>, _>>()?;

    let packed = if tail.len() == 1 && is_collected_sequence(converter, &tail[0].value_type(), sequence_type) {
        let mut tail = tail;
        converter.convert(tail.remove(0), sequence_type)?
    } else {
        Value::List(
            tail.into_iter()
                .map(|arg| converter.convert(arg, element))
                .collect::<Result<Vec<_>, _>>()?,
        )
    };
    converted.push(packed);
    Ok(converted)
}
