//! Equality, ordering and arithmetic on values.
//!
//! Binary numeric operations promote both operands to the wider of the two
//! kinds (`Int < Long < Float < Double`) before operating. Integral arithmetic
//! wraps on overflow.

use std::cmp::Ordering;

use crate::runner::ds::error::EvalError;
use crate::runner::ds::operations::type_conversion::{cast_numeric, Numeric};
use crate::runner::ds::value::{Value, ValueType};

/// Equality as seen by `==`: numbers compare by promoted value, objects by
/// identity, lists element-wise, and values of unrelated kinds are unequal.
pub fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| loosely_equal(x, y))
        }
        _ if a.is_numeric() && b.is_numeric() => match (Numeric::of(a), Numeric::of(b)) {
            (Some(Numeric::Integral(x)), Some(Numeric::Integral(y))) => x == y,
            (Some(x), Some(y)) => x.as_f64() == y.as_f64(),
            _ => false,
        },
        _ => a == b,
    }
}

/// Order two values for the relational operators.
///
/// `Ok(None)` is returned for unordered numbers (NaN), which makes every
/// relational test false.
pub fn compare(operator: &str, a: &Value, b: &Value) -> Result<Option<Ordering>, EvalError> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(Some(x.cmp(y))),
        (Value::Boolean(x), Value::Boolean(y)) => Ok(Some(x.cmp(y))),
        _ if a.is_numeric() && b.is_numeric() => match (Numeric::of(a), Numeric::of(b)) {
            (Some(Numeric::Integral(x)), Some(Numeric::Integral(y))) => Ok(Some(x.cmp(&y))),
            (Some(x), Some(y)) => Ok(x.as_f64().partial_cmp(&y.as_f64())),
            _ => Err(EvalError::operand_mismatch(operator, &a.value_type(), &b.value_type())),
        },
        _ => Err(EvalError::operand_mismatch(operator, &a.value_type(), &b.value_type())),
    }
}

/// The wider numeric kind of two values, or `None` if either is not numeric.
fn promoted_type(a: &Value, b: &Value) -> Option<ValueType> {
    let ta = a.value_type();
    let tb = b.value_type();
    let (ra, rb) = (ta.numeric_rank()?, tb.numeric_rank()?);
    Some(if ra >= rb { ta } else { tb })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl ArithmeticOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
            ArithmeticOp::Remainder => "%",
        }
    }
}

/// Apply an arithmetic operator. `+` concatenates when either side is a string.
pub fn arithmetic(op: ArithmeticOp, a: &Value, b: &Value) -> Result<Value, EvalError> {
    if op == ArithmeticOp::Add {
        if let (Value::String(_), _) | (_, Value::String(_)) = (a, b) {
            return Ok(Value::String(format!("{}{}", a, b)));
        }
    }
    let mismatch = || EvalError::operand_mismatch(op.symbol(), &a.value_type(), &b.value_type());
    let kind = promoted_type(a, b).ok_or_else(mismatch)?;
    let x = cast_numeric(a, &kind).ok_or_else(mismatch)?;
    let y = cast_numeric(b, &kind).ok_or_else(mismatch)?;
    Ok(match (x, y) {
        (Value::Int(x), Value::Int(y)) => Value::Int(integral_i32(op, x, y)?),
        (Value::Long(x), Value::Long(y)) => Value::Long(integral_i64(op, x, y)?),
        (Value::Float(x), Value::Float(y)) => Value::Float(real(op, x as f64, y as f64) as f32),
        (Value::Double(x), Value::Double(y)) => Value::Double(real(op, x, y)),
        _ => return Err(mismatch()),
    })
}

fn integral_i32(op: ArithmeticOp, x: i32, y: i32) -> Result<i32, EvalError> {
    Ok(match op {
        ArithmeticOp::Add => x.wrapping_add(y),
        ArithmeticOp::Subtract => x.wrapping_sub(y),
        ArithmeticOp::Multiply => x.wrapping_mul(y),
        ArithmeticOp::Divide if y == 0 => return Err(EvalError::DivisionByZero),
        ArithmeticOp::Divide => x.wrapping_div(y),
        ArithmeticOp::Remainder if y == 0 => return Err(EvalError::DivisionByZero),
        ArithmeticOp::Remainder => x.wrapping_rem(y),
    })
}

fn integral_i64(op: ArithmeticOp, x: i64, y: i64) -> Result<i64, EvalError> {
    Ok(match op {
        ArithmeticOp::Add => x.wrapping_add(y),
        ArithmeticOp::Subtract => x.wrapping_sub(y),
        ArithmeticOp::Multiply => x.wrapping_mul(y),
        ArithmeticOp::Divide if y == 0 => return Err(EvalError::DivisionByZero),
        ArithmeticOp::Divide => x.wrapping_div(y),
        ArithmeticOp::Remainder if y == 0 => return Err(EvalError::DivisionByZero),
        ArithmeticOp::Remainder => x.wrapping_rem(y),
    })
}

fn real(op: ArithmeticOp, x: f64, y: f64) -> f64 {
    match op {
        ArithmeticOp::Add => x + y,
        ArithmeticOp::Subtract => x - y,
        ArithmeticOp::Multiply => x * y,
        ArithmeticOp::Divide => x / y,
        ArithmeticOp::Remainder => x % y,
    }
}

/// Unary minus.
pub fn negate(v: &Value) -> Result<Value, EvalError> {
    Ok(match v {
        Value::Int(i) => Value::Int(i.wrapping_neg()),
        Value::Long(l) => Value::Long(l.wrapping_neg()),
        Value::Float(x) => Value::Float(-x),
        Value::Double(x) => Value::Double(-x),
        _ => return Err(EvalError::unary_operand_mismatch("-", &v.value_type())),
    })
}

/// Truth value for the logical operators. Only booleans qualify.
pub fn truth_value(operator: &str, v: &Value) -> Result<bool, EvalError> {
    v.as_bool()
        .ok_or_else(|| EvalError::unary_operand_mismatch(operator, &v.value_type()))
}
