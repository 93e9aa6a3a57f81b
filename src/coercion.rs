use std::cmp::Ordering;

use crate::value::{Value, ValueType};
use crate::{EvalError, EvalResult};

/// Scan order used to pick the common type of two operands.
///
/// The first entry equal to either operand's type wins. The order is not a
/// ranking by width: boolean sits above text, integer above everything.
pub const TYPE_PRIORITY: [ValueType; 5] = [
    ValueType::Integer,
    ValueType::Float,
    ValueType::Boolean,
    ValueType::String,
    ValueType::Decimal,
];

pub fn most_precise_type(a: Option<ValueType>, b: Option<ValueType>) -> Option<ValueType> {
    TYPE_PRIORITY
        .iter()
        .copied()
        .find(|t| a == Some(*t) || b == Some(*t))
        .or(a)
}

/// Orders two values after coercing both to their most precise type.
///
/// Null orders before every other value.
pub fn compare(a: &Value, b: &Value) -> EvalResult<Ordering> {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ok(Ordering::Equal),
        (true, false) => return Ok(Ordering::Less),
        (false, true) => return Ok(Ordering::Greater),
        (false, false) => {}
    }

    let Some(target) = most_precise_type(a.value_type(), b.value_type()) else {
        return Ok(Ordering::Equal);
    };
    let left = a.convert(target)?;
    let right = b.convert(target)?;

    match (&left, &right) {
        (Value::Integer(l), Value::Integer(r)) => Ok(l.cmp(r)),
        (Value::Float(l), Value::Float(r)) => Ok(l.partial_cmp(r).unwrap_or_else(|| l.total_cmp(r))),
        (Value::Boolean(l), Value::Boolean(r)) => Ok(l.cmp(r)),
        (Value::String(l), Value::String(r)) => Ok(l.cmp(r)),
        (Value::Decimal(l), Value::Decimal(r)) => Ok(l.cmp(r)),
        _ => Err(EvalError::coercion(b, target)),
    }
}

pub fn equals(a: &Value, b: &Value) -> EvalResult<bool> {
    Ok(compare(a, b)? == Ordering::Equal)
}
