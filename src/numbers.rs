//! Arithmetic across the numeric value kinds.
//!
//! Operands are promoted to a common kind before the operation: decimal if
//! either side is decimal, else float if either side is float, else integer.
//! Text is parsed into a number first. Integer overflow falls back to float.

use rust_decimal::Decimal;

use crate::value::{Value, ValueType};
use crate::{EvalError, EvalResult};

enum Operands {
    Integer(i64, i64),
    Float(f64, f64),
    Decimal(Decimal, Decimal),
}

fn numeric(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Integer(_) | Value::Float(_) | Value::Decimal(_) => Ok(value.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Ok(Value::Integer(i))
            } else {
                s.parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| EvalError::coercion(value, ValueType::Float))
            }
        }
        Value::Null | Value::Boolean(_) => Err(EvalError::coercion(value, ValueType::Float)),
    }
}

fn promote(left: &Value, right: &Value) -> EvalResult<Operands> {
    let l = numeric(left)?;
    let r = numeric(right)?;
    Ok(match (&l, &r) {
        (Value::Integer(a), Value::Integer(b)) => Operands::Integer(*a, *b),
        (Value::Decimal(_), _) | (_, Value::Decimal(_)) => {
            Operands::Decimal(l.to_decimal()?, r.to_decimal()?)
        }
        _ => Operands::Float(l.to_f64()?, r.to_f64()?),
    })
}

fn decimal_or_float(
    result: Option<Decimal>,
    a: Decimal,
    b: Decimal,
    fallback: fn(f64, f64) -> f64,
) -> EvalResult<Value> {
    match result {
        Some(d) => Ok(Value::Decimal(d)),
        None => {
            let a = Value::Decimal(a).to_f64()?;
            let b = Value::Decimal(b).to_f64()?;
            Ok(Value::Float(fallback(a, b)))
        }
    }
}

pub fn add(left: &Value, right: &Value) -> EvalResult<Value> {
    match promote(left, right)? {
        Operands::Integer(a, b) => Ok(a
            .checked_add(b)
            .map(Value::Integer)
            .unwrap_or_else(|| Value::Float(a as f64 + b as f64))),
        Operands::Float(a, b) => Ok(Value::Float(a + b)),
        Operands::Decimal(a, b) => decimal_or_float(a.checked_add(b), a, b, |x, y| x + y),
    }
}

pub fn subtract(left: &Value, right: &Value) -> EvalResult<Value> {
    match promote(left, right)? {
        Operands::Integer(a, b) => Ok(a
            .checked_sub(b)
            .map(Value::Integer)
            .unwrap_or_else(|| Value::Float(a as f64 - b as f64))),
        Operands::Float(a, b) => Ok(Value::Float(a - b)),
        Operands::Decimal(a, b) => decimal_or_float(a.checked_sub(b), a, b, |x, y| x - y),
    }
}

pub fn multiply(left: &Value, right: &Value) -> EvalResult<Value> {
    match promote(left, right)? {
        Operands::Integer(a, b) => Ok(a
            .checked_mul(b)
            .map(Value::Integer)
            .unwrap_or_else(|| Value::Float(a as f64 * b as f64))),
        Operands::Float(a, b) => Ok(Value::Float(a * b)),
        Operands::Decimal(a, b) => decimal_or_float(a.checked_mul(b), a, b, |x, y| x * y),
    }
}

/// Integer division truncates; float division follows IEEE-754.
pub fn divide(left: &Value, right: &Value) -> EvalResult<Value> {
    match promote(left, right)? {
        Operands::Integer(_, 0) => Err(EvalError::DivisionByZero),
        Operands::Integer(a, b) => Ok(a
            .checked_div(b)
            .map(Value::Integer)
            .unwrap_or_else(|| Value::Float(a as f64 / b as f64))),
        Operands::Float(a, b) => Ok(Value::Float(a / b)),
        Operands::Decimal(_, b) if b.is_zero() => Err(EvalError::DivisionByZero),
        Operands::Decimal(a, b) => decimal_or_float(a.checked_div(b), a, b, |x, y| x / y),
    }
}

pub fn modulo(left: &Value, right: &Value) -> EvalResult<Value> {
    match promote(left, right)? {
        Operands::Integer(_, 0) => Err(EvalError::DivisionByZero),
        Operands::Integer(a, b) => Ok(Value::Integer(a.checked_rem(b).unwrap_or(0))),
        Operands::Float(a, b) => Ok(Value::Float(a % b)),
        Operands::Decimal(_, b) if b.is_zero() => Err(EvalError::DivisionByZero),
        Operands::Decimal(a, b) => decimal_or_float(a.checked_rem(b), a, b, |x, y| x % y),
    }
}

pub fn max(left: &Value, right: &Value) -> EvalResult<Value> {
    Ok(match promote(left, right)? {
        Operands::Integer(a, b) => Value::Integer(a.max(b)),
        Operands::Float(a, b) => Value::Float(a.max(b)),
        Operands::Decimal(a, b) => Value::Decimal(a.max(b)),
    })
}

pub fn min(left: &Value, right: &Value) -> EvalResult<Value> {
    Ok(match promote(left, right)? {
        Operands::Integer(a, b) => Value::Integer(a.min(b)),
        Operands::Float(a, b) => Value::Float(a.min(b)),
        Operands::Decimal(a, b) => Value::Decimal(a.min(b)),
    })
}
