use core::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{EvalError, EvalResult};

/// Runtime type identity of a non-null [`Value`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, Serialize, Deserialize,
)]
pub enum ValueType {
    Integer,
    Float,
    Boolean,
    String,
    Decimal,
}

/// Dynamically typed result of an evaluation.
#[derive(Clone, Debug, PartialEq, Default, Deserialize, Serialize)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl Value {
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::Integer(_) => Some(ValueType::Integer),
            Value::Float(_) => Some(ValueType::Float),
            Value::Decimal(_) => Some(ValueType::Decimal),
            Value::String(_) => Some(ValueType::String),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Floating or decimal values.
    pub fn is_real(&self) -> bool {
        matches!(self, Value::Float(_) | Value::Decimal(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn to_bool(&self) -> EvalResult<bool> {
        match self {
            Value::Null => Ok(false),
            Value::Boolean(b) => Ok(*b),
            Value::Integer(i) => Ok(*i != 0),
            Value::Float(x) => Ok(*x != 0.0),
            Value::Decimal(d) => Ok(!d.is_zero()),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(EvalError::coercion(self, ValueType::Boolean)),
            },
        }
    }

    /// Integer conversion; reals round half to even.
    pub fn to_i64(&self) -> EvalResult<i64> {
        let fail = || EvalError::coercion(self, ValueType::Integer);
        match self {
            Value::Null => Err(fail()),
            Value::Boolean(b) => Ok(i64::from(*b)),
            Value::Integer(i) => Ok(*i),
            Value::Float(x) => float_to_i64(*x).ok_or_else(fail),
            Value::Decimal(d) => d
                .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
                .to_i64()
                .ok_or_else(fail),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(i);
                }
                s.parse::<f64>()
                    .ok()
                    .and_then(float_to_i64)
                    .ok_or_else(fail)
            }
        }
    }

    pub fn to_f64(&self) -> EvalResult<f64> {
        match self {
            Value::Null => Err(EvalError::coercion(self, ValueType::Float)),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Integer(i) => Ok(*i as f64),
            Value::Float(x) => Ok(*x),
            Value::Decimal(d) => d
                .to_f64()
                .ok_or_else(|| EvalError::coercion(self, ValueType::Float)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| EvalError::coercion(self, ValueType::Float)),
        }
    }

    pub fn to_decimal(&self) -> EvalResult<Decimal> {
        let fail = || EvalError::coercion(self, ValueType::Decimal);
        match self {
            Value::Null => Err(fail()),
            Value::Boolean(b) => Ok(Decimal::from(i64::from(*b))),
            Value::Integer(i) => Ok(Decimal::from(*i)),
            Value::Float(x) => Decimal::try_from(*x).map_err(|_| fail()),
            Value::Decimal(d) => Ok(*d),
            Value::String(s) => {
                let s = s.trim();
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .map_err(|_| fail())
            }
        }
    }

    /// Low 16 bits of the integer conversion.
    pub fn to_u16(&self) -> EvalResult<u16> {
        Ok(self.to_i64()? as u16)
    }

    /// Converts into `target`; null stays null.
    pub fn convert(&self, target: ValueType) -> EvalResult<Value> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        Ok(match target {
            ValueType::Integer => Value::Integer(self.to_i64()?),
            ValueType::Float => Value::Float(self.to_f64()?),
            ValueType::Boolean => Value::Boolean(self.to_bool()?),
            ValueType::String => Value::String(self.to_string()),
            ValueType::Decimal => Value::Decimal(self.to_decimal()?),
        })
    }
}

fn float_to_i64(x: f64) -> Option<i64> {
    let rounded = x.round_ties_even();
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
