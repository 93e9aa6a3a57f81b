use crate::coercion;
use crate::config::EvaluateOptions;
use crate::context::Argument;
use crate::numbers;
use crate::value::Value;
use crate::{EvalError, EvalResult};

use super::Builtin;

const MAX_ROUND_DIGITS: i64 = 15;
/// Magnitude from which every f64 is already an integer.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

pub(crate) async fn call(
    builtin: Builtin,
    args: &[Argument],
    options: &EvaluateOptions,
) -> EvalResult<Value> {
    match builtin {
        Builtin::Abs => Ok(Value::Decimal(args[0].evaluate().await?.to_decimal()?.abs())),
        Builtin::Arccos => unary(args, f64::acos).await,
        Builtin::Arcsin => unary(args, f64::asin).await,
        Builtin::Arctan => unary(args, f64::atan).await,
        Builtin::Ceiling => unary(args, f64::ceil).await,
        Builtin::Cos => unary(args, f64::cos).await,
        Builtin::Exp => unary(args, f64::exp).await,
        Builtin::Floor => unary(args, f64::floor).await,
        Builtin::Ln => unary(args, f64::ln).await,
        Builtin::Log10 => unary(args, f64::log10).await,
        Builtin::Sin => unary(args, f64::sin).await,
        Builtin::Sqrt => unary(args, f64::sqrt).await,
        Builtin::Tan => unary(args, f64::tan).await,
        Builtin::Truncate => unary(args, f64::trunc).await,
        Builtin::Sign => {
            let x = args[0].evaluate_f64().await?;
            if x.is_nan() {
                return Err(EvalError::invalid_argument("Sign", "NaN has no sign"));
            }
            let sign = if x > 0.0 {
                1
            } else if x < 0.0 {
                -1
            } else {
                0
            };
            Ok(Value::Integer(sign))
        }
        Builtin::IeeeRemainder => binary(args, ieee_remainder).await,
        Builtin::Log => binary(args, f64::log).await,
        Builtin::Pow => binary(args, f64::powf).await,
        Builtin::Round => {
            let x = args[0].evaluate_f64().await?;
            let digits = args[1].evaluate().await?.to_i64()?;
            Ok(Value::Float(round(x, digits, options.round_away_from_zero)?))
        }
        Builtin::Safediv => {
            let numerator = args[0].evaluate_f64().await?;
            let denominator = args[1].evaluate_f64().await?;
            if denominator != 0.0 {
                Ok(Value::Float(numerator / denominator))
            } else if let Some(fallback) = args.get(2) {
                Ok(Value::Float(numerator / fallback.evaluate_f64().await?))
            } else {
                Ok(Value::Float(0.0))
            }
        }
        Builtin::Max => {
            let left = args[0].evaluate().await?;
            numbers::max(&left, &args[1].evaluate().await?)
        }
        Builtin::Min => {
            let left = args[0].evaluate().await?;
            numbers::min(&left, &args[1].evaluate().await?)
        }
        Builtin::If => {
            if args[0].evaluate().await?.to_bool()? {
                args[1].evaluate().await
            } else {
                args[2].evaluate().await
            }
        }
        Builtin::In => {
            let needle = args[0].evaluate().await?;
            for candidate in &args[1..] {
                if coercion::equals(&needle, &candidate.evaluate().await?)? {
                    return Ok(Value::Boolean(true));
                }
            }
            Ok(Value::Boolean(false))
        }
        Builtin::Value
        | Builtin::Init
        | Builtin::ExternalUpdate
        | Builtin::Ramp
        | Builtin::Step
        | Builtin::Pulse
        | Builtin::Normal
        | Builtin::Smth1
        | Builtin::Smth3
        | Builtin::SmthN => Err(EvalError::internal(format!(
            "{} is not a math function",
            builtin
        ))),
    }
}

async fn unary(args: &[Argument], f: fn(f64) -> f64) -> EvalResult<Value> {
    Ok(Value::Float(f(args[0].evaluate_f64().await?)))
}

async fn binary(args: &[Argument], f: fn(f64, f64) -> f64) -> EvalResult<Value> {
    let x = args[0].evaluate_f64().await?;
    let y = args[1].evaluate_f64().await?;
    Ok(Value::Float(f(x, y)))
}

fn ieee_remainder(x: f64, y: f64) -> f64 {
    if y == 0.0 {
        return f64::NAN;
    }
    x - y * (x / y).round_ties_even()
}

fn round(x: f64, digits: i64, away_from_zero: bool) -> EvalResult<f64> {
    if !(0..=MAX_ROUND_DIGITS).contains(&digits) {
        return Err(EvalError::invalid_argument(
            "Round",
            format!("digits must be between 0 and {}, got {}", MAX_ROUND_DIGITS, digits),
        ));
    }
    let factor = 10f64.powi(digits as i32);
    let scaled = x * factor;
    // nothing below the requested digit is representable at this magnitude
    if !scaled.is_finite() || scaled.abs() >= EXACT_INTEGER_LIMIT {
        return Ok(x);
    }
    let rounded = if away_from_zero {
        scaled.round()
    } else {
        scaled.round_ties_even()
    };
    Ok(rounded / factor)
}
