use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use simcalc::{
    BinaryOperator as Op, EvalError, EvaluateOptions, Expression, Formula, FunctionFn, Value,
};

use crate::{call, eval, float, ident, int};

#[tokio::test]
async fn test_if_evaluates_one_branch() {
    let division = || Expression::binary(Op::Div, int(1), int(0));

    let result = eval(call("if", vec![Expression::value(false), division(), int(42)])).await;
    assert_eq!(result, Ok(Value::Integer(42)));

    let result = eval(call("if", vec![Expression::value(true), int(42), division()])).await;
    assert_eq!(result, Ok(Value::Integer(42)));

    // an unbound identifier in the untaken branch is never looked up
    let result = eval(call(
        "if",
        vec![Expression::value(true), int(42), ident("never_bound")],
    ))
    .await;
    assert_eq!(result, Ok(Value::Integer(42)));
}

#[tokio::test]
async fn test_in() {
    let result = eval(call("in", vec![int(3), int(1), int(2), int(3)])).await;
    assert_eq!(result, Ok(Value::Boolean(true)));

    let result = eval(call("in", vec![int(3), int(1), int(2)])).await;
    assert_eq!(result, Ok(Value::Boolean(false)));

    let result = eval(call(
        "in",
        vec![Expression::value("b"), Expression::value("a"), Expression::value("b")],
    ))
    .await;
    assert_eq!(result, Ok(Value::Boolean(true)));
}

#[tokio::test]
async fn test_in_stops_at_first_match() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut formula = Formula::new(call(
        "in",
        vec![
            int(2),
            call("lookup", vec![int(1)]),
            call("lookup", vec![int(2)]),
            call("lookup", vec![int(3)]),
        ],
    ));
    formula.add_function_resolver(FunctionFn::new(move |name, args| {
        let counter = counter.clone();
        Box::pin(async move {
            if name != "lookup" {
                return Ok::<_, EvalError>(None);
            }
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, EvalError>(Some(args[0].evaluate().await?))
        })
    }));

    assert_eq!(formula.evaluate().await, Ok(Value::Boolean(true)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_round_midpoint_rule() {
    let expr = || call("Round", vec![float(2.5), int(0)]);

    assert_eq!(eval(expr()).await, Ok(Value::Float(2.0)));

    let formula = Formula::with_options(expr(), EvaluateOptions::default().round_away_from_zero());
    assert_eq!(formula.evaluate().await, Ok(Value::Float(3.0)));

    let result = eval(call("Round", vec![float(1e300), int(15)])).await;
    assert_eq!(result, Ok(Value::Float(1e300)));

    let result = eval(call("Round", vec![float(2.5), int(16)])).await;
    assert!(matches!(result, Err(EvalError::InvalidArgument { .. })));
}

#[tokio::test]
async fn test_safediv() {
    let result = eval(call("Safediv", vec![int(10), int(0), int(5)])).await;
    assert_eq!(result, Ok(Value::Float(2.0)));

    let result = eval(call("Safediv", vec![int(10), int(0)])).await;
    assert_eq!(result, Ok(Value::Float(0.0)));

    let result = eval(call("Safediv", vec![int(10), int(2)])).await;
    assert_eq!(result, Ok(Value::Float(5.0)));
}

#[tokio::test]
async fn test_math_functions() {
    assert_eq!(
        eval(call("Abs", vec![float(-1.5)])).await,
        Ok(Value::Decimal(Decimal::new(15, 1)))
    );
    assert_eq!(eval(call("Sign", vec![float(-0.1)])).await, Ok(Value::Integer(-1)));
    assert_eq!(eval(call("Sign", vec![int(0)])).await, Ok(Value::Integer(0)));
    assert_eq!(eval(call("Ceiling", vec![float(1.2)])).await, Ok(Value::Float(2.0)));
    assert_eq!(eval(call("Floor", vec![float(-1.2)])).await, Ok(Value::Float(-2.0)));
    assert_eq!(eval(call("Truncate", vec![float(-1.7)])).await, Ok(Value::Float(-1.0)));
    assert_eq!(eval(call("Sqrt", vec![int(16)])).await, Ok(Value::Float(4.0)));
    assert_eq!(eval(call("Pow", vec![int(2), int(10)])).await, Ok(Value::Float(1024.0)));
    assert_eq!(eval(call("Log10", vec![int(1000)])).await, Ok(Value::Float(3.0)));
    assert_eq!(
        eval(call("IEEERemainder", vec![int(11), int(3)])).await,
        Ok(Value::Float(-1.0))
    );
    assert_eq!(eval(call("Max", vec![int(3), float(4.5)])).await, Ok(Value::Float(4.5)));
    assert_eq!(eval(call("Min", vec![int(3), int(-2)])).await, Ok(Value::Integer(-2)));

    let Ok(Value::Float(log)) = eval(call("Log", vec![int(8), int(2)])).await else {
        panic!("Log should produce a float");
    };
    assert!((log - 3.0).abs() < 1e-12);
}

#[tokio::test]
async fn test_sign_of_nan_fails() {
    let nan = Expression::binary(Op::Div, float(0.0), float(0.0));
    let result = eval(call("Sign", vec![nan])).await;
    assert!(matches!(result, Err(EvalError::InvalidArgument { .. })));
}

#[tokio::test]
async fn test_arity_mismatch() {
    let result = eval(call("Pow", vec![int(2)])).await;
    assert_eq!(
        result,
        Err(EvalError::ArityMismatch {
            function: "Pow".to_string(),
            expected: "2".to_string(),
            actual: 1,
        })
    );
}
