use pretty_assertions::assert_eq;
use simcalc::{Clock, EvalError, EvaluateOptions, Formula, Value};

use crate::{call, float, ident, int};

fn at(step: u64) -> Clock {
    Clock::new(step, step, 1.0)
}

fn as_f64(value: Value) -> f64 {
    match value {
        Value::Float(x) => x,
        other => panic!("expected a float, got {:?}", other),
    }
}

#[tokio::test]
async fn test_init_freezes_first_value() {
    let mut formula = Formula::new(call("init", vec![ident("x")])).with_parameter("x", 5);

    assert_eq!(formula.evaluate_at(at(0)).await, Ok(Value::Integer(5)));

    formula.set_parameter("x", 9);
    assert_eq!(formula.evaluate_at(at(1)).await, Ok(Value::Integer(5)));
    assert_eq!(formula.evaluate_at(at(2)).await, Ok(Value::Integer(5)));

    formula.reset_state();
    assert_eq!(formula.evaluate_at(at(3)).await, Ok(Value::Integer(9)));
}

#[tokio::test]
async fn test_reset_single_node() {
    let mut formula = Formula::new(call("init", vec![ident("x")])).with_parameter("x", 1);
    let id = formula.find_calls("init")[0];

    formula.evaluate_at(at(0)).await.unwrap();
    formula.set_parameter("x", 2);
    formula.reset_node(id);
    assert_eq!(formula.evaluate_at(at(1)).await, Ok(Value::Integer(2)));
    // the memo survives the reset
    formula.reset_node(id);
    assert_eq!(formula.last_value(id), Some(Value::Integer(2)));
}

#[tokio::test]
async fn test_step_going_backwards_starts_a_new_run() {
    let mut formula = Formula::new(call("init", vec![ident("x")])).with_parameter("x", 1);
    for step in 0..5 {
        assert_eq!(formula.evaluate_at(at(step)).await, Ok(Value::Integer(1)));
    }

    formula.set_parameter("x", 2);
    assert_eq!(formula.evaluate_at(at(0)).await, Ok(Value::Integer(2)));
}

#[tokio::test]
async fn test_new_run_keeps_state_when_auto_reset_is_off() {
    let options = EvaluateOptions {
        reset_on_new_run: false,
        ..EvaluateOptions::default()
    };
    let mut formula =
        Formula::with_options(call("init", vec![ident("x")]), options).with_parameter("x", 1);
    formula.evaluate_at(at(3)).await.unwrap();

    formula.set_parameter("x", 2);
    assert_eq!(formula.evaluate_at(at(0)).await, Ok(Value::Integer(1)));
}

#[tokio::test]
async fn test_smth1_converges_monotonically() {
    let formula = Formula::new(call("smth1", vec![float(10.0), float(4.0), float(0.0)]));

    let mut previous = as_f64(formula.evaluate_at(at(0)).await.unwrap());
    assert_eq!(previous, 0.0);

    let first = as_f64(formula.evaluate_at(at(1)).await.unwrap());
    assert_eq!(first, 2.5);
    previous = first;

    for step in 2..200 {
        let output = as_f64(formula.evaluate_at(at(step)).await.unwrap());
        assert!(output >= previous, "step {}: {} < {}", step, output, previous);
        assert!(output <= 10.0);
        previous = output;
    }
    assert!((previous - 10.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_smoothing_integrates_once_per_step() {
    let formula = Formula::new(call("smth1", vec![float(10.0), float(2.0), float(0.0)]));

    formula.evaluate_at(at(0)).await.unwrap();
    let once = formula.evaluate_at(at(1)).await.unwrap();
    let again = formula.evaluate_at(at(1)).await.unwrap();
    assert_eq!(once, Value::Float(5.0));
    assert_eq!(again, once);
}

#[tokio::test]
async fn test_smoothing_starts_at_input_without_initial_value() {
    let formula = Formula::new(call("smth3", vec![float(6.0), float(3.0)]));
    assert_eq!(formula.evaluate_at(at(0)).await, Ok(Value::Float(6.0)));
    assert_eq!(formula.evaluate_at(at(1)).await, Ok(Value::Float(6.0)));
}

#[tokio::test]
async fn test_smth3_lags_behind_smth1() {
    let first = Formula::new(call("smth1", vec![float(1.0), float(6.0), float(0.0)]));
    let third = Formula::new(call("smth3", vec![float(1.0), float(6.0), float(0.0)]));

    for step in 0..3 {
        first.evaluate_at(at(step)).await.unwrap();
        third.evaluate_at(at(step)).await.unwrap();
    }
    let first = as_f64(first.evaluate_at(at(3)).await.unwrap());
    let third = as_f64(third.evaluate_at(at(3)).await.unwrap());
    assert!(third < first, "{} should lag {}", third, first);
}

#[tokio::test]
async fn test_smthn_order() {
    let formula = Formula::new(call(
        "smthN",
        vec![float(4.0), float(2.0), int(2), float(0.0)],
    ));
    assert_eq!(formula.evaluate_at(at(0)).await, Ok(Value::Float(0.0)));
    // alpha = 1 * 2 / 2: each stage copies its upstream value
    assert_eq!(formula.evaluate_at(at(1)).await, Ok(Value::Float(0.0)));
    assert_eq!(formula.evaluate_at(at(2)).await, Ok(Value::Float(4.0)));

    let formula = Formula::new(call("smthN", vec![float(4.0), float(2.0), int(0)]));
    assert!(matches!(
        formula.evaluate_at(at(0)).await,
        Err(EvalError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn test_smthn_rejects_huge_order() {
    for order in [i64::MAX, 65] {
        let formula = Formula::new(call("smthN", vec![float(1.0), float(2.0), int(order)]));
        assert!(matches!(
            formula.evaluate_at(at(0)).await,
            Err(EvalError::InvalidArgument { .. })
        ));
    }

    let formula = Formula::new(call("smthN", vec![float(1.0), float(2.0), int(64)]));
    assert_eq!(formula.evaluate_at(at(0)).await, Ok(Value::Float(1.0)));
}
