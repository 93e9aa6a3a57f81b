use pretty_assertions::assert_eq;
use simcalc::{Clock, EvalError, EvaluateOptions, Expression, Formula, Value};

use crate::{call, float, int};

async fn sample(expr: Expression, times: std::ops::Range<u64>) -> Vec<Value> {
    let formula = Formula::new(expr);
    let mut values = Vec::new();
    for t in times {
        values.push(formula.evaluate_at(Clock::new(t, t, 1.0)).await.unwrap());
    }
    values
}

fn floats(values: &[f64]) -> Vec<Value> {
    values.iter().copied().map(Value::Float).collect()
}

#[tokio::test]
async fn test_ramp() {
    let values = sample(call("ramp", vec![float(2.0), int(3)]), 0..7).await;
    assert_eq!(values, floats(&[0.0, 0.0, 0.0, 0.0, 2.0, 4.0, 6.0]));

    let values = sample(call("ramp", vec![float(2.0), int(3), int(5)]), 0..8).await;
    assert_eq!(values, floats(&[0.0, 0.0, 0.0, 0.0, 2.0, 4.0, 4.0, 4.0]));
}

#[tokio::test]
async fn test_step() {
    let values = sample(call("step", vec![float(5.0), int(2)]), 0..4).await;
    assert_eq!(values, floats(&[0.0, 0.0, 5.0, 5.0]));
}

#[tokio::test]
async fn test_pulse() {
    let values = sample(call("pulse", vec![int(1), int(2)]), 0..5).await;
    assert_eq!(values, floats(&[0.0, 1.0, 1.0, 0.0, 0.0]));

    let values = sample(call("pulse", vec![int(1), int(1), int(3)]), 0..8).await;
    assert_eq!(values, floats(&[0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]));
}

#[tokio::test]
async fn test_temporal_functions_need_a_clock() {
    let formula = Formula::new(call("ramp", vec![int(1), int(0)]));
    assert_eq!(
        formula.evaluate().await,
        Err(EvalError::ClockUnavailable("time"))
    );
}

#[tokio::test]
async fn test_seeded_normal_is_reproducible() {
    let draw = || {
        Formula::with_options(
            call("normal", vec![float(100.0), float(15.0)]),
            EvaluateOptions::default().with_seed(2024),
        )
    };

    let a = draw();
    let b = draw();
    for t in 0..20 {
        let clock = Clock::new(t, t, 1.0);
        assert_eq!(a.evaluate_at(clock).await, b.evaluate_at(clock).await);
    }
}

#[tokio::test]
async fn test_normal_is_clamped() {
    let formula = Formula::with_options(
        call("normal", vec![float(0.0), float(50.0), float(-1.0), float(1.0)]),
        EvaluateOptions::default().with_seed(7),
    );
    for t in 0..50 {
        let Value::Float(x) = formula.evaluate_at(Clock::new(t, t, 1.0)).await.unwrap() else {
            panic!("normal should produce a float");
        };
        assert!((-1.0..=1.0).contains(&x), "{} escaped the bounds", x);
    }
}
