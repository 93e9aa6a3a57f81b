use pretty_assertions::assert_eq;
use simcalc::{BinaryOperator as Op, Clock, Expression, Formula, Value};

use crate::{call, ident, int};

#[tokio::test]
async fn test_value_publishes_its_result() {
    let formula = Formula::new(Expression::binary(
        Op::Times,
        call("value", vec![Expression::binary(Op::Plus, ident("x"), int(1))]),
        int(10),
    ))
    .with_parameter("x", 4);
    let id = formula.find_calls("value")[0];

    assert_eq!(formula.external_value(id), None);
    assert_eq!(formula.evaluate().await, Ok(Value::Integer(50)));
    assert_eq!(formula.external_value(id), Some(Value::Integer(5)));
}

#[tokio::test]
async fn test_external_update_falls_back_to_its_argument() {
    let formula = Formula::new(call("externalUpdate", vec![int(3)]));
    let id = formula.find_calls("externalUpdate")[0];

    assert_eq!(formula.evaluate_at(Clock::new(0, 0, 1.0)).await, Ok(Value::Integer(3)));
    assert_eq!(formula.external_value(id), Some(Value::Integer(3)));
}

#[tokio::test]
async fn test_injected_value_replaces_fallback() {
    let formula = Formula::new(Expression::binary(
        Op::Plus,
        call("externalUpdate", vec![int(3)]),
        int(1),
    ));
    let id = formula.find_calls("externalupdate")[0];

    formula.inject_external(id, 40);
    assert_eq!(formula.evaluate_at(Clock::new(0, 0, 1.0)).await, Ok(Value::Integer(41)));

    formula.inject_external(id, 1.5);
    assert_eq!(formula.evaluate_at(Clock::new(1, 1, 1.0)).await, Ok(Value::Float(2.5)));

    formula.reset_node(id);
    assert_eq!(formula.evaluate_at(Clock::new(2, 2, 1.0)).await, Ok(Value::Integer(4)));
}

#[tokio::test]
async fn test_nodes_are_distinct() {
    let formula = Formula::new(Expression::binary(
        Op::Minus,
        call("init", vec![ident("x")]),
        call("init", vec![ident("x")]),
    ))
    .with_parameter("x", 2);

    let ids = formula.find_calls("init");
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(formula.evaluate().await, Ok(Value::Integer(0)));
}

#[tokio::test]
async fn test_external_update_tracks_its_argument_until_injected() {
    let mut formula = Formula::new(call("externalUpdate", vec![ident("x")])).with_parameter("x", 1);
    let id = formula.find_calls("externalUpdate")[0];

    assert_eq!(formula.evaluate_at(Clock::new(0, 0, 1.0)).await, Ok(Value::Integer(1)));

    formula.set_parameter("x", 2);
    assert_eq!(formula.evaluate_at(Clock::new(1, 1, 1.0)).await, Ok(Value::Integer(2)));
    assert_eq!(formula.external_value(id), Some(Value::Integer(2)));

    formula.inject_external(id, 7);
    formula.set_parameter("x", 3);
    assert_eq!(formula.evaluate_at(Clock::new(2, 2, 1.0)).await, Ok(Value::Integer(7)));
    assert_eq!(formula.external_value(id), Some(Value::Integer(7)));
}

#[tokio::test]
async fn test_injection_survives_a_new_run() {
    let formula = Formula::new(call("externalUpdate", vec![int(3)]));
    let id = formula.find_calls("externalUpdate")[0];

    let mut clock = Clock::new(0, 0, 1.0);
    for _ in 0..5 {
        assert_eq!(formula.evaluate_at(clock).await, Ok(Value::Integer(3)));
        clock = clock.tick();
    }

    formula.inject_external(id, 99);
    assert_eq!(formula.evaluate_at(Clock::new(0, 0, 1.0)).await, Ok(Value::Integer(99)));

    formula.reset_state();
    assert_eq!(formula.evaluate_at(Clock::new(0, 0, 1.0)).await, Ok(Value::Integer(3)));
}
