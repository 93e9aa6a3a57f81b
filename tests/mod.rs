mod evaluation_tests;

use simcalc::{Expression, Formula, Value};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub fn int(i: i64) -> Expression {
    Expression::value(i)
}

pub fn float(x: f64) -> Expression {
    Expression::value(x)
}

pub fn ident(name: &str) -> Expression {
    Expression::identifier(name)
}

pub fn call(name: &str, arguments: Vec<Expression>) -> Expression {
    Expression::call(name, arguments)
}

pub async fn eval(expr: Expression) -> simcalc::EvalResult<Value> {
    Formula::new(expr).evaluate().await
}
