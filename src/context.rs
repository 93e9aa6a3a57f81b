use core::fmt;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rust_decimal::Decimal;

use crate::ast::Expression;
use crate::cancel::CancelSignal;
use crate::clock::Clock;
use crate::config::EvaluateOptions;
use crate::eval::evaluator::ExpressionEvaluator;
use crate::extension::Extensions;
use crate::formula::Formula;
use crate::state::StateStore;
use crate::value::Value;
use crate::EvalResult;

pub type SharedRng = Arc<Mutex<StdRng>>;

/// A binding: either a literal or a nested formula evaluated by name.
#[derive(Debug, Clone)]
pub enum Parameter {
    Value(Value),
    Formula(Formula),
}

/// Insertion-ordered binding environment.
pub type Parameters = IndexMap<String, Parameter>;

impl From<Value> for Parameter {
    fn from(value: Value) -> Self {
        Parameter::Value(value)
    }
}

impl From<Formula> for Parameter {
    fn from(formula: Formula) -> Self {
        Parameter::Formula(formula)
    }
}

impl From<bool> for Parameter {
    fn from(b: bool) -> Self {
        Parameter::Value(b.into())
    }
}

impl From<i32> for Parameter {
    fn from(i: i32) -> Self {
        Parameter::Value(i.into())
    }
}

impl From<i64> for Parameter {
    fn from(i: i64) -> Self {
        Parameter::Value(i.into())
    }
}

impl From<f64> for Parameter {
    fn from(x: f64) -> Self {
        Parameter::Value(x.into())
    }
}

impl From<Decimal> for Parameter {
    fn from(d: Decimal) -> Self {
        Parameter::Value(d.into())
    }
}

impl From<&str> for Parameter {
    fn from(s: &str) -> Self {
        Parameter::Value(s.into())
    }
}

impl From<String> for Parameter {
    fn from(s: String) -> Self {
        Parameter::Value(s.into())
    }
}

/// Everything one evaluation walk reads.
pub struct EvaluationContext {
    pub(crate) options: EvaluateOptions,
    pub(crate) clock: Clock,
    pub(crate) parameters: Parameters,
    pub(crate) extensions: Extensions,
    pub(crate) state: Arc<StateStore>,
    pub(crate) rng: SharedRng,
    pub(crate) cancel: CancelSignal,
}

impl EvaluationContext {
    pub fn options(&self) -> &EvaluateOptions {
        &self.options
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Exact name first, then case-folded when `ignore_case` is set.
    pub fn lookup_parameter(&self, name: &str) -> Option<&Parameter> {
        if let Some(parameter) = self.parameters.get(name) {
            return Some(parameter);
        }
        if !self.options.ignore_case {
            return None;
        }
        let folded = name.to_lowercase();
        self.parameters
            .iter()
            .find(|(key, _)| key.to_lowercase() == folded)
            .map(|(_, parameter)| parameter)
    }
}

/// An unevaluated argument bound to the walk that produced it.
///
/// Functions and extension handlers decide whether and when to evaluate.
#[derive(Clone)]
pub struct Argument {
    expression: Arc<Expression>,
    context: Arc<EvaluationContext>,
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Argument")
            .field("expression", &self.expression)
            .finish_non_exhaustive()
    }
}

impl Argument {
    pub(crate) fn new(expression: Arc<Expression>, context: Arc<EvaluationContext>) -> Self {
        Self {
            expression,
            context,
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    pub async fn evaluate(&self) -> EvalResult<Value> {
        ExpressionEvaluator::new()
            .eval_expression(&self.expression, self.context.clone())
            .await
    }

    pub(crate) async fn evaluate_f64(&self) -> EvalResult<f64> {
        self.evaluate().await?.to_f64()
    }
}
