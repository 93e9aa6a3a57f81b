use std::cmp::Ordering;
use std::sync::Arc;

use async_recursion::async_recursion;
use tracing::{debug, trace};

use crate::ast::{BinaryOperator, Expression, FunctionCall, UnaryOperator};
use crate::context::{Argument, EvaluationContext, Parameter};
use crate::value::Value;
use crate::{coercion, functions, numbers, EvalError, EvalResult};

const TIME_SUFFIX: &str = "_Time";
const DELTA_TIME_SUFFIX: &str = "_Dt";

/// Lazily evaluated operand of a binary operator.
///
/// The first access evaluates the expression; later accesses reuse it.
struct Operand<'a> {
    expression: &'a Expression,
    value: Option<Value>,
}

impl<'a> Operand<'a> {
    fn new(expression: &'a Expression) -> Self {
        Self {
            expression,
            value: None,
        }
    }

    async fn get(
        &mut self,
        evaluator: &ExpressionEvaluator,
        context: &Arc<EvaluationContext>,
    ) -> EvalResult<&Value> {
        if self.value.is_none() {
            let value = evaluator
                .eval_expression(self.expression, context.clone())
                .await?;
            self.value = Some(value);
        }
        self.value
            .as_ref()
            .ok_or_else(|| EvalError::internal("operand memo is empty"))
    }
}

pub struct ExpressionEvaluator;

impl Default for ExpressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    #[async_recursion]
    pub async fn eval_expression(
        &self,
        expr: &Expression,
        context: Arc<EvaluationContext>,
    ) -> EvalResult<Value> {
        match expr {
            Expression::Value(value) => Ok(value.clone()),
            Expression::Identifier(name) => self.eval_identifier(name, context).await,
            Expression::Unary { op, operand } => self.eval_unary(op, operand, context).await,
            Expression::Binary { op, left, right } => {
                self.eval_binary_op(op, left, right, context).await
            }
            Expression::Ternary {
                condition,
                then,
                otherwise,
            } => {
                let branch = if self
                    .eval_expression(condition, context.clone())
                    .await?
                    .to_bool()?
                {
                    then
                } else {
                    otherwise
                };
                self.eval_expression(branch, context).await
            }
            Expression::Function(call) => self.eval_function_call(call, context).await,
        }
    }

    async fn eval_identifier(
        &self,
        name: &str,
        context: Arc<EvaluationContext>,
    ) -> EvalResult<Value> {
        match context.lookup_parameter(name).cloned() {
            Some(Parameter::Value(value)) => return Ok(value),
            Some(Parameter::Formula(formula)) => {
                trace!("evaluating nested formula bound to {}", name);
                let nested =
                    formula.nested_context(context.clock, &context.parameters, context.cancel.clone());
                return self
                    .eval_expression(formula.expression(), Arc::new(nested))
                    .await;
            }
            None => {}
        }

        if has_suffix(name, TIME_SUFFIX, context.options.ignore_case) {
            return Ok(context
                .clock
                .time
                .map(|time| {
                    i64::try_from(time).map_or(Value::Float(time as f64), Value::Integer)
                })
                .unwrap_or_default());
        }
        if has_suffix(name, DELTA_TIME_SUFFIX, context.options.ignore_case) {
            return Ok(context
                .clock
                .delta_time
                .map(Value::Float)
                .unwrap_or_default());
        }

        let lookup = if context.options.ignore_case {
            name.to_lowercase()
        } else {
            name.to_string()
        };
        context
            .extensions
            .resolve_parameter(&lookup, &context.cancel)
            .await?
            .ok_or_else(|| EvalError::ParameterNotDefined(name.to_string()))
    }

    async fn eval_unary(
        &self,
        op: &UnaryOperator,
        operand: &Expression,
        context: Arc<EvaluationContext>,
    ) -> EvalResult<Value> {
        let value = self.eval_expression(operand, context).await?;
        match op {
            UnaryOperator::Not => Ok(Value::Boolean(!value.to_bool()?)),
            UnaryOperator::Negate => numbers::subtract(&Value::Integer(0), &value),
            UnaryOperator::BitwiseNot => Ok(Value::Integer(i64::from(!value.to_u16()?))),
        }
    }

    async fn eval_binary_op(
        &self,
        op: &BinaryOperator,
        left: &Expression,
        right: &Expression,
        context: Arc<EvaluationContext>,
    ) -> EvalResult<Value> {
        let mut left = Operand::new(left);
        let mut right = Operand::new(right);

        match op {
            BinaryOperator::And => {
                let result = left.get(self, &context).await?.to_bool()?
                    && right.get(self, &context).await?.to_bool()?;
                Ok(Value::Boolean(result))
            }
            BinaryOperator::Or => {
                let result = left.get(self, &context).await?.to_bool()?
                    || right.get(self, &context).await?.to_bool()?;
                Ok(Value::Boolean(result))
            }
            BinaryOperator::Plus => {
                let l = left.get(self, &context).await?.clone();
                let r = right.get(self, &context).await?;
                if l.is_string() {
                    Ok(Value::String(format!("{}{}", l, r)))
                } else {
                    numbers::add(&l, r)
                }
            }
            BinaryOperator::Minus => {
                let l = left.get(self, &context).await?.clone();
                numbers::subtract(&l, right.get(self, &context).await?)
            }
            BinaryOperator::Times => {
                let l = left.get(self, &context).await?.clone();
                numbers::multiply(&l, right.get(self, &context).await?)
            }
            BinaryOperator::Div => {
                let l = left.get(self, &context).await?.clone();
                let r = right.get(self, &context).await?;
                if l.is_real() || r.is_real() {
                    numbers::divide(&l, r)
                } else {
                    numbers::divide(&Value::Float(l.to_f64()?), r)
                }
            }
            BinaryOperator::Modulo => {
                let l = left.get(self, &context).await?.clone();
                numbers::modulo(&l, right.get(self, &context).await?)
            }
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::Lesser
            | BinaryOperator::LesserOrEqual
            | BinaryOperator::Greater
            | BinaryOperator::GreaterOrEqual => {
                let l = left.get(self, &context).await?.clone();
                let ordering = coercion::compare(&l, right.get(self, &context).await?)?;
                let result = match op {
                    BinaryOperator::Equal => ordering == Ordering::Equal,
                    BinaryOperator::NotEqual => ordering != Ordering::Equal,
                    BinaryOperator::Lesser => ordering == Ordering::Less,
                    BinaryOperator::LesserOrEqual => ordering != Ordering::Greater,
                    BinaryOperator::Greater => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                Ok(Value::Boolean(result))
            }
            BinaryOperator::BitwiseAnd
            | BinaryOperator::BitwiseOr
            | BinaryOperator::BitwiseXor
            | BinaryOperator::LeftShift
            | BinaryOperator::RightShift => {
                let l = left.get(self, &context).await?.to_u16()?;
                let r = right.get(self, &context).await?.to_u16()?;
                let shift = u32::from(r) & 0x1f;
                let result = match op {
                    BinaryOperator::BitwiseAnd => i64::from(l & r),
                    BinaryOperator::BitwiseOr => i64::from(l | r),
                    BinaryOperator::BitwiseXor => i64::from(l ^ r),
                    BinaryOperator::LeftShift => i64::from(i32::from(l).wrapping_shl(shift)),
                    _ => i64::from(i32::from(l) >> shift),
                };
                Ok(Value::Integer(result))
            }
        }
    }

    async fn eval_function_call(
        &self,
        call: &FunctionCall,
        context: Arc<EvaluationContext>,
    ) -> EvalResult<Value> {
        let arguments: Vec<Argument> = call
            .arguments
            .iter()
            .map(|argument| Argument::new(argument.clone(), context.clone()))
            .collect();

        let name = if context.options.ignore_case {
            call.name.to_lowercase()
        } else {
            call.name.clone()
        };
        let claimed = context
            .extensions
            .resolve_function(&name, arguments.clone(), &context.cancel)
            .await?;

        let result = match claimed {
            Some(value) => value,
            None => functions::call(call, &arguments, &context).await?,
        };
        debug!("{}{} = {:?}", call.name, call.id, result);
        context.state.record_result(call.id, result.clone());
        Ok(result)
    }
}

fn has_suffix(name: &str, suffix: &str, ignore_case: bool) -> bool {
    if name.ends_with(suffix) {
        return true;
    }
    ignore_case
        && name.len() >= suffix.len()
        && name.is_char_boundary(name.len() - suffix.len())
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}
