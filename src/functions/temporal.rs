//! Clock-driven functions with per-node memory.
//!
//! Each node keeps its memory in the formula's [`StateStore`], keyed by the
//! call's [`NodeId`]. Smoothing integrates once per clock step; repeated
//! evaluations within a step read the stored stages.
//!
//! [`StateStore`]: crate::state::StateStore

use rand::Rng;
use tracing::{debug, trace};

use crate::ast::NodeId;
use crate::context::{Argument, EvaluationContext, SharedRng};
use crate::state::{StepProgress, TemporalState};
use crate::value::Value;
use crate::{EvalError, EvalResult};

use super::Builtin;

/// Largest stage count `smthN` accepts.
pub const MAX_SMOOTHING_ORDER: usize = 64;

pub(crate) async fn call(
    builtin: Builtin,
    id: NodeId,
    args: &[Argument],
    context: &EvaluationContext,
) -> EvalResult<Value> {
    let progress = context
        .state
        .begin_call(id, &context.clock, context.options.reset_on_new_run);
    trace!("{}{} called, clock {:?}", builtin, id, progress);

    match builtin {
        Builtin::Ramp => {
            let t = current_time(context)?;
            let slope = args[0].evaluate_f64().await?;
            let start = args[1].evaluate_f64().await?;
            let end = match args.get(2) {
                Some(end) => Some(end.evaluate_f64().await?),
                None => None,
            };
            Ok(Value::Float(ramp(t, slope, start, end)))
        }
        Builtin::Step => {
            let t = current_time(context)?;
            let height = args[0].evaluate_f64().await?;
            let at = args[1].evaluate_f64().await?;
            Ok(Value::Float(if t >= at { height } else { 0.0 }))
        }
        Builtin::Pulse => {
            let t = current_time(context)?;
            let start = args[0].evaluate_f64().await?;
            let width = args[1].evaluate_f64().await?;
            let interval = match args.get(2) {
                Some(interval) => interval.evaluate_f64().await?,
                None => 0.0,
            };
            let on = pulse(t, start, width, interval, delta_time(context));
            Ok(Value::Float(if on { 1.0 } else { 0.0 }))
        }
        Builtin::Normal => {
            let mean = args[0].evaluate_f64().await?;
            let std_dev = args[1].evaluate_f64().await?;
            let mut sample = draw_normal(&context.rng, mean, std_dev)?;
            if args.len() == 4 {
                let lo = args[2].evaluate_f64().await?;
                let hi = args[3].evaluate_f64().await?;
                sample = sample.max(lo).min(hi);
            }
            Ok(Value::Float(sample))
        }
        Builtin::Smth1 => smooth(id, args, 1, args.get(2), progress, context).await,
        Builtin::Smth3 => smooth(id, args, 3, args.get(2), progress, context).await,
        Builtin::SmthN => {
            let order = smoothing_order(args[2].evaluate().await?.to_i64()?)?;
            smooth(id, args, order, args.get(3), progress, context).await
        }
        Builtin::Init => {
            if let TemporalState::Init(frozen) = context.state.temporal(id) {
                return Ok(frozen);
            }
            let value = args[0].evaluate().await?;
            debug!("init{} frozen at {:?}", id, value);
            context
                .state
                .set_temporal(id, TemporalState::Init(value.clone()));
            Ok(value)
        }
        Builtin::ExternalUpdate => {
            let value = match context.state.injected(id) {
                Some(injected) => injected,
                None => args[0].evaluate().await?,
            };
            context.state.set_external(id, value.clone());
            Ok(value)
        }
        Builtin::Value => {
            let value = args[0].evaluate().await?;
            context.state.set_external(id, value.clone());
            Ok(value)
        }
        _ => Err(EvalError::internal(format!(
            "{} is not a temporal function",
            builtin
        ))),
    }
}

fn current_time(context: &EvaluationContext) -> EvalResult<f64> {
    context
        .clock
        .time
        .map(|t| t as f64)
        .ok_or(EvalError::ClockUnavailable("time"))
}

fn delta_time(context: &EvaluationContext) -> f64 {
    context
        .clock
        .delta_time
        .unwrap_or(context.options.default_delta_time)
}

fn ramp(t: f64, slope: f64, start: f64, end: Option<f64>) -> f64 {
    if t < start {
        return 0.0;
    }
    let until = end.map_or(t, |end| t.min(end));
    slope * (until - start).max(0.0)
}

fn pulse(t: f64, start: f64, width: f64, interval: f64, dt: f64) -> bool {
    if t < start {
        return false;
    }
    let width = if width <= 0.0 { dt } else { width };
    let mut elapsed = t - start;
    if interval > 0.0 {
        elapsed %= interval;
    }
    elapsed < width
}

fn draw_normal(rng: &SharedRng, mean: f64, std_dev: f64) -> EvalResult<f64> {
    let mut rng = rng
        .lock()
        .map_err(|_| EvalError::internal("random source lock poisoned"))?;
    // gen() is in [0, 1); flip it so ln never sees zero
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    Ok(mean + std_dev * z)
}

async fn smooth(
    id: NodeId,
    args: &[Argument],
    order: usize,
    initial: Option<&Argument>,
    progress: StepProgress,
    context: &EvaluationContext,
) -> EvalResult<Value> {
    let input = args[0].evaluate_f64().await?;
    let delay = args[1].evaluate_f64().await?;

    let stages = match context.state.temporal(id) {
        TemporalState::Smoothing(mut stages) if stages.len() == order => {
            if progress.should_integrate() {
                let alpha = smoothing_alpha(delta_time(context), delay, order);
                integrate(&mut stages, input, alpha);
            }
            stages
        }
        _ => {
            let start = match initial {
                Some(initial) => initial.evaluate_f64().await?,
                None => input,
            };
            debug!("smoothing{} starts at {} over {} stage(s)", id, start, order);
            vec![start; order]
        }
    };

    let output = stages.last().copied().unwrap_or(input);
    context
        .state
        .set_temporal(id, TemporalState::Smoothing(stages));
    Ok(Value::Float(output))
}

fn smoothing_order(order: i64) -> EvalResult<usize> {
    match usize::try_from(order) {
        Ok(order) if (1..=MAX_SMOOTHING_ORDER).contains(&order) => Ok(order),
        _ => Err(EvalError::invalid_argument(
            "smthN",
            format!(
                "order must be between 1 and {}, got {}",
                MAX_SMOOTHING_ORDER, order
            ),
        )),
    }
}

fn smoothing_alpha(dt: f64, delay: f64, order: usize) -> f64 {
    if delay <= 0.0 {
        return 1.0;
    }
    (dt * order as f64 / delay).clamp(0.0, 1.0)
}

/// Moves every stage toward its upstream value. Stages update from last to
/// first so each one reads its upstream value from the previous step.
fn integrate(stages: &mut [f64], input: f64, alpha: f64) {
    for k in (0..stages.len()).rev() {
        let upstream = if k == 0 { input } else { stages[k - 1] };
        stages[k] += alpha * (upstream - stages[k]);
    }
}
