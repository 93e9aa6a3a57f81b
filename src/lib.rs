//! # simcalc: async expression evaluation for simulation models
//!
//! simcalc evaluates expression trees over numbers, booleans and text with
//! host-supplied bindings, asynchronous extension handlers, a builtin math
//! library and clock-driven temporal functions.
//!
//! ## Building blocks
//!
//! - Expression trees ([`ast`]) and runtime values ([`value`])
//! - Numeric promotion ([`numbers`]) and comparison coercion ([`coercion`])
//! - The async tree walker ([`eval`]) and its context ([`context`])
//! - Extension chains for identifiers and functions ([`extension`])
//! - Builtin and temporal functions ([`functions`]) with per-node memory
//!   ([`state`]) driven by a simulation [`clock`]
//!
//! ## Usage
//!
//! ```no_run
//! use simcalc::{BinaryOperator, Clock, Expression, Formula};
//!
//! # async fn run() -> simcalc::EvalResult<()> {
//! let expr = Expression::binary(
//!     BinaryOperator::Plus,
//!     Expression::identifier("stock"),
//!     Expression::call("smth1", vec![Expression::identifier("inflow"), Expression::value(4)]),
//! );
//! let formula = Formula::new(expr)
//!     .with_parameter("stock", 100)
//!     .with_parameter("inflow", 8.0);
//!
//! let mut clock = Clock::new(0, 0, 1.0);
//! for _ in 0..10 {
//!     let value = formula.evaluate_at(clock).await?;
//!     println!("{}", value);
//!     clock = clock.tick();
//! }
//! # Ok(())
//! # }
//! ```

pub mod ast;
pub mod cancel;
pub mod clock;
pub mod coercion;
pub mod config;
pub mod context;
pub mod error;
pub mod eval;
pub mod extension;
pub mod formula;
pub mod functions;
pub mod numbers;
pub mod state;
pub mod value;

// Re-exports
pub use ast::*;
pub use cancel::{CancelHandle, CancelSignal};
pub use clock::Clock;
pub use config::EvaluateOptions;
pub use context::{Argument, EvaluationContext, Parameter, Parameters};
pub use error::*;
pub use eval::ExpressionEvaluator;
pub use extension::{
    Extensions, FunctionArgs, FunctionFn, FunctionResolver, ParameterArgs, ParameterFn,
    ParameterResolver,
};
pub use formula::Formula;
pub use functions::{Arity, Builtin};
pub use state::{NodeState, StateStore, StepProgress, TemporalState};
pub use value::{Value, ValueType};
