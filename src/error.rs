use thiserror::Error;

use crate::value::{Value, ValueType};

/// Failure outcomes of an evaluation walk.
///
/// Every variant is terminal: the walk unwinds to the caller of
/// [`Formula::evaluate`](crate::Formula::evaluate) without retrying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Cannot convert {value:?} to {target}")]
    TypeCoercion { value: Value, target: ValueType },

    #[error("{function}() takes {expected} argument(s), got {actual}")]
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("Function not found: {name}{}", hint_suffix(.hint))]
    FunctionNotFound { name: String, hint: Option<String> },

    #[error("Parameter was not defined: {0}")]
    ParameterNotDefined(String),

    #[error("Evaluation cancelled")]
    Cancelled,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid argument for {function}(): {message}")]
    InvalidArgument { function: String, message: String },

    #[error("Clock field not available: {0}")]
    ClockUnavailable(&'static str),

    #[error("Extension handler failed: {0}")]
    Handler(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!(". Try {} instead.", h))
        .unwrap_or_default()
}

impl EvalError {
    pub fn coercion(value: &Value, target: ValueType) -> Self {
        EvalError::TypeCoercion {
            value: value.clone(),
            target,
        }
    }

    pub fn invalid_argument<S: Into<String>>(function: &str, message: S) -> Self {
        EvalError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }

    pub fn handler<S: Into<String>>(message: S) -> Self {
        EvalError::Handler(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        EvalError::Internal(message.into())
    }
}
