//! Builtin function table.
//!
//! Names resolve through [`Builtin`]; the canonical spelling is the one a
//! case-sensitive formula must use.

use core::fmt;
use std::str::FromStr;

use strum::{Display, EnumString};

use crate::ast::FunctionCall;
use crate::context::{Argument, EvaluationContext};
use crate::value;
use crate::{EvalError, EvalResult};

pub mod math;
pub mod temporal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Builtin {
    #[strum(serialize = "Abs")]
    Abs,
    #[strum(serialize = "Arccos")]
    Arccos,
    #[strum(serialize = "Arcsin")]
    Arcsin,
    #[strum(serialize = "Arctan")]
    Arctan,
    #[strum(serialize = "Ceiling")]
    Ceiling,
    #[strum(serialize = "Cos")]
    Cos,
    #[strum(serialize = "Exp")]
    Exp,
    #[strum(serialize = "Floor")]
    Floor,
    #[strum(serialize = "IEEERemainder")]
    IeeeRemainder,
    #[strum(serialize = "Ln")]
    Ln,
    #[strum(serialize = "Log")]
    Log,
    #[strum(serialize = "Log10")]
    Log10,
    #[strum(serialize = "Pow")]
    Pow,
    #[strum(serialize = "Round")]
    Round,
    #[strum(serialize = "Safediv")]
    Safediv,
    #[strum(serialize = "Sign")]
    Sign,
    #[strum(serialize = "Sin")]
    Sin,
    #[strum(serialize = "Sqrt")]
    Sqrt,
    #[strum(serialize = "Tan")]
    Tan,
    #[strum(serialize = "Truncate")]
    Truncate,
    #[strum(serialize = "Max")]
    Max,
    #[strum(serialize = "Min")]
    Min,
    #[strum(serialize = "if")]
    If,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "value")]
    Value,
    #[strum(serialize = "init")]
    Init,
    #[strum(serialize = "externalUpdate")]
    ExternalUpdate,
    #[strum(serialize = "ramp")]
    Ramp,
    #[strum(serialize = "step")]
    Step,
    #[strum(serialize = "pulse")]
    Pulse,
    #[strum(serialize = "normal")]
    Normal,
    #[strum(serialize = "smth1")]
    Smth1,
    #[strum(serialize = "smth3")]
    Smth3,
    #[strum(serialize = "smthN")]
    SmthN,
}

/// Accepted argument counts of a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    OneOf(&'static [usize]),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == *n,
            Arity::OneOf(counts) => counts.contains(&count),
            Arity::AtLeast(n) => count >= *n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::OneOf(counts) => {
                let counts: Vec<String> = counts.iter().map(|c| c.to_string()).collect();
                write!(f, "{}", counts.join(" or "))
            }
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

impl Builtin {
    /// Resolves a call name, enforcing the canonical casing unless
    /// `ignore_case` is set.
    pub fn resolve(name: &str, ignore_case: bool) -> EvalResult<Self> {
        let builtin = Builtin::from_str(name).map_err(|_| EvalError::FunctionNotFound {
            name: name.to_string(),
            hint: None,
        })?;
        let canonical = builtin.to_string();
        if !ignore_case && canonical != name {
            return Err(EvalError::FunctionNotFound {
                name: name.to_string(),
                hint: Some(canonical),
            });
        }
        Ok(builtin)
    }

    pub fn arity(&self) -> Arity {
        use Builtin::*;
        match self {
            Abs | Arccos | Arcsin | Arctan | Ceiling | Cos | Exp | Floor | Ln | Log10 | Sign
            | Sin | Sqrt | Tan | Truncate => Arity::Exactly(1),
            IeeeRemainder | Log | Pow | Round | Max | Min => Arity::Exactly(2),
            Safediv => Arity::OneOf(&[2, 3]),
            If => Arity::Exactly(3),
            In => Arity::AtLeast(2),
            Value | Init | ExternalUpdate => Arity::Exactly(1),
            Ramp | Pulse | Smth1 | Smth3 => Arity::OneOf(&[2, 3]),
            Step => Arity::Exactly(2),
            Normal => Arity::OneOf(&[2, 4]),
            SmthN => Arity::OneOf(&[3, 4]),
        }
    }

    /// Functions that read the clock or keep per-node memory.
    pub fn is_temporal(&self) -> bool {
        use Builtin::*;
        matches!(
            self,
            Value | Init | ExternalUpdate | Ramp | Step | Pulse | Normal | Smth1 | Smth3 | SmthN
        )
    }

    pub fn check_arity(&self, count: usize) -> EvalResult<()> {
        let arity = self.arity();
        if arity.accepts(count) {
            Ok(())
        } else {
            Err(EvalError::ArityMismatch {
                function: self.to_string(),
                expected: arity.to_string(),
                actual: count,
            })
        }
    }
}

/// Evaluates a call no extension claimed.
pub(crate) async fn call(
    call: &FunctionCall,
    arguments: &[Argument],
    context: &EvaluationContext,
) -> EvalResult<value::Value> {
    let builtin = Builtin::resolve(&call.name, context.options.ignore_case)?;
    builtin.check_arity(arguments.len())?;
    if builtin.is_temporal() {
        temporal::call(builtin, call.id, arguments, context).await
    } else {
        math::call(builtin, arguments, context.options()).await
    }
}
