use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

use crate::{EvalError, EvalResult};

/// Evaluation switches shared by a formula and everything it evaluates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateOptions {
    /// Match identifiers and function names case-insensitively.
    #[serde(default)]
    pub ignore_case: bool,

    /// Midpoint rule of `Round`: away from zero instead of to even.
    #[serde(default)]
    pub round_away_from_zero: bool,

    /// Reset a temporal node's state when the clock step goes backwards.
    #[serde(default = "default_true")]
    pub reset_on_new_run: bool,

    /// Seed of the random source used by `normal`. Entropy when absent.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Delta-time used by temporal functions when the clock carries none.
    #[serde(default = "default_delta_time")]
    pub default_delta_time: f64,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            ignore_case: false,
            round_away_from_zero: false,
            reset_on_new_run: default_true(),
            random_seed: None,
            default_delta_time: default_delta_time(),
        }
    }
}

impl EvaluateOptions {
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn round_away_from_zero(mut self) -> Self {
        self.round_away_from_zero = true;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> EvalResult<Self> {
        from_file(path)
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> EvalResult<T> {
    let file = File::open(path)
        .map_err(|e| EvalError::Config(format!("Failed to open options file: {}", e)))?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|e| EvalError::Config(format!("Failed to parse options file: {}", e)))?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> EvalResult<T> {
    let config = serde_json::from_str(s)
        .map_err(|e| EvalError::Config(format!("Failed to parse options: {}", e)))?;
    Ok(config)
}

fn default_true() -> bool {
    true
}

fn default_delta_time() -> f64 {
    1.0
}
