use serde::{Deserialize, Serialize};

/// External simulation clock driving the temporal functions.
///
/// Every field is optional; the evaluator only reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    pub time: Option<u64>,
    pub step: Option<u64>,
    pub delta_time: Option<f64>,
}

impl Clock {
    pub fn new(time: u64, step: u64, delta_time: f64) -> Self {
        Self {
            time: Some(time),
            step: Some(step),
            delta_time: Some(delta_time),
        }
    }

    /// Clock of the following step: time and step move by one tick.
    pub fn tick(&self) -> Self {
        Self {
            time: self.time.map(|t| t + 1),
            step: self.step.map(|s| s + 1),
            delta_time: self.delta_time,
        }
    }
}
