//! Simulation settings.

use crate::types::DEFAULT_MAX_STEPS;
use serde::{Deserialize, Serialize};

/// Controls how a simulation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Steps executed before the run is reported as undetermined.
    pub max_steps: u64,
    /// Whether tape frames are produced before each step and once at the end.
    pub trace: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            trace: true,
        }
    }
}

impl SimulationConfig {
    /// Returns a copy with a different step budget.
    pub fn with_max_steps(self, max_steps: u64) -> Self {
        Self { max_steps, ..self }
    }

    /// Returns a copy with tracing switched on or off.
    pub fn with_trace(self, trace: bool) -> Self {
        Self { trace, ..self }
    }
}
