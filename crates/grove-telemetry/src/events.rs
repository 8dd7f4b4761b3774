//! Simulation event types.
//!
//! Structured events emitted by the runner at various points in each
//! step. Events are lightweight value types that carry just enough data
//! to be useful for monitoring and debugging.

use serde::{Deserialize, Serialize};

/// A simulation event, tagged with the step it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Step number (0-indexed).
    pub step: u64,
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Step started.
    StepBegin {
        /// Simulation time at the start of the step (seconds).
        sim_time: f64,
        dt: f64,
    },

    /// Step completed.
    StepEnd {
        /// Wall-clock time for the step (seconds).
        wall_time: f64,
    },

    /// One Newton iteration of the implicit solver.
    NewtonIteration { iteration: u32, residual: f64 },

    /// Newton summary for the step.
    Convergence {
        iterations: u32,
        final_residual: f64,
        converged: bool,
    },

    /// Total particle kinetic energy `Σ ½ m |v|²`.
    Energy { kinetic: f64 },

    /// Norm of the total particle momentum.
    Momentum { norm: f64 },

    /// A frame was handed to an export sink.
    Export { path: String, frame: usize },

    /// Custom event for extensibility.
    Custom {
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl SimulationEvent {
    pub fn new(step: u64, kind: EventKind) -> Self {
        Self { step, kind }
    }
}
