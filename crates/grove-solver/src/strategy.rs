//! Solver strategy trait: the core abstraction for time integration.
//!
//! Every integrator implements this trait, enabling the simulation
//! driver to swap between explicit, total-Lagrangian and implicit
//! solvers at runtime.

use grove_grid::Grid;
use grove_types::GroveResult;

use crate::particles::ParticleSet;

/// Result of a solver step.
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    /// Timestep actually taken.
    pub dt: f64,
    /// Newton iterations performed (0 for explicit schemes).
    pub iterations: u32,
    /// Final residual norm (0 for explicit schemes).
    pub residual: f64,
    /// Whether the nonlinear solve met its tolerance.
    pub converged: bool,
    /// Timestep reductions before the step was accepted.
    pub retries: u32,
    /// Wall-clock time for this step (seconds).
    pub wall_time: f64,
    /// Newton residual norms, starting with the initial residual.
    pub residual_history: Vec<f64>,
}

/// Trait for time integration solvers.
///
/// The driver calls `step` repeatedly:
///
/// ```text
/// loop {
///     let report = solver.step(&mut grid, &mut particles)?;
///     time += report.dt;
/// }
/// ```
///
/// # Implementations
///
/// - [`ExplicitSolver`](crate::explicit::ExplicitSolver): FLIP / APIC / TPIC
/// - [`TotalLagrangianSolver`](crate::total_lagrangian::TotalLagrangianSolver): reference-configuration weights
/// - [`ImplicitSolver`](crate::implicit::ImplicitSolver): Newmark-β with Newton
pub trait SolverStrategy<const D: usize>: Send {
    /// Advance the simulation by one timestep.
    ///
    /// Support and inversion errors abort the step and leave the
    /// particle state partially updated; the caller should stop.
    fn step(&mut self, grid: &mut Grid<D>, particles: &mut ParticleSet<D>) -> GroveResult<StepReport>;

    /// Returns the solver's name.
    fn name(&self) -> &str;
}
