//! Simulation driver.
//!
//! Owns the grid, the particles and the chosen solver for the lifetime
//! of a run, and keeps the clock.

use grove_grid::Grid;
use grove_types::GroveResult;

use crate::particles::ParticleSet;
use crate::strategy::{SolverStrategy, StepReport};

pub struct Simulation<const D: usize> {
    pub grid: Grid<D>,
    pub particles: ParticleSet<D>,
    solver: Box<dyn SolverStrategy<D>>,
    time: f64,
    steps: u64,
}

impl<const D: usize> Simulation<D> {
    pub fn new(grid: Grid<D>, particles: ParticleSet<D>, solver: Box<dyn SolverStrategy<D>>) -> Self {
        Self {
            grid,
            particles,
            solver,
            time: 0.0,
            steps: 0,
        }
    }

    /// Advances one step and the clock by the step's `Δt`.
    pub fn advance(&mut self) -> GroveResult<StepReport> {
        let report = self.solver.step(&mut self.grid, &mut self.particles)?;
        self.time += report.dt;
        self.steps += 1;
        tracing::debug!(
            step = self.steps,
            time = self.time,
            dt = report.dt,
            solver = self.solver.name(),
            "step complete"
        );
        Ok(report)
    }

    /// Steps until `end_time`, calling `on_step` after every step.
    pub fn run_until<F>(&mut self, end_time: f64, mut on_step: F) -> GroveResult<()>
    where
        F: FnMut(&Self, &StepReport) -> GroveResult<()>,
    {
        while self.time < end_time {
            let report = self.advance()?;
            on_step(self, &report)?;
        }
        Ok(())
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of completed steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }
}
