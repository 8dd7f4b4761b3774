//! Explicit updated-Lagrangian MPM.
//!
//! Per step:
//! 1. **Timestep**: fixed or CFL-limited
//! 2. **Weights**: refresh at current particle positions
//! 3. **P2G**: mass and momentum (scheme-specific), `f = −V σ ∇N`, body forces
//! 4. **Grid update**: `vⁿ = mv/m`, `v = vⁿ + Δt f/m`, Dirichlet
//! 5. **G2P**: scheme-specific velocity gather and advection
//! 6. **Constitutive update**: `F ← (I + Δt∇v) F`, `V = J V⁰`, Cauchy stress

use std::time::Instant;

use grove_grid::Grid;
use grove_interp::{Interpolation, MpValues};
use grove_material::ConstitutiveModel;
use grove_math::Vector;
use grove_types::GroveResult;

use crate::config::{gravity_vector, ExplicitConfig};
use crate::particles::ParticleSet;
use crate::strategy::{SolverStrategy, StepReport};
use crate::transfer::{p2g_body_force, p2g_internal_force};
use crate::update::update_cauchy_stress;

/// Explicit solver with a pluggable transfer scheme.
pub struct ExplicitSolver<const D: usize> {
    config: ExplicitConfig,
    interpolation: Box<dyn Interpolation<D>>,
    model: Box<dyn ConstitutiveModel<D>>,
    mpvalues: MpValues<D>,
    gravity: Vector<D>,
}

impl<const D: usize> ExplicitSolver<D> {
    /// Creates a solver after validating the configuration against the
    /// chosen interpolation.
    pub fn new(
        config: ExplicitConfig,
        interpolation: Box<dyn Interpolation<D>>,
        model: Box<dyn ConstitutiveModel<D>>,
    ) -> GroveResult<Self> {
        config.validate(interpolation.affine_inertia_factor())?;
        let gravity = gravity_vector::<D>(&config.gravity)?;
        Ok(Self {
            config,
            interpolation,
            model,
            mpvalues: MpValues::new(0),
            gravity,
        })
    }

    pub fn config(&self) -> &ExplicitConfig {
        &self.config
    }

    /// The weights computed during the last step.
    pub fn mpvalues(&self) -> &MpValues<D> {
        &self.mpvalues
    }

    /// Grid momentum update: `vⁿ = mv m⁻¹`, `v = vⁿ + Δt (f + f_ext) m⁻¹`.
    fn update_grid(grid: &mut Grid<D>, dt: f64) {
        grid.update_mass_inverse();
        for i in 0..grid.len() {
            let inv = grid.mass_inv[i];
            let v_prev = grid.momentum[i] * inv;
            grid.velocity_prev[i] = v_prev;
            grid.velocity[i] = v_prev + (grid.force[i] + grid.force_ext[i]) * (dt * inv);
        }
        grid.enforce_dirichlet_velocity();
    }
}

impl<const D: usize> SolverStrategy<D> for ExplicitSolver<D> {
    fn step(&mut self, grid: &mut Grid<D>, particles: &mut ParticleSet<D>) -> GroveResult<StepReport> {
        let start = Instant::now();

        let dt = self.config.timestep.resolve(
            particles,
            &particles.volume,
            self.model.as_ref(),
            grid.spacing(),
        )?;

        if self.mpvalues.len() != particles.len() {
            self.mpvalues = MpValues::new(particles.len());
        }
        self.mpvalues
            .update_all(self.interpolation.as_ref(), &particles.position, grid)?;

        grid.clear();
        let inertia = self.interpolation.affine_inertia_factor();
        self.config
            .transfer
            .scatter_momentum(grid, particles, &self.mpvalues, inertia)?;
        p2g_internal_force(grid, &self.mpvalues, &particles.volume, &particles.stress)?;
        p2g_body_force(grid, particles, &self.mpvalues, &self.gravity)?;

        Self::update_grid(grid, dt);

        self.config
            .transfer
            .gather_velocity_and_advect(grid, particles, &self.mpvalues, dt)?;
        update_cauchy_stress(particles, self.model.as_ref(), dt, self.config.inversion)?;

        Ok(StepReport {
            dt,
            iterations: 0,
            residual: 0.0,
            converged: true,
            retries: 0,
            wall_time: start.elapsed().as_secs_f64(),
            residual_history: Vec::new(),
        })
    }

    fn name(&self) -> &str {
        "explicit"
    }
}
