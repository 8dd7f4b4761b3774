//! Total-Lagrangian MPM.
//!
//! Weights and gradients are evaluated once at the reference positions
//! and kept for the whole run, so particles never cross cells in the
//! discretization and the internal force is written with the first
//! Piola–Kirchhoff stress:
//!
//! ```text
//! f_int,i = −Σ V⁰ P ∇N₀     f_ext,i = m_i b_i
//! v_i = vⁿ_i + Δt (f_int + f_ext) / m_i
//! ```
//!
//! Particle velocities are blended FLIP(α), then remapped to the grid
//! (MUSL) before `F += Δt Σ v_i ⊗ ∇N₀`.

use std::time::Instant;

use grove_grid::Grid;
use grove_interp::{Interpolation, MpValues};
use grove_material::ConstitutiveModel;
use grove_math::Vector;
use grove_types::{GroveError, GroveResult};
use rayon::prelude::*;

use crate::config::{gravity_vector, TotalLagrangianConfig};
use crate::particles::ParticleSet;
use crate::strategy::{SolverStrategy, StepReport};
use crate::timestep::cfl_timestep;
use crate::transfer::{ensure_support, gather, gather_gradient, gather_increment, p2g_internal_force, p2g_mass_momentum};
use crate::update::update_first_piola;

/// Time-dependent body acceleration prescribed on the grid.
///
/// Called at the start of every step with the current simulation time;
/// implementations write `grid.body`.
pub trait GridBodyForce<const D: usize>: Send + Sync {
    fn apply(&self, time: f64, grid: &mut Grid<D>);
}

impl<F, const D: usize> GridBodyForce<D> for F
where
    F: Fn(f64, &mut Grid<D>) + Send + Sync,
{
    fn apply(&self, time: f64, grid: &mut Grid<D>) {
        self(time, grid)
    }
}

/// Total-Lagrangian solver with FLIP(α) transfer.
pub struct TotalLagrangianSolver<const D: usize> {
    config: TotalLagrangianConfig,
    interpolation: Box<dyn Interpolation<D>>,
    model: Box<dyn ConstitutiveModel<D>>,
    body_force: Option<Box<dyn GridBodyForce<D>>>,
    mpvalues: MpValues<D>,
    gravity: Vector<D>,
    initialized: bool,
    time: f64,
}

impl<const D: usize> TotalLagrangianSolver<D> {
    pub fn new(
        config: TotalLagrangianConfig,
        interpolation: Box<dyn Interpolation<D>>,
        model: Box<dyn ConstitutiveModel<D>>,
    ) -> GroveResult<Self> {
        config.validate()?;
        let gravity = gravity_vector::<D>(&config.gravity)?;
        Ok(Self {
            config,
            interpolation,
            model,
            body_force: None,
            mpvalues: MpValues::new(0),
            gravity,
            initialized: false,
            time: 0.0,
        })
    }

    /// Installs a time-dependent grid body force (builder style).
    pub fn with_body_force(mut self, body_force: impl GridBodyForce<D> + 'static) -> Self {
        self.body_force = Some(Box::new(body_force));
        self
    }

    /// Simulation time seen by the body force.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Reference-configuration weights.
    pub fn mpvalues(&self) -> &MpValues<D> {
        &self.mpvalues
    }
}

impl<const D: usize> SolverStrategy<D> for TotalLagrangianSolver<D> {
    fn step(&mut self, grid: &mut Grid<D>, particles: &mut ParticleSet<D>) -> GroveResult<StepReport> {
        let start = Instant::now();

        if !self.initialized || self.mpvalues.len() != particles.len() {
            self.mpvalues = MpValues::new(particles.len());
            self.mpvalues
                .update_all(self.interpolation.as_ref(), &particles.reference_position, grid)?;
            self.initialized = true;
        }

        // Current density m / (J V⁰) sets the local wave speed.
        let dt = cfl_timestep(
            particles,
            &particles.volume,
            self.model.as_ref(),
            grid.spacing(),
            self.config.courant,
        )?;

        if let Some(body_force) = &self.body_force {
            body_force.apply(self.time, grid);
        }

        // P2G
        grid.clear();
        p2g_mass_momentum(grid, particles, &self.mpvalues)?;
        p2g_internal_force(grid, &self.mpvalues, &particles.initial_volume, &particles.stress)?;

        // Grid update
        grid.update_mass_inverse();
        for i in 0..grid.len() {
            let m = grid.mass[i];
            let inv = grid.mass_inv[i];
            grid.force_ext[i] = (grid.body[i] + self.gravity) * m;
            let v_prev = grid.momentum[i] * inv;
            grid.velocity_prev[i] = v_prev;
            grid.velocity[i] = v_prev + (grid.force[i] + grid.force_ext[i]) * (dt * inv);
        }
        grid.enforce_dirichlet_velocity();

        // G2P: FLIP(α) with the grid acceleration
        let alpha = self.config.alpha;
        let mpvalues = &self.mpvalues;
        let grid_ref: &Grid<D> = grid;
        particles
            .position
            .par_iter_mut()
            .zip(particles.velocity.par_iter_mut())
            .zip(mpvalues.as_slice().par_iter())
            .enumerate()
            .try_for_each(|(p, ((x, v), mp))| {
                ensure_support(p, mp)?;
                let v_grid = gather(&grid_ref.velocity, mp);
                let dv = gather_increment(&grid_ref.velocity, &grid_ref.velocity_prev, mp);
                *v = v_grid * (1.0 - alpha) + (*v + dv) * alpha;
                *x += v_grid * dt;
                Ok::<(), GroveError>(())
            })?;

        // MUSL remap of particle velocity to the grid
        grid.momentum.fill(Vector::<D>::zeros());
        for (p, mp) in self.mpvalues.iter().enumerate() {
            let mv = particles.velocity[p] * particles.mass[p];
            for w in mp {
                grid.momentum[w.node] += mv * w.n;
            }
        }
        for i in 0..grid.len() {
            grid.velocity[i] = grid.momentum[i] * grid.mass_inv[i];
        }
        grid.enforce_dirichlet_velocity();

        // F += Δt Σ v_i ⊗ ∇N₀
        let grid_ref: &Grid<D> = grid;
        particles
            .deformation_gradient
            .par_iter_mut()
            .zip(particles.velocity_gradient.par_iter_mut())
            .zip(mpvalues.as_slice().par_iter())
            .for_each(|((f, l), mp)| {
                let grad = gather_gradient(&grid_ref.velocity, mp);
                *l = grad;
                *f += grad * dt;
            });
        update_first_piola(particles, self.model.as_ref(), self.config.inversion)?;

        self.time += dt;
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
        "total_lagrangian"
    }
}
