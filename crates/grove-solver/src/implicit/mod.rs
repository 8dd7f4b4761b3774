//! Implicit MPM: Newmark-β time integration solved with Newton.
//!
//! Per step:
//! 1. **Weights**: refresh at current positions
//! 2. **P2G**: `m`, `mv`, `ma`; then `vⁿ = mv/m`, `aⁿ = ma/m`, Dirichlet
//! 3. **DOF map**: nodes with mass, minus fixed components
//! 4. **Newton**: on the nodal displacement `U`, starting from zero
//! 5. **Policy**: non-convergence is accepted, aborted, or retried with a
//!    smaller `Δt`
//! 6. **G2P**: `∇u`, `a`, `v += Σ N (v − vⁿ)`, `x = Σ N (X + u)`,
//!    `F ← (I + ∇u) F`, Kirchhoff stress and tangent

pub mod assembly;
pub mod jacobian_free;
pub mod residual;
pub mod state;

use std::time::Instant;

use nalgebra::DVector;
use rayon::prelude::*;

use grove_grid::Grid;
use grove_interp::{Interpolation, MpValues};
use grove_material::ConstitutiveModel;
use grove_math::krylov::gmres;
use grove_math::newton::{newton_solve, NewtonReport};
use grove_math::sparse::SparseSolver;
use grove_math::tensor::{self, Matrix, Vector};
use grove_types::{GroveError, GroveResult};

use crate::config::{gravity_vector, ImplicitConfig, LinearSolverKind, NonConvergencePolicy};
use crate::particles::{ParticleSet, StressMeasure};
use crate::strategy::{SolverStrategy, StepReport};
use crate::transfer::{ensure_support, gather, gather_gradient, gather_increment};

pub use assembly::assemble_jacobian;
pub use jacobian_free::jacobian_product;
pub use residual::residual;
pub use state::{NewmarkState, ResidualForm};

/// Newton correction `δU` solving `J δU = −R` at the current iterate.
pub fn correction<const D: usize>(
    _u: &DVector<f64>,
    r: &DVector<f64>,
    state: &mut NewmarkState<'_, D>,
) -> GroveResult<DVector<f64>> {
    let rhs = -r;
    match state.form.clone() {
        ResidualForm::Assembled => {
            let jacobian = assemble_jacobian(state);
            state.lu.factorize(&jacobian)?;
            let mut du = DVector::zeros(rhs.len());
            state.lu.solve(rhs.as_slice(), du.as_mut_slice())?;
            state.linear_iterations = 1;
            Ok(du)
        }
        ResidualForm::MassScaled { gmres: config } => {
            let mut du = DVector::zeros(rhs.len());
            let report = gmres(|x, y| jacobian_product(state, x, y), &rhs, &mut du, &config);
            tracing::debug!(
                iterations = report.iterations,
                residual = report.residual,
                converged = report.converged,
                "gmres solve"
            );
            if !report.converged {
                tracing::warn!(residual = report.residual, "GMRES did not reach tolerance");
            }
            state.linear_iterations = report.iterations;
            Ok(du)
        }
    }
}

/// Newmark-β / Newton implicit solver.
pub struct ImplicitSolver<const D: usize> {
    config: ImplicitConfig,
    interpolation: Box<dyn Interpolation<D>>,
    model: Box<dyn ConstitutiveModel<D>>,
    mpvalues: MpValues<D>,
    gravity: Vector<D>,
}

/// Outcome of one attempt at a step with a given `Δt`.
struct Attempt {
    report: NewtonReport,
}

impl<const D: usize> ImplicitSolver<D> {
    pub fn new(
        config: ImplicitConfig,
        interpolation: Box<dyn Interpolation<D>>,
        model: Box<dyn ConstitutiveModel<D>>,
    ) -> GroveResult<Self> {
        config.validate()?;
        let gravity = gravity_vector::<D>(&config.gravity)?;
        Ok(Self {
            config,
            interpolation,
            model,
            mpvalues: MpValues::new(0),
            gravity,
        })
    }

    pub fn config(&self) -> &ImplicitConfig {
        &self.config
    }

    fn residual_form(&self) -> ResidualForm {
        match &self.config.linear_solver {
            LinearSolverKind::Assembled => ResidualForm::Assembled,
            LinearSolverKind::JacobianFree { gmres } => ResidualForm::MassScaled {
                gmres: gmres.clone(),
            },
        }
    }

    /// P2G of `m`, `mv`, `ma` and the previous-step nodal kinematics.
    fn project_to_grid(&self, grid: &mut Grid<D>, particles: &ParticleSet<D>) -> GroveResult<()> {
        grid.clear();
        for (p, mp) in self.mpvalues.iter().enumerate() {
            ensure_support(p, mp)?;
            let m = particles.mass[p];
            let mv = particles.velocity[p] * m;
            let ma = particles.acceleration[p] * m;
            for w in mp {
                grid.mass[w.node] += w.n * m;
                grid.momentum[w.node] += mv * w.n;
                grid.mass_accel[w.node] += ma * w.n;
            }
        }
        grid.update_mass_inverse();
        for i in 0..grid.len() {
            grid.velocity_prev[i] = grid.momentum[i] * grid.mass_inv[i];
            grid.acceleration_prev[i] = grid.mass_accel[i] * grid.mass_inv[i];
        }
        grid.enforce_dirichlet_kinematics();
        Ok(())
    }

    /// Runs Newton for one `Δt`. On return the grid holds the final
    /// nodal fields and the trial stresses/tangents are at the last iterate.
    fn attempt(
        &self,
        dt: f64,
        grid: &mut Grid<D>,
        particles: &mut ParticleSet<D>,
    ) -> GroveResult<Attempt> {
        self.project_to_grid(grid, particles)?;

        let mut state = NewmarkState::new(
            grid,
            particles,
            &self.mpvalues,
            self.model.as_ref(),
            dt,
            self.config.beta,
            self.config.gamma,
            self.gravity,
            self.config.inversion,
            self.residual_form(),
        );

        let mut u = state.initial_guess();
        let report = newton_solve(&mut u, &mut state, residual, correction, &self.config.newton)?;

        let (displacement_gradient, kirchhoff, tangent) = state.into_trial();

        if report.converged || self.config.on_nonconvergence == NonConvergencePolicy::AcceptLastIterate {
            self.finish(grid, particles, displacement_gradient, kirchhoff, tangent)?;
        }
        Ok(Attempt { report })
    }

    /// Final G2P once the nodal solution is accepted.
    fn finish(
        &self,
        grid: &Grid<D>,
        particles: &mut ParticleSet<D>,
        displacement_gradient: Vec<Matrix<D>>,
        kirchhoff: Vec<Matrix<D>>,
        tangent: Vec<grove_math::Tangent<D>>,
    ) -> GroveResult<()> {
        let inversion = self.config.inversion;
        let model = self.model.as_ref();
        let ParticleSet {
            position,
            velocity,
            acceleration,
            deformation_gradient,
            displacement_gradient: particle_grad_u,
            initial_volume,
            volume,
            stress,
            stress_measure,
            tangent: particle_tangent,
            out_of_plane_stress,
            ..
        } = particles;

        position
            .par_iter_mut()
            .zip(velocity.par_iter_mut())
            .zip(acceleration.par_iter_mut())
            .zip(deformation_gradient.par_iter_mut())
            .zip(volume.par_iter_mut())
            .zip(out_of_plane_stress.par_iter_mut())
            .zip(initial_volume.par_iter())
            .zip(self.mpvalues.as_slice().par_iter())
            .enumerate()
            .try_for_each(|(p, (((((((x, v), a), f), vol), sigma_zz), v0), mp))| {
                ensure_support(p, mp)?;
                let grad_u = gather_gradient(&grid.displacement, mp);
                *a = gather(&grid.acceleration, mp);
                *v += gather_increment(&grid.velocity, &grid.velocity_prev, mp);
                *x = mp.iter().fold(Vector::<D>::zeros(), |acc, w| {
                    acc + (grid.position[w.node] + grid.displacement[w.node]) * w.n
                });
                *f = (Matrix::<D>::identity() + grad_u) * *f;
                let j = tensor::det(f);
                inversion.check(p, j)?;
                *vol = j * v0;
                *sigma_zz = model.out_of_plane_kirchhoff(f) / j;
                Ok::<(), GroveError>(())
            })?;

        *particle_grad_u = displacement_gradient;
        *stress = kirchhoff;
        *stress_measure = StressMeasure::Kirchhoff;
        *particle_tangent = tangent;
        Ok(())
    }
}

impl<const D: usize> SolverStrategy<D> for ImplicitSolver<D> {
    fn step(&mut self, grid: &mut Grid<D>, particles: &mut ParticleSet<D>) -> GroveResult<StepReport> {
        let start = Instant::now();

        if self.mpvalues.len() != particles.len() {
            self.mpvalues = MpValues::new(particles.len());
        }
        self.mpvalues
            .update_all(self.interpolation.as_ref(), &particles.position, grid)?;

        let mut dt = self.config.dt;
        let mut retries = 0u32;
        loop {
            let Attempt { report } = self.attempt(dt, grid, particles)?;

            if !report.converged {
                match self.config.on_nonconvergence {
                    NonConvergencePolicy::Abort => {
                        return Err(GroveError::NonConvergence {
                            iterations: report.iterations,
                            residual: report.residual,
                        });
                    }
                    NonConvergencePolicy::AcceptLastIterate => {
                        tracing::warn!(
                            iterations = report.iterations,
                            residual = report.residual,
                            "Newton did not converge; accepting last iterate"
                        );
                    }
                    NonConvergencePolicy::ShrinkTimestep { factor, max_retries } => {
                        if retries >= max_retries {
                            return Err(GroveError::NonConvergence {
                                iterations: report.iterations,
                                residual: report.residual,
                            });
                        }
                        retries += 1;
                        dt *= factor;
                        tracing::warn!(dt, retries, "Newton did not converge; shrinking timestep");
                        continue;
                    }
                }
            }

            return Ok(StepReport {
                dt,
                iterations: report.iterations,
                residual: report.residual,
                converged: report.converged,
                retries,
                wall_time: start.elapsed().as_secs_f64(),
                residual_history: report.history,
            });
        }
    }

    fn name(&self) -> &str {
        "implicit"
    }
}
