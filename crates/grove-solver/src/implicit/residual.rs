//! Newmark-β residual.
//!
//! For a trial displacement `U` on the active degrees of freedom:
//!
//! ```text
//! a = U/(βΔt²) − vⁿ/(βΔt) − (1/(2β) − 1) aⁿ
//! v = vⁿ + Δt ((1 − γ) aⁿ + γ a)
//! ∇u_p = Σ u_i ⊗ ∇N,   (c_p, τ_p) = tangent of τ((I + ∇u) F_p)
//! f_i = Σ −V⁰ τ ∇N + m (b + g) N
//! R = m a − f              (assembled form)
//! R = βΔt² (a − f/m)       (mass-scaled form)
//! ```

use nalgebra::DVector;
use rayon::prelude::*;

use grove_math::tensor::{self, Matrix, Vector};
use grove_types::GroveResult;

use crate::implicit::state::{NewmarkState, ResidualForm};
use crate::transfer::{ensure_support, gather_gradient};

/// Writes `U` into the grid and updates nodal `a` and `v` from the
/// Newmark relations.
pub fn apply_displacement<const D: usize>(u: &DVector<f64>, state: &mut NewmarkState<'_, D>) {
    let c0 = state.mass_coefficient();
    let c1 = 1.0 / (state.beta * state.dt);
    let c2 = 1.0 / (2.0 * state.beta) - 1.0;
    let (dt, gamma) = (state.dt, state.gamma);

    let grid = &mut *state.grid;
    state.dofmap.scatter(u, &mut grid.displacement);
    for i in 0..grid.len() {
        let a = grid.displacement[i] * c0 - grid.velocity_prev[i] * c1 - grid.acceleration_prev[i] * c2;
        grid.acceleration[i] = a;
        grid.velocity[i] = grid.velocity_prev[i] + (grid.acceleration_prev[i] * (1.0 - gamma) + a * gamma) * dt;
    }
    grid.enforce_dirichlet_velocity();
}

/// G2P of the trial displacement gradient and the stress/tangent update.
pub fn update_trial_stress<const D: usize>(state: &mut NewmarkState<'_, D>) -> GroveResult<()> {
    let grid = &*state.grid;
    let particles = state.particles;
    let model = state.model;
    let inversion = state.inversion;

    state
        .displacement_gradient
        .par_iter_mut()
        .zip(state.kirchhoff.par_iter_mut())
        .zip(state.tangent.par_iter_mut())
        .zip(state.mpvalues.as_slice().par_iter())
        .enumerate()
        .try_for_each(|(p, (((grad_u, tau), c), mp))| {
            ensure_support(p, mp)?;
            *grad_u = gather_gradient(&grid.displacement, mp);
            let f = &particles.deformation_gradient[p];
            let trial = (Matrix::<D>::identity() + *grad_u) * f;
            inversion.check(p, tensor::det(&trial))?;
            let (tangent, stress) = model.kirchhoff_tangent(f, grad_u);
            *c = tangent;
            *tau = stress;
            Ok(())
        })
}

/// P2G of `f_i = Σ −V⁰ τ ∇N + m (b + g) N`.
pub fn scatter_force<const D: usize>(state: &mut NewmarkState<'_, D>) {
    let grid = &mut *state.grid;
    let particles = state.particles;
    grid.force.fill(Vector::<D>::zeros());
    for (p, mp) in state.mpvalues.iter().enumerate() {
        let vt = state.kirchhoff[p] * particles.initial_volume[p];
        let fm = (particles.body_acceleration[p] + state.gravity) * particles.mass[p];
        for w in mp {
            grid.force[w.node] += fm * w.n - vt * w.grad;
        }
    }
}

/// Evaluates `R(U)`, leaving the grid and per-particle trial state at `U`.
pub fn residual<const D: usize>(u: &DVector<f64>, state: &mut NewmarkState<'_, D>) -> GroveResult<DVector<f64>> {
    apply_displacement(u, state);
    update_trial_stress(state)?;
    scatter_force(state);

    let grid = &*state.grid;
    let scale = state.beta * state.dt * state.dt;
    let mut r = DVector::zeros(state.ndofs());
    for i in 0..grid.len() {
        for a in 0..D {
            let Some(k) = state.dofmap.dof(i, a) else {
                continue;
            };
            r[k] = match state.form {
                ResidualForm::Assembled => grid.mass[i] * grid.acceleration[i][a] - grid.force[i][a],
                ResidualForm::MassScaled { .. } => {
                    scale * (grid.acceleration[i][a] - grid.force[i][a] * grid.mass_inv[i])
                }
            };
        }
    }
    Ok(r)
}
