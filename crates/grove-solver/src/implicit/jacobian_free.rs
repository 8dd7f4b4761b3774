//! Matrix-free Jacobian product for the mass-scaled residual.
//!
//! ```text
//! J δU = δU − βΔt² m⁻¹ δf,   δf_i = −Σ V⁰ (c : ∇δu) ∇N_i,   ∇δu = Σ δu_j ⊗ ∇N_j
//! ```

use nalgebra::DVector;

use grove_math::tensor::{self, Vector};

use crate::implicit::state::NewmarkState;
use crate::transfer::gather_gradient;

/// Writes `J x` into `out`.
///
/// Uses the tangents stored by the last residual evaluation.
pub fn jacobian_product<const D: usize>(state: &mut NewmarkState<'_, D>, x: &DVector<f64>, out: &mut DVector<f64>) {
    state.dofmap.scatter(x, &mut state.increment);
    state.increment_force.fill(Vector::<D>::zeros());

    let particles = state.particles;
    for (p, mp) in state.mpvalues.iter().enumerate() {
        let grad_du = gather_gradient(&state.increment, mp);
        let dtau = tensor::double_contract(&state.tangent[p], &grad_du) * particles.initial_volume[p];
        for w in mp {
            state.increment_force[w.node] -= dtau * w.grad;
        }
    }

    let scale = state.beta * state.dt * state.dt;
    let grid = &*state.grid;
    for i in 0..grid.len() {
        for a in 0..D {
            if let Some(k) = state.dofmap.dof(i, a) {
                out[k] = x[k] - scale * state.increment_force[i][a] * grid.mass_inv[i];
            }
        }
    }
}
