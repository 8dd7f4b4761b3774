//! Sparse tangent assembly.
//!
//! Particle-to-(node, node) pass over every weight pair of a particle:
//!
//! ```text
//! A[i,j][a][c] += V⁰ Σ_bl ∇N_i[b] c[a][b][(c,l)] ∇N_j[l]  +  δ_ij δ_ac m_p N_j / (βΔt²)
//! ```
//!
//! restricted to the active rows and columns of the DOF map. Duplicate
//! triplets are summed by the CSR conversion.

use grove_math::sparse::CsrMatrix;

use crate::implicit::state::NewmarkState;

/// Assembles `∂R/∂U` for the assembled residual form.
///
/// Uses the tangents stored by the last residual evaluation.
pub fn assemble_jacobian<const D: usize>(state: &NewmarkState<'_, D>) -> CsrMatrix {
    let n = state.ndofs();
    let c0 = state.mass_coefficient();
    let dofmap = &state.dofmap;
    let particles = state.particles;

    let mut triplets: Vec<(usize, usize, f64)> = Vec::new();

    for (p, mp) in state.mpvalues.iter().enumerate() {
        let c = &state.tangent[p];
        let v0 = particles.initial_volume[p];
        let m = particles.mass[p];

        for wi in mp {
            for wj in mp {
                for a in 0..D {
                    let Some(row) = dofmap.dof(wi.node, a) else {
                        continue;
                    };
                    for cc in 0..D {
                        let Some(col) = dofmap.dof(wj.node, cc) else {
                            continue;
                        };
                        let mut k = 0.0;
                        for b in 0..D {
                            for l in 0..D {
                                k += wi.grad[b] * c[a][b][(cc, l)] * wj.grad[l];
                            }
                        }
                        let mut value = k * v0;
                        if wi.node == wj.node && a == cc {
                            value += c0 * m * wj.n;
                        }
                        triplets.push((row, col, value));
                    }
                }
            }
        }
    }

    CsrMatrix::from_triplets(n, n, &triplets)
}
