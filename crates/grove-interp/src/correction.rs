//! Boundary kernel correction.
//!
//! Near the edge of the grid a particle's stencil loses nodes and the
//! base kernel no longer reproduces constant and linear fields. The
//! correction rebuilds the weights by linear moving least squares:
//!
//! ```text
//! P_i = [1, (x_i − x_p)/h]      M = Σ w_i P_i P_iᵀ
//! N_i = w_i (M⁻¹ P_i)₀          ∇N_i = w_i (M⁻¹ P_i)₁.. / h
//! ```
//!
//! so that `Σ N_i = 1`, `Σ N_i (x_i − x_p) = 0` and
//! `Σ (x_i − x_p) ⊗ ∇N_i = I` hold exactly.

use nalgebra::{DMatrix, DVector};

use grove_grid::Grid;
use grove_math::Vector;
use grove_types::constants::MOMENT_SINGULARITY_THRESHOLD;
use grove_types::{GroveError, GroveResult, ParticleId};

use crate::interpolation::Interpolation;
use crate::mpvalue::MpValue;

/// Decorator applying linear-MLS correction on truncated stencils.
///
/// Particles whose stencil is complete keep the base weights unchanged.
#[derive(Debug, Clone, Default)]
pub struct KernelCorrection<I> {
    base: I,
    name: String,
}

impl<I> KernelCorrection<I> {
    pub fn new(base: I) -> Self {
        let base_name = std::any::type_name::<I>().rsplit("::").next().unwrap_or("base");
        let name = format!("KernelCorrection({base_name})");
        Self { base, name }
    }

    /// The wrapped interpolation.
    pub fn base(&self) -> &I {
        &self.base
    }
}

impl<I: Interpolation<D>, const D: usize> Interpolation<D> for KernelCorrection<I> {
    fn name(&self) -> &str {
        &self.name
    }

    fn support_radius(&self) -> f64 {
        self.base.support_radius()
    }

    fn affine_inertia_factor(&self) -> Option<f64> {
        self.base.affine_inertia_factor()
    }

    fn evaluate(&self, particle: usize, x: &Vector<D>, grid: &Grid<D>, out: &mut MpValue<D>) -> GroveResult<()> {
        self.base.evaluate(particle, x, grid, out)?;
        if !out.is_truncated() {
            return Ok(());
        }

        let inv_h = 1.0 / grid.spacing();
        let size = D + 1;
        let basis = |node: usize| -> DVector<f64> {
            let mut p = DVector::zeros(size);
            p[0] = 1.0;
            for a in 0..D {
                p[a + 1] = (grid.position[node][a] - x[a]) * inv_h;
            }
            p
        };

        let mut moment = DMatrix::<f64>::zeros(size, size);
        for w in out.iter() {
            let p = basis(w.node);
            moment.ger(w.n, &p, &p, 1.0);
        }

        let degenerate = || GroveError::DegenerateSupport {
            particle: ParticleId::from(particle),
        };
        let lu = moment.lu();
        if lu.determinant().abs() < MOMENT_SINGULARITY_THRESHOLD {
            return Err(degenerate());
        }

        for w in out.weights_mut() {
            let p = basis(w.node);
            let Some(coeffs) = lu.solve(&p) else {
                return Err(degenerate());
            };
            let base = w.n;
            w.n = base * coeffs[0];
            for a in 0..D {
                w.grad[a] = base * coeffs[a + 1] * inv_h;
            }
        }
        Ok(())
    }
}
