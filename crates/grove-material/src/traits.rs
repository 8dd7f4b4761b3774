//! Constitutive model trait: the core material abstraction.
//!
//! Every material model implements this trait, enabling the solvers to
//! swap material strategies without changing their update logic.

use grove_math::tensor::{self, Matrix, Tangent};

/// Perturbation used by the finite-difference tangent.
const TANGENT_STEP: f64 = 1e-6;

/// Trait for hyperelastic constitutive models.
///
/// The primary quantity is the Kirchhoff stress `τ = J σ`; the other
/// measures are derived from it unless a model overrides them.
///
/// # Strategy Pattern
///
/// - `NeoHookean`: compressible Neo-Hookean, used by every scenario
/// - `LinearElastic`: small-strain law, linear in the displacement gradient
pub trait ConstitutiveModel<const D: usize>: Send + Sync {
    /// Returns the name of this constitutive model.
    fn name(&self) -> &str;

    /// Kirchhoff stress `τ(F)`.
    fn kirchhoff_stress(&self, f: &Matrix<D>) -> Matrix<D>;

    /// Cauchy stress `σ = τ / J`.
    fn cauchy_stress(&self, f: &Matrix<D>) -> Matrix<D> {
        self.kirchhoff_stress(f) / tensor::det(f)
    }

    /// First Piola–Kirchhoff stress `P = τ F⁻ᵀ`, or `None` for singular `F`.
    fn first_piola_kirchhoff(&self, f: &Matrix<D>) -> Option<Matrix<D>> {
        tensor::inverse(f).map(|inv| self.kirchhoff_stress(f) * inv.transpose())
    }

    /// Kirchhoff stress at `F' = (I + H) F` and its derivative
    /// `c[i][j][(k, l)] = ∂τ_ij / ∂H_kl`.
    ///
    /// The default uses central differences; models with a closed form
    /// override it.
    fn kirchhoff_tangent(&self, f: &Matrix<D>, grad_u: &Matrix<D>) -> (Tangent<D>, Matrix<D>) {
        let identity = Matrix::<D>::identity();
        let stress_at = |h: &Matrix<D>| self.kirchhoff_stress(&((identity + h) * f));

        let mut c = tensor::zero_tangent::<D>();
        for k in 0..D {
            for l in 0..D {
                let mut plus = *grad_u;
                let mut minus = *grad_u;
                plus[(k, l)] += TANGENT_STEP;
                minus[(k, l)] -= TANGENT_STEP;
                let dtau = (stress_at(&plus) - stress_at(&minus)) / (2.0 * TANGENT_STEP);
                for i in 0..D {
                    for j in 0..D {
                        c[i][j][(k, l)] = dtau[(i, j)];
                    }
                }
            }
        }
        (c, stress_at(grad_u))
    }

    /// Out-of-plane Kirchhoff stress `τ_zz` of a plane-strain state
    /// (`F_zz = 1`). Only meaningful for `D = 2`.
    fn out_of_plane_kirchhoff(&self, _f: &Matrix<D>) -> f64 {
        0.0
    }

    /// P-wave speed `√((λ + 2μ) / ρ)` used for the CFL bound.
    fn wave_speed(&self, density: f64) -> f64;
}
