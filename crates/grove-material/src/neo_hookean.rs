//! Compressible Neo-Hookean hyperelasticity.
//!
//! ```text
//! τ = μ (b − I) + λ ln J I,    b = F Fᵀ,  J = det F
//! ```
//!
//! Consistent tangent with respect to `H` at `F' = (I + H) F`, writing
//! `A = I + H` and `G = F F'ᵀ`:
//!
//! ```text
//! c_ijkl = μ (δ_ik G_lj + δ_jk G_li) + λ δ_ij (A⁻¹)_lk
//! ```

use serde::{Deserialize, Serialize};

use grove_math::tensor::{self, Matrix, Tangent};

use crate::traits::ConstitutiveModel;

/// Neo-Hookean model with Lamé parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeoHookean {
    pub lambda: f64,
    pub mu: f64,
}

impl NeoHookean {
    pub fn new(lambda: f64, mu: f64) -> Self {
        Self { lambda, mu }
    }
}

impl<const D: usize> ConstitutiveModel<D> for NeoHookean {
    fn name(&self) -> &str {
        "neo_hookean"
    }

    fn kirchhoff_stress(&self, f: &Matrix<D>) -> Matrix<D> {
        let identity = Matrix::<D>::identity();
        let b = f * f.transpose();
        let j = tensor::det(f);
        (b - identity) * self.mu + identity * (self.lambda * j.ln())
    }

    fn first_piola_kirchhoff(&self, f: &Matrix<D>) -> Option<Matrix<D>> {
        let f_inv_t = tensor::inverse(f)?.transpose();
        let j = tensor::det(f);
        Some((f - f_inv_t) * self.mu + f_inv_t * (self.lambda * j.ln()))
    }

    // b_zz = 1, so only the volumetric term survives.
    fn out_of_plane_kirchhoff(&self, f: &Matrix<D>) -> f64 {
        self.lambda * tensor::det(f).ln()
    }

    fn kirchhoff_tangent(&self, f: &Matrix<D>, grad_u: &Matrix<D>) -> (Tangent<D>, Matrix<D>) {
        let a = Matrix::<D>::identity() + grad_u;
        let f_trial = a * f;
        let g = f * f_trial.transpose();
        let a_inv = tensor::inverse(&a).unwrap_or_else(Matrix::<D>::zeros);

        let mut c = tensor::zero_tangent::<D>();
        for i in 0..D {
            for j in 0..D {
                let block = &mut c[i][j];
                for k in 0..D {
                    for l in 0..D {
                        let mut value = 0.0;
                        if i == k {
                            value += self.mu * g[(l, j)];
                        }
                        if j == k {
                            value += self.mu * g[(l, i)];
                        }
                        if i == j {
                            value += self.lambda * a_inv[(l, k)];
                        }
                        block[(k, l)] = value;
                    }
                }
            }
        }

        let tau = <Self as ConstitutiveModel<D>>::kirchhoff_stress(self, &f_trial);
        (c, tau)
    }

    fn wave_speed(&self, density: f64) -> f64 {
        ((self.lambda + 2.0 * self.mu) / density).sqrt()
    }
}
