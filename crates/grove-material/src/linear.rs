//! Small-strain linear elasticity.
//!
//! `τ = λ tr(ε) I + 2 μ ε` with `ε = sym(F − I)`. The stress is affine
//! in the displacement gradient, so an implicit step on this material
//! is a linear problem.

use serde::{Deserialize, Serialize};

use grove_math::tensor::{self, Matrix, Tangent};

use crate::traits::ConstitutiveModel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearElastic {
    pub lambda: f64,
    pub mu: f64,
}

impl LinearElastic {
    pub fn new(lambda: f64, mu: f64) -> Self {
        Self { lambda, mu }
    }
}

impl<const D: usize> ConstitutiveModel<D> for LinearElastic {
    fn name(&self) -> &str {
        "linear_elastic"
    }

    fn kirchhoff_stress(&self, f: &Matrix<D>) -> Matrix<D> {
        let identity = Matrix::<D>::identity();
        let strain = tensor::symmetric(&(f - identity));
        identity * (self.lambda * strain.trace()) + strain * (2.0 * self.mu)
    }

    fn out_of_plane_kirchhoff(&self, f: &Matrix<D>) -> f64 {
        let strain = tensor::symmetric(&(f - Matrix::<D>::identity()));
        self.lambda * strain.trace()
    }

    // c_ijkl = λ δ_ij F_lk + μ (δ_ik F_lj + δ_jk F_li)
    fn kirchhoff_tangent(&self, f: &Matrix<D>, grad_u: &Matrix<D>) -> (Tangent<D>, Matrix<D>) {
        let mut c = tensor::zero_tangent::<D>();
        for i in 0..D {
            for j in 0..D {
                for k in 0..D {
                    for l in 0..D {
                        let mut value = 0.0;
                        if i == j {
                            value += self.lambda * f[(l, k)];
                        }
                        if i == k {
                            value += self.mu * f[(l, j)];
                        }
                        if j == k {
                            value += self.mu * f[(l, i)];
                        }
                        c[i][j][(k, l)] = value;
                    }
                }
            }
        }

        let f_trial = (Matrix::<D>::identity() + grad_u) * f;
        let tau = <Self as ConstitutiveModel<D>>::kirchhoff_stress(self, &f_trial);
        (c, tau)
    }

    fn wave_speed(&self, density: f64) -> f64 {
        ((self.lambda + 2.0 * self.mu) / density).sqrt()
    }
}
